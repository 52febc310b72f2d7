//! Display formatting for terminal output

pub mod backup;
pub mod credential;

pub use backup::{format_audit_entries, format_backup_list};
pub use credential::{format_choices, format_credential_list};
