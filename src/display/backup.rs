//! Backup and audit listings

use crate::audit::AuditEntry;
use crate::backup::BackupInfo;

/// Format the backup directory contents, newest first
pub fn format_backup_list(backups: &[BackupInfo]) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = backups
        .iter()
        .map(|b| b.filename.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = format!(
        "{:<name_width$}  {:<23}  {:>10}\n",
        "Filename", "Created", "Size",
    );
    output.push_str(&format!("{:-<name_width$}  {:-<23}  {:->10}\n", "", "", ""));

    for backup in backups {
        output.push_str(&format!(
            "{:<name_width$}  {:<23}  {:>10}\n",
            backup.filename,
            backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_size(backup.size_bytes),
        ));
    }

    output
}

/// One audit entry per line
pub fn format_audit_entries(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "Audit log is empty.".to_string();
    }

    entries
        .iter()
        .map(|e| format!("{}\n", e.format_human_readable()))
        .collect()
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}
