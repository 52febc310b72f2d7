//! Credential display formatting
//!
//! Secrets are always masked here; the only way to get a plaintext
//! password out of the program is the clipboard.

use crate::models::Credential;

/// Format search results as a table
pub fn format_credential_list(credentials: &[Credential]) -> String {
    if credentials.is_empty() {
        return "No credentials found.".to_string();
    }

    let name_width = column_width(credentials.iter().map(|c| c.name.chars().count()), "Name");
    let login_width = column_width(credentials.iter().map(|c| c.login.chars().count()), "Login");
    let password_width = column_width(
        credentials.iter().map(|c| c.masked_password().chars().count()),
        "Password",
    );

    let mut output = format!("Found {} credential(s)\n", credentials.len());
    output.push_str(&format!(
        "{:<name_width$}  {:<login_width$}  {:<password_width$}  {}\n",
        "Name",
        "Login",
        "Password",
        "URL",
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<login_width$}  {:-<password_width$}  {:-<3}\n",
        "", "", "", "",
    ));

    for credential in credentials {
        output.push_str(&format!(
            "{:<name_width$}  {:<login_width$}  {:<password_width$}  {}\n",
            credential.name,
            credential.login,
            credential.masked_password(),
            credential.url,
        ));
    }

    output
}

/// Numbered `name (login)` lines for picking one credential
pub fn format_choices(credentials: &[Credential]) -> String {
    credentials
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}\n", i + 1, c))
        .collect()
}

fn column_width(lengths: impl Iterator<Item = usize>, header: &str) -> usize {
    lengths.max().unwrap_or(0).max(header.len())
}
