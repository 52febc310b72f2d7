//! Storage selection at session start

use url::Url;

use super::prompt::Console;
use crate::config::settings::StorageSettings;
use crate::config::{Settings, StorageKind, VaultPaths};
use crate::error::VaultResult;
use crate::storage::{Backend, FileBackend, HttpBackend};

/// Ask where the vault lives, defaulting to the configured storage
///
/// Unknown answers fall back to the local file.
pub fn choose_backend(
    console: &mut Console,
    paths: &VaultPaths,
    settings: &Settings,
) -> VaultResult<Box<dyn Backend>> {
    let default = settings.storage.kind;

    console.say("Choose storage:")?;
    console.say(format!("1. Local file ({})", paths.vault_file().display()))?;
    console.say("2. Remote HTTP store")?;

    let default_label = match default {
        StorageKind::Local => "1",
        StorageKind::Remote => "2",
    };
    let answer = console.ask(&format!("Storage [{}]: ", default_label))?;

    let kind = match answer.as_str() {
        "" => default,
        "1" => StorageKind::Local,
        "2" => StorageKind::Remote,
        _ => {
            console.say("Invalid choice, using local storage.")?;
            StorageKind::Local
        }
    };

    match kind {
        StorageKind::Local => Ok(Box::new(FileBackend::new(paths.vault_file()))),
        StorageKind::Remote => Ok(Box::new(remote_backend(console, &settings.storage)?)),
    }
}

fn remote_backend(console: &mut Console, storage: &StorageSettings) -> VaultResult<HttpBackend> {
    let url = match &storage.remote_url {
        Some(url) => {
            console.say(format!("Remote store: {}", url))?;
            url.clone()
        }
        None => console.ask_until(
            "Remote URL (e.g. https://example.com/vault.enc): ",
            |answer| match Url::parse(answer) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(answer.to_string()),
                Ok(_) => Err("Use an http or https URL.".to_string()),
                Err(e) => Err(format!("Invalid URL: {}", e)),
            },
        )?,
    };

    let username = match &storage.remote_username {
        Some(username) => username.clone(),
        None => console.ask("Remote username: ")?,
    };
    let password = console.ask_secret("Remote password: ")?;

    HttpBackend::new(&url, username, password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::prompt::testing::scripted;
    use tempfile::TempDir;

    fn setup() -> (VaultPaths, Settings, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        (paths, Settings::default(), temp_dir)
    }

    #[test]
    fn test_default_is_local_file() {
        let (paths, settings, _temp) = setup();
        let (mut console, _) = scripted("\n");
        let backend = choose_backend(&mut console, &paths, &settings).unwrap();
        assert!(backend.describe().contains("data.enc"));
    }

    #[test]
    fn test_invalid_choice_falls_back_to_local() {
        let (paths, settings, _temp) = setup();
        let (mut console, out) = scripted("7\n");
        let backend = choose_backend(&mut console, &paths, &settings).unwrap();
        assert!(backend.describe().contains("data.enc"));
        assert!(out.text().contains("Invalid choice, using local storage."));
    }

    #[test]
    fn test_remote_prompts_for_missing_details() {
        let (paths, settings, _temp) = setup();
        let (mut console, out) =
            scripted("2\nftp://nope\nhttps://dav.example.com/vault.enc\nalice\nsecret\n");
        let backend = choose_backend(&mut console, &paths, &settings).unwrap();
        assert!(backend.describe().contains("https://dav.example.com/vault.enc"));
        assert!(out.text().contains("Use an http or https URL."));
    }

    #[test]
    fn test_remote_uses_configured_url() {
        let (paths, mut settings, _temp) = setup();
        settings.storage.kind = StorageKind::Remote;
        settings.storage.remote_url = Some("https://dav.example.com/v.enc".to_string());
        settings.storage.remote_username = Some("bob".to_string());

        let (mut console, _) = scripted("\npw\n");
        let backend = choose_backend(&mut console, &paths, &settings).unwrap();
        assert!(backend.describe().contains("dav.example.com"));
    }
}
