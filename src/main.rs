use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vaultkeeper::audit::AuditLogger;
use vaultkeeper::backup::BackupManager;
use vaultkeeper::config::{paths::VaultPaths, settings::Settings};
use vaultkeeper::crypto::KeyDerivationParams;
use vaultkeeper::display::{format_audit_entries, format_backup_list};

#[derive(Parser)]
#[command(
    name = "vaultkeeper",
    author = "Kaylee Beyene",
    version,
    about = "Terminal password vault",
    long_about = "vaultkeeper keeps logins and passwords in a vault encrypted under a \
                  master passphrase, stored in a local file or on a remote HTTP server. \
                  Run without a subcommand to open the interactive menu."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default settings and create the data directory
    Init,

    /// Show current configuration and paths
    Config,

    /// List encrypted backups, newest first
    Backups,

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

fn init_tracing() {
    // Logs go to stderr so they never interleave with the menu
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("VAULTKEEPER_LOG").unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let paths = VaultPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        None => {
            ctrlc::set_handler(|| {
                println!("\nUse menu item 4 to exit so the vault is saved.");
            })
            .context("Failed to install signal handler")?;

            vaultkeeper::cli::run_interactive(&paths, &settings)?;
        }
        Some(Commands::Init) => {
            println!("Initializing vaultkeeper at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Settings written to {}", paths.settings_file().display());
            println!();
            println!("Run 'vaultkeeper' to create your master passphrase.");
        }
        Some(Commands::Config) => {
            println!("vaultkeeper Configuration");
            println!("=========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Vault file:       {}", paths.vault_file().display());
            println!("Token file:       {}", paths.token_file().display());
            println!("Lockout file:     {}", paths.lockout_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!();
            println!("Settings:");
            println!("  Storage:            {:?}", settings.storage.kind);
            if let Some(url) = &settings.storage.remote_url {
                println!("  Remote URL:         {}", url);
            }
            let kdf = KeyDerivationParams::runtime();
            println!(
                "  Key derivation:     Argon2id m={} KiB, t={}, p={} (fixed)",
                kdf.memory_cost, kdf.time_cost, kdf.parallelism
            );
            println!("  Password length:    {}", settings.password_length);
            println!("  Clipboard clear:    {}s", settings.clipboard_clear_secs);
            println!("  Backups kept:       {}", settings.backup_retention.keep_count);
        }
        Some(Commands::Backups) => {
            let manager =
                BackupManager::new(paths.backup_dir(), settings.backup_retention.clone());
            print!("{}", format_backup_list(&manager.list_backups()?));
            println!();
        }
        Some(Commands::Audit { count }) => {
            let logger = AuditLogger::new(paths.audit_log());
            print!("{}", format_audit_entries(&logger.read_recent(count)?));
            println!();
        }
    }

    Ok(())
}
