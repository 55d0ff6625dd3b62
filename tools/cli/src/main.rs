//! NightOps CLI - command line front end for the encrypted notes vault.
//!
//! Every command opens the vault in the data directory, does one thing and
//! exits; `shell` keeps a single vault open for an interactive session.

mod log_ring;
mod shell;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell as CompletionShell};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{prelude::*, EnvFilter};
use zeroize::Zeroizing;

use log_ring::{LogRing, DEFAULT_CAPACITY};
use nightops_common::Collection;
use nightops_offline::{CacheStorage, DirFetcher, OfflineWorker};
use nightops_storage::{RecordStore, SettingsStore, SALT_KEY};
use nightops_vault::{KeyNamespace, VaultConfig, VaultService};

/// Environment variable consulted before prompting for the passphrase.
const PASSPHRASE_ENV: &str = "NIGHTOPS_PASSPHRASE";

/// Configuration file kept next to the vault data.
const CONFIG_FILENAME: &str = "config.json";

/// Origin used for the offline asset cache.
const DEFAULT_ORIGIN: &str = "https://nightops.local/";

#[derive(Parser)]
#[command(name = "nightops")]
#[command(about = "NightOps - Encrypted local notes and tasks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault data directory.
    #[arg(long, global = true, env = "NIGHTOPS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Derive keys in the decoy namespace.
    #[arg(long, global = true)]
    decoy: bool,

    /// Use an ephemeral in-memory vault.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt and save a note or task.
    Add {
        /// Collection: notes or tasks.
        collection: Collection,

        /// Text to save.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List a collection, newest first.
    List {
        /// Collection: notes or tasks.
        collection: Collection,

        /// Only show entries containing this text.
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Count records without unlocking.
    Count {
        /// Collection: notes or tasks.
        collection: Collection,
    },

    /// Print a collection's encrypted records as JSON lines.
    Export {
        /// Collection: notes or tasks.
        collection: Collection,
    },

    /// Permanently delete all records and the salt.
    Wipe {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show vault information.
    Info,

    /// Start an interactive session.
    Shell,

    /// Pre-cache the application shell from a directory.
    Assets {
        /// Directory holding the app shell files.
        root: PathBuf,

        /// Origin the assets are served from.
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: CompletionShell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let ring = LogRing::new(DEFAULT_CAPACITY, level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .compact()
                .with_filter(filter),
        )
        .with(ring.clone())
        .try_init()
        .context("Failed to initialize logging")?;

    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "nightops", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let vault = VaultService::from_config(config).context("Failed to build vault")?;
    vault.init().await.context("Failed to open vault storage")?;
    if cli.decoy {
        vault.set_namespace(KeyNamespace::Decoy).await;
    }

    match cli.command {
        Commands::Add { collection, text } => cmd_add(&vault, collection, &text.join(" ")).await,
        Commands::List { collection, filter } => {
            cmd_list(&vault, collection, filter.as_deref()).await
        }
        Commands::Count { collection } => cmd_count(&vault, collection).await,
        Commands::Export { collection } => cmd_export(&vault, collection).await,
        Commands::Wipe { yes } => cmd_wipe(&vault, yes).await,
        Commands::Info => cmd_info(&vault, cli.data_dir.as_deref(), cli.memory).await,
        Commands::Shell => shell::Shell::new(vault, ring, DEFAULT_ORIGIN)?.run().await,
        Commands::Assets { root, origin } => cmd_assets(&root, &origin).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Default data directory: `<local data dir>/nightops`.
fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("Could not determine local data directory")?;
    Ok(base.join("nightops"))
}

/// Resolve the vault configuration.
///
/// A data directory gets a `config.json` on first use; later runs read it
/// back so tuning (e.g. KDF iterations) sticks.
fn load_config(cli: &Cli) -> Result<VaultConfig> {
    if cli.memory {
        return Ok(VaultConfig::in_memory());
    }

    let dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

    let path = dir.join(CONFIG_FILENAME);
    let config = if path.exists() {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        VaultConfig::from_json(&json).context("Invalid configuration file")?
    } else {
        let config = VaultConfig::for_data_dir(&dir);
        std::fs::write(&path, config.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote default configuration");
        config
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Read the passphrase from the environment or prompt for it.
pub(crate) fn read_passphrase() -> Result<Zeroizing<String>> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(Zeroizing::new(passphrase));
    }
    let passphrase =
        rpassword::prompt_password("Passphrase: ").context("Failed to read passphrase")?;
    Ok(Zeroizing::new(passphrase))
}

/// Render a record timestamp in local time.
pub(crate) fn format_timestamp(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => ms.to_string(),
    }
}

async fn unlock(vault: &VaultService) -> Result<()> {
    let passphrase = read_passphrase()?;
    vault.unlock(&passphrase).await.context("Unlock failed")?;
    Ok(())
}

/// Encrypt and save one record.
async fn cmd_add(vault: &VaultService, collection: Collection, text: &str) -> Result<()> {
    unlock(vault).await?;

    match vault
        .save(collection, text)
        .await
        .context("Failed to save record")?
    {
        Some(record) => println!("Saved {}: {}", collection, record.id),
        None => println!("Nothing to save."),
    }

    vault.close().await;
    Ok(())
}

/// List a collection.
async fn cmd_list(vault: &VaultService, collection: Collection, filter: Option<&str>) -> Result<()> {
    unlock(vault).await?;

    let entries = vault
        .list(collection, filter)
        .await
        .context("Failed to list records")?;

    if entries.is_empty() {
        println!("No {}.", collection);
    } else {
        for entry in &entries {
            println!(
                "  {}  {}",
                format_timestamp(entry.record.updated_at_ms),
                entry.display_text()
            );
        }
    }

    vault.close().await;
    Ok(())
}

async fn cmd_count(vault: &VaultService, collection: Collection) -> Result<()> {
    let count = vault
        .count(collection)
        .await
        .context("Failed to count records")?;
    println!("{}: {}", collection, count);
    Ok(())
}

/// Render a collection as one JSON object per record.
pub(crate) async fn export_lines(vault: &VaultService, collection: Collection) -> Result<String> {
    let records = vault
        .export(collection)
        .await
        .context("Failed to export records")?;
    let lines = records
        .iter()
        .map(|record| record.to_json())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

async fn cmd_export(vault: &VaultService, collection: Collection) -> Result<()> {
    let lines = export_lines(vault, collection).await?;
    if !lines.is_empty() {
        println!("{}", lines);
    }
    Ok(())
}

/// Wipe everything after confirmation.
async fn cmd_wipe(vault: &VaultService, yes: bool) -> Result<()> {
    if !yes {
        print!("Permanently wipe all data? Type 'yes' to confirm: ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if answer.trim() != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    vault.wipe().await.context("Wipe failed")?;
    println!("Wiped.");
    Ok(())
}

/// Show vault information.
async fn cmd_info(vault: &VaultService, data_dir: Option<&Path>, memory: bool) -> Result<()> {
    let config = vault.config();
    let store = vault.store();
    let has_salt = config
        .build_settings()
        .get(SALT_KEY)
        .await
        .context("Failed to read settings")?
        .is_some();

    println!("Vault Information:");
    if memory {
        println!("  Location: (in memory)");
    } else {
        let dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir()?,
        };
        println!("  Location: {}", dir.display());
    }
    println!("  Store: {}", store.name());
    println!("  Schema version: {}", store.schema_version().await?);
    println!("  KDF: PBKDF2-HMAC-SHA256, {} iterations", config.kdf_params.iterations);
    println!("  Salt: {}", if has_salt { "present" } else { "not yet created" });
    println!("  Namespace: {}", vault.namespace().await);
    for collection in Collection::RECORDS {
        println!("  {}: {}", collection, vault.count(collection).await?);
    }

    Ok(())
}

/// Install and activate the offline cache from a local directory.
async fn cmd_assets(root: &Path, origin: &str) -> Result<()> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let worker = OfflineWorker::new(origin, Arc::new(CacheStorage::new()))?;
    let fetcher = DirFetcher::new(root);
    let count = worker
        .install(&fetcher)
        .await
        .context("Failed to pre-cache assets")?;
    worker.activate().await;

    println!("Cached {} assets in {}:", count, worker.cache_name());
    for url in worker.storage().entries(worker.cache_name()).await {
        println!("  {}", url);
    }
    Ok(())
}
