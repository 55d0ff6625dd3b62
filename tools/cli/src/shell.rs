//! Interactive vault console.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::Level;

use crate::log_ring::LogRing;
use nightops_common::Collection;
use nightops_offline::{CacheStorage, DirFetcher, OfflineWorker};
use nightops_vault::{KeyNamespace, VaultService};

const HELP: &str = "\
Commands:
  unlock [passphrase]        derive the key (prompts when omitted)
  lock                       drop the key
  status                     show the session namespace and unlock time
  decoy                      toggle decoy namespace for the next unlock
  add <notes|tasks> <text>   encrypt and save
  list <notes|tasks>         list newest first
  search <notes|tasks> <q>   list entries containing q
  count <notes|tasks>        number of records
  export <notes|tasks>       encrypted records as JSON lines
  assets <dir>               pre-cache the app shell from a directory
  wipe                       delete everything (confirm with 'wipe yes')
  log [n]                    show the last n log lines (default 50)
  level <debug|info|warn|error>
  help
  quit";

/// Result of one console line.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

/// One interactive session over a single vault.
pub struct Shell {
    vault: VaultService,
    ring: LogRing,
    offline: OfflineWorker,
    wipe_armed: bool,
}

fn parse_level(name: &str) -> Result<Level> {
    match name.to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => bail!("Unknown level '{}'", other),
    }
}

fn collection_arg(arg: Option<&str>) -> Result<Collection> {
    let name = arg.context("Expected a collection (notes or tasks)")?;
    Ok(name.parse()?)
}

impl Shell {
    pub fn new(vault: VaultService, ring: LogRing, origin: &str) -> Result<Self> {
        let offline = OfflineWorker::new(origin, Arc::new(CacheStorage::new()))?;
        Ok(Self {
            vault,
            ring,
            offline,
            wipe_armed: false,
        })
    }

    pub fn vault(&self) -> &VaultService {
        &self.vault
    }

    /// Execute one console line.
    ///
    /// Errors are user-facing: the caller prints them and keeps going.
    pub async fn execute(&mut self, line: &str) -> Result<Step> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        // Any other command disarms a pending wipe.
        let armed = std::mem::take(&mut self.wipe_armed);

        let output = match command {
            "" => String::new(),
            "help" | "?" => HELP.to_string(),
            "quit" | "exit" => {
                self.vault.close().await;
                return Ok(Step::Quit);
            }
            "unlock" => {
                let passphrase = if rest.is_empty() {
                    crate::read_passphrase()?
                } else {
                    zeroize::Zeroizing::new(rest.to_string())
                };
                let handle = self.vault.unlock(&passphrase).await?;
                format!(
                    "Vault unlocked ({} namespace, session {})",
                    self.vault.namespace().await,
                    handle
                )
            }
            "lock" => {
                self.vault.lock().await;
                "Vault locked".to_string()
            }
            "status" => match self.vault.session_info().await {
                Some(info) => format!(
                    "Unlocked ({} namespace) since {}, session {}",
                    info.namespace,
                    crate::format_timestamp(info.unlocked_at.timestamp_millis()),
                    info.handle
                ),
                None => format!(
                    "Locked; next unlock uses the {} namespace",
                    self.vault.namespace().await
                ),
            },
            "decoy" => {
                let next = self.vault.namespace().await.toggled();
                self.vault.set_namespace(next).await;
                format!(
                    "Decoy mode {}; unlock again to switch keys",
                    if next.is_decoy() { "ON" } else { "OFF" }
                )
            }
            "add" => {
                let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let collection = collection_arg(Some(name).filter(|n| !n.is_empty()))?;
                match self.vault.save(collection, text).await? {
                    Some(record) => format!("Saved {} {}", collection, record.id),
                    None => "Nothing to save".to_string(),
                }
            }
            "list" => {
                let collection = collection_arg(rest.split_whitespace().next())?;
                self.render(collection, None).await?
            }
            "search" => {
                let (name, query) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let collection = collection_arg(Some(name).filter(|n| !n.is_empty()))?;
                self.render(collection, Some(query)).await?
            }
            "count" => {
                let collection = collection_arg(rest.split_whitespace().next())?;
                format!("{}: {}", collection, self.vault.count(collection).await?)
            }
            "export" => {
                let collection = collection_arg(rest.split_whitespace().next())?;
                crate::export_lines(&self.vault, collection).await?
            }
            "assets" => {
                if rest.is_empty() {
                    bail!("Expected an asset directory");
                }
                let fetcher = DirFetcher::new(Path::new(rest));
                let cached = self.offline.install(&fetcher).await?;
                let purged = self.offline.activate().await;
                format!(
                    "Cached {} assets in {} (purged {} stale caches)",
                    cached,
                    self.offline.cache_name(),
                    purged.len()
                )
            }
            "wipe" => {
                match (armed, rest) {
                    (true, "yes") => {
                        self.vault.wipe().await?;
                        let purged = self.offline.purge_all().await;
                        format!("Wiped. ({} offline caches purged)", purged)
                    }
                    (_, "") => {
                        self.wipe_armed = true;
                        "Permanently wipe all data? Type 'wipe yes' to confirm.".to_string()
                    }
                    _ => "Wipe not armed. Type 'wipe' first.".to_string(),
                }
            }
            "log" => {
                let n = match rest {
                    "" => 50,
                    n => n.parse().context("Expected a line count")?,
                };
                self.ring.tail(n).join("\n")
            }
            "level" => {
                let level = parse_level(rest)?;
                self.ring.set_level(level);
                format!("Log level {}", level.as_str().to_lowercase())
            }
            other => bail!("Unknown command '{}'. Type 'help'.", other),
        };

        Ok(Step::Continue(output))
    }

    async fn render(&self, collection: Collection, filter: Option<&str>) -> Result<String> {
        let entries = self.vault.list(collection, filter).await?;
        if entries.is_empty() {
            return Ok(format!("No {}.", collection));
        }
        Ok(entries
            .iter()
            .map(|entry| {
                format!(
                    "  {}  {}",
                    crate::format_timestamp(entry.record.updated_at_ms),
                    entry.display_text()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Read lines from stdin until `quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        println!("NightOps console. Type 'help' for commands.");
        loop {
            let prompt = if self.vault.is_unlocked().await {
                match self.vault.namespace().await {
                    KeyNamespace::Primary => "nightops> ",
                    KeyNamespace::Decoy => "nightops(decoy)> ",
                }
            } else {
                "nightops[locked]> "
            };
            stdout.write_all(prompt.as_bytes()).await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                self.vault.close().await;
                break;
            };

            match self.execute(&line).await {
                Ok(Step::Continue(output)) if output.is_empty() => {}
                Ok(Step::Continue(output)) => println!("{}", output),
                Ok(Step::Quit) => break,
                Err(e) => println!("Error: {:#}", e),
            }
        }
        Ok(())
    }
}
