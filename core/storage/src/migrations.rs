//! Schema versions and the migration chain.
//!
//! A store opened at an older version runs every pending step, in order,
//! before first use. Version 0 means "nothing provisioned yet".

use nightops_common::{Error, Result};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// One step of the migration chain.
#[derive(Debug)]
pub struct Migration {
    /// Version the store is at after this step.
    pub version: u32,
    /// Short human-readable summary, for logs.
    pub description: &'static str,
    /// SQL applied by SQL-backed stores.
    pub sql: &'static str,
}

/// All known migrations, ordered by version.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "provision notes, tasks and meta collections",
    sql: r#"
        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            iv BLOB NOT NULL,
            ciphertext BLOB NOT NULL,
            updated_at_ms INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS notes_by_updated ON notes(updated_at_ms);

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            iv BLOB NOT NULL,
            ciphertext BLOB NOT NULL,
            updated_at_ms INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS tasks_by_updated ON tasks(updated_at_ms);

        CREATE TABLE IF NOT EXISTS meta (
            k TEXT PRIMARY KEY,
            v TEXT NOT NULL
        );
    "#,
}];

/// Migrations needed to bring a store from `current` to [`SCHEMA_VERSION`].
///
/// # Errors
/// - `StorageUnavailable` if `current` is newer than this build understands
pub fn pending(current: u32) -> Result<Vec<&'static Migration>> {
    if current > SCHEMA_VERSION {
        return Err(Error::StorageUnavailable(format!(
            "Store schema v{} is newer than supported v{}",
            current, SCHEMA_VERSION
        )));
    }
    Ok(MIGRATIONS.iter().filter(|m| m.version > current).collect())
}
