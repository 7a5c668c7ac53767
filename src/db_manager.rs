use std::path::PathBuf;

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::{PlaylistError, Result};

const META_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// Where database files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// `<dir>/<name>.sqlite`
    Directory(PathBuf),
    /// Private in-memory database, mostly for tests.
    InMemory,
}

/// Handle over one named SQLite database carrying a string schema version.
pub struct DbManager {
    conn: Connection,
    name: String,
}

impl DbManager {
    /// Opens (creating if needed) the database `name`.
    ///
    /// A fresh database records `version` as its version. An existing database
    /// opened with a non-empty `version` must already be at that version; an
    /// empty `version` accepts whatever is stored.
    pub fn open(
        location: &StoreLocation,
        name: &str,
        version: &str,
        description: &str,
        size_hint: u64,
    ) -> Result<Self> {
        let conn = match location {
            StoreLocation::Directory(dir) => {
                if !dir.exists() {
                    std::fs::create_dir_all(dir)?;
                }
                let db_path = dir.join(format!("{}.sqlite", name));
                debug!("Opening database {} at {}", name, db_path.display());
                Connection::open(db_path)?
            }
            StoreLocation::InMemory => Connection::open_in_memory()?,
        };
        Self::from_connection(conn, name, version, description, size_hint)
    }

    /// Whether the database `name` has been created at `location` before.
    pub fn exists(location: &StoreLocation, name: &str) -> bool {
        match location {
            StoreLocation::Directory(dir) => dir.join(format!("{}.sqlite", name)).is_file(),
            StoreLocation::InMemory => false,
        }
    }

    pub fn open_in_memory(name: &str, version: &str) -> Result<Self> {
        Self::open(&StoreLocation::InMemory, name, version, "", 0)
    }

    fn from_connection(
        conn: Connection,
        name: &str,
        version: &str,
        description: &str,
        size_hint: u64,
    ) -> Result<Self> {
        conn.execute(META_SCHEMA, [])?;

        let stored = read_meta(&conn, "version")?;
        match stored {
            None => {
                info!("Initializing database {} at version {:?}", name, version);
                write_meta(&conn, "version", version)?;
            }
            Some(found) if !version.is_empty() && found != version => {
                return Err(PlaylistError::VersionMismatch {
                    expected: version.to_string(),
                    found,
                });
            }
            Some(_) => {}
        }
        write_meta(&conn, "description", description)?;
        write_meta(&conn, "size_hint", &size_hint.to_string())?;

        Ok(Self {
            conn,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currently stored schema version.
    pub fn version(&self) -> Result<String> {
        Ok(read_meta(&self.conn, "version")?.unwrap_or_default())
    }

    /// Runs `body` inside one transaction, committing on `Ok` and rolling back on `Err`.
    pub fn transaction<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = body(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Runs `body` and moves the stored version from `from` to `to`, atomically.
    ///
    /// Nothing runs when the stored version is not `from`.
    pub fn change_version<F>(&mut self, from: &str, to: &str, body: F) -> Result<()>
    where
        F: FnOnce(&Transaction<'_>) -> Result<()>,
    {
        let name = self.name.clone();
        self.transaction(|tx| {
            let found = read_meta(tx, "version")?.unwrap_or_default();
            if found != from {
                return Err(PlaylistError::VersionMismatch {
                    expected: from.to_string(),
                    found,
                });
            }
            body(tx)?;
            write_meta(tx, "version", to)?;
            info!("Database {} changed version {:?} -> {:?}", name, from, to);
            Ok(())
        })
    }

    /// Escape hatch for statements outside any explicit transaction.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn read_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM store_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}
