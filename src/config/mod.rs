//! Persisted key-value configuration and the settings derived from it.
//!
//! The per-install device id lives here: created once on first launch,
//! stored in SQLite, and injected into the review client from then on.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Mutex;
use std::time::Duration;

use crate::consts::{DEFAULT_BASE_URL, DEFAULT_DELIVERY_DELAY, DEFAULT_PLATFORM};

/// Key under which the per-install identifier is stored.
pub const DEVICE_ID_KEY: &str = "device-id";

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("config database lock poisoned"))
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// The stored device id, generating and persisting one if absent.
    pub fn device_id(&self) -> Result<String> {
        if let Some(id) = self.get(DEVICE_ID_KEY)?.filter(|id| !id.is_empty()) {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string().to_uppercase();
        self.set(DEVICE_ID_KEY, &id)
            .context("failed to persist device id")?;
        tracing::info!(device_id = %id, "generated new device id");
        Ok(id)
    }
}

/// Everything the review client and bridge need to know about this install.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub device_id: String,
    pub app_version: String,
    pub platform: String,
    /// Applied to every HTTP request when set.
    pub request_timeout: Option<Duration>,
    /// Pause before each scripting call into the content surface.
    pub delivery_delay: Duration,
}

impl ClientSettings {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            device_id: device_id.into(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            request_timeout: None,
            delivery_delay: DEFAULT_DELIVERY_DELAY,
        }
    }

    /// Join `path` onto the base URL without doubling slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
