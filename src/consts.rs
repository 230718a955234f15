//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Review service root. All API paths hang off this.
pub const DEFAULT_BASE_URL: &str = "https://api.misik.me";

/// Platform tag sent with every request.
pub const DEFAULT_PLATFORM: &str = "ios";

/// Pause before calling into the content surface, so its script
/// namespace has finished initialising.
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_millis(500);

/// Default database path: `~/.misik/misik.db`.
/// Holds the persisted configuration, including the device id.
pub fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".misik").join("misik.db"))
}
