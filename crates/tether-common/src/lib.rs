//! Centralized directory structure management for Tether
//!
//! Directory layout:
//! ```text
//! tether_data/
//! └── <identity>/
//!     ├── <identity>.log       # Peer process log
//!     ├── rooms/<room>/        # Room ledger + history
//!     │   ├── ledger
//!     │   └── history.log
//!     └── personal/<peer>/     # Personal chat ledger + history
//!         ├── ledger
//!         └── history.log
//! ```

use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable overriding the data root
pub const ROOT_ENV: &str = "TETHER_ROOT";

/// Ledger file name inside a conversation directory
pub const LEDGER_FILE: &str = "ledger";

/// History file name inside a conversation directory
pub const HISTORY_FILE: &str = "history.log";

/// Get the data root from the environment or the default
pub fn tether_root() -> PathBuf {
    if let Ok(val) = std::env::var(ROOT_ENV) {
        return PathBuf::from(val);
    }
    PathBuf::from("tether_data")
}

/// Replace path separators so a token can never escape its directory
pub fn sanitize(component: &str) -> String {
    let safe = component.replace(['/', '\\'], "_");
    match safe.as_str() {
        "" => "_".to_string(),
        "." | ".." => safe.replace('.', "_"),
        _ => safe,
    }
}

/// Per-identity directory
pub fn identity_dir(root: &Path, identity: &str) -> PathBuf {
    root.join(sanitize(identity))
}

/// Process log file for a peer
pub fn peer_log_file(root: &Path, identity: &str) -> PathBuf {
    identity_dir(root, identity).join(format!("{}.log", sanitize(identity)))
}

/// Directory holding one room's ledger and history
pub fn room_dir(root: &Path, identity: &str, room: &str) -> PathBuf {
    identity_dir(root, identity).join("rooms").join(sanitize(room))
}

/// Directory holding one personal conversation's ledger and history
pub fn personal_dir(root: &Path, identity: &str, peer: &str) -> PathBuf {
    identity_dir(root, identity)
        .join("personal")
        .join(sanitize(peer))
}

/// Ensure a single directory exists
pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}

/// Initialize the directory structure for one identity.
/// Call this once at peer startup before any other operations
pub fn init_structure(root: &Path, identity: &str) -> anyhow::Result<PathBuf> {
    ensure_dir(root)?;

    let dir = identity_dir(root, identity);
    ensure_dir(&dir)?;
    ensure_dir(&dir.join("rooms"))?;
    ensure_dir(&dir.join("personal"))?;

    let canonical = std::fs::canonicalize(&dir).unwrap_or(dir);
    info!("Tether directory structure initialized at: {:?}", canonical);

    Ok(canonical)
}
