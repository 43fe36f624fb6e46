//! Version ledger and message log
//!
//! One ledger value and one history file per (local peer, conversation).
//! Each conversation has its own lock; an append writes the log line and the
//! incremented ledger under that lock, so readers always see both or neither.

use chrono::Local;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tether_common::{HISTORY_FILE, LEDGER_FILE};
use tether_rpc::{ConversationId, Snapshot};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{PeerError, Result};

pub struct Ledger {
    identity: String,
    root: PathBuf,
    conversations: RwLock<HashMap<ConversationId, Arc<Mutex<ConversationState>>>>,
}

struct ConversationState {
    dir: PathBuf,
    /// `None` until the conversation is entered or first written to
    version: Option<u64>,
}

impl ConversationState {
    fn ledger_path(&self) -> PathBuf {
        self.dir.join(LEDGER_FILE)
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// Create the on-disk pair at version 0 if it does not exist yet
    async fn initialize(&mut self) -> Result<u64> {
        if let Some(version) = self.version {
            return Ok(version);
        }

        fs::create_dir_all(&self.dir).await?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())
            .await?;
        write_atomic(&self.ledger_path(), "0").await?;

        info!("Created conversation files in {:?}", self.dir);
        self.version = Some(0);
        Ok(0)
    }

    async fn persist_version(&mut self, version: u64) -> Result<()> {
        write_atomic(&self.ledger_path(), &version.to_string()).await?;
        self.version = Some(version);
        Ok(())
    }

    /// Swap in a snapshot's history and ledger value together.
    ///
    /// Both files are staged before either is renamed into place; if the
    /// ledger rename fails the previous history is written back.
    async fn replace(&mut self, snapshot: &Snapshot) -> Result<()> {
        let history_path = self.history_path();
        let ledger_path = self.ledger_path();
        let previous = self.read_history().await?;

        let staged_history = stage(&history_path, &snapshot.history).await?;
        let staged_ledger = match stage(&ledger_path, &snapshot.version.to_string()).await {
            Ok(staged) => staged,
            Err(e) => {
                discard(&staged_history).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staged_history, &history_path).await {
            discard(&staged_history).await;
            discard(&staged_ledger).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staged_ledger, &ledger_path).await {
            discard(&staged_ledger).await;
            if let Err(restore) = write_atomic(&history_path, &previous).await {
                error!("Failed to restore {:?}: {}", history_path, restore);
            }
            return Err(e.into());
        }

        self.version = Some(snapshot.version);
        Ok(())
    }

    async fn read_history(&self) -> Result<String> {
        match fs::read_to_string(self.history_path()).await {
            Ok(history) => Ok(history),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Ledger {
    pub fn new(identity: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            identity: identity.into(),
            root: root.into(),
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether this peer may hold a copy of `conversation`
    pub fn accepts(&self, conversation: &ConversationId) -> bool {
        conversation.involves(&self.identity)
    }

    fn conversation_dir(&self, conversation: &ConversationId) -> Result<PathBuf> {
        match conversation {
            ConversationId::Room { name } => {
                Ok(tether_common::room_dir(&self.root, &self.identity, name))
            }
            ConversationId::Personal { .. } => {
                let peer = conversation.counterpart(&self.identity).ok_or_else(|| {
                    PeerError::ForeignConversation {
                        conversation: conversation.clone(),
                        identity: self.identity.clone(),
                    }
                })?;
                Ok(tether_common::personal_dir(&self.root, &self.identity, peer))
            }
        }
    }

    async fn cached(&self, conversation: &ConversationId) -> Option<Arc<Mutex<ConversationState>>> {
        self.conversations.read().await.get(conversation).cloned()
    }

    async fn insert(
        &self,
        conversation: &ConversationId,
        dir: PathBuf,
        version: Option<u64>,
    ) -> Arc<Mutex<ConversationState>> {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState { dir, version })))
            .clone()
    }

    /// Slot for a conversation that exists in memory or on disk.
    ///
    /// Unknown conversations are not tracked, so lookups from other peers
    /// never grow the map.
    async fn lookup(
        &self,
        conversation: &ConversationId,
    ) -> Result<Option<Arc<Mutex<ConversationState>>>> {
        if let Some(slot) = self.cached(conversation).await {
            return Ok(Some(slot));
        }

        let dir = self.conversation_dir(conversation)?;
        match load_version(&dir.join(LEDGER_FILE)).await? {
            Some(version) => Ok(Some(self.insert(conversation, dir, Some(version)).await)),
            None => Ok(None),
        }
    }

    /// Slot for a conversation about to be written, tracked from now on
    async fn slot(&self, conversation: &ConversationId) -> Result<Arc<Mutex<ConversationState>>> {
        if let Some(slot) = self.cached(conversation).await {
            return Ok(slot);
        }

        let dir = self.conversation_dir(conversation)?;
        let version = load_version(&dir.join(LEDGER_FILE)).await?;
        Ok(self.insert(conversation, dir, version).await)
    }

    /// Persisted ledger value, or 0 for a conversation never seen locally
    pub async fn version(&self, conversation: &ConversationId) -> Result<u64> {
        match self.lookup(conversation).await? {
            Some(slot) => {
                let state = slot.lock().await;
                Ok(state.version.unwrap_or(0))
            }
            None => Ok(0),
        }
    }

    pub async fn is_initialized(&self, conversation: &ConversationId) -> Result<bool> {
        match self.lookup(conversation).await? {
            Some(slot) => {
                let state = slot.lock().await;
                Ok(state.version.is_some())
            }
            None => Ok(false),
        }
    }

    pub async fn history(&self, conversation: &ConversationId) -> Result<String> {
        match self.lookup(conversation).await? {
            Some(slot) => {
                let state = slot.lock().await;
                let history = state.read_history().await?;
                Ok(history)
            }
            None => Ok(String::new()),
        }
    }

    /// History and ledger value read under one lock
    pub async fn snapshot(&self, conversation: &ConversationId) -> Result<Snapshot> {
        let Some(slot) = self.lookup(conversation).await? else {
            return Ok(Snapshot::default());
        };
        let state = slot.lock().await;
        let Some(version) = state.version else {
            return Ok(Snapshot::default());
        };
        Ok(Snapshot {
            version,
            history: state.read_history().await?,
        })
    }

    /// Enter a conversation: create it at version 0 if needed, return its value
    pub async fn open(&self, conversation: &ConversationId) -> Result<u64> {
        let slot = self.slot(conversation).await?;
        let mut state = slot.lock().await;
        state.initialize().await
    }

    /// Append one formatted message and advance the ledger by exactly 1.
    ///
    /// If either write fails the history is truncated back, so the log never
    /// holds a line the ledger does not count.
    pub async fn append(&self, conversation: &ConversationId, message: &str) -> Result<u64> {
        let slot = self.slot(conversation).await?;
        let mut state = slot.lock().await;
        let current = state.initialize().await?;

        let line = format_record(message);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(state.history_path())
            .await?;
        let rollback_len = file.metadata().await?.len();

        let version = current + 1;
        let written = match write_line(&mut file, &line).await {
            Ok(()) => state.persist_version(version).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(truncate) = file.set_len(rollback_len).await {
                error!(
                    "Failed to roll back {:?} after a failed append: {}",
                    state.history_path(),
                    truncate
                );
            }
            return Err(e);
        }

        debug!("{} advanced to version {}", conversation, version);
        Ok(version)
    }

    /// Apply a reconciliation result.
    ///
    /// A snapshot newer than the local copy replaces the history verbatim and
    /// sets the ledger to the snapshot's value. Otherwise the current value
    /// is written back unchanged; the ledger never moves backwards.
    pub async fn adopt(
        &self,
        conversation: &ConversationId,
        snapshot: Option<Snapshot>,
    ) -> Result<u64> {
        let slot = self.slot(conversation).await?;
        let mut state = slot.lock().await;
        let current = state.initialize().await?;

        match snapshot {
            Some(snapshot) if snapshot.version > current => {
                state.replace(&snapshot).await?;
                info!(
                    "{} replaced local history: version {} -> {}",
                    conversation, current, snapshot.version
                );
                Ok(snapshot.version)
            }
            _ => {
                state.persist_version(current).await?;
                Ok(current)
            }
        }
    }

    #[cfg(test)]
    async fn tracked_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

/// `timestamp - sender: text`, one line per record
fn format_record(message: &str) -> String {
    let message = message.replace(['\r', '\n'], " ");
    format!(
        "{} - {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        message
    )
}

async fn load_version(path: &Path) -> Result<Option<u64>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Some(0));
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| PeerError::CorruptLedger {
            path: path.to_path_buf(),
            value: trimmed.to_string(),
        })
}

async fn write_line(file: &mut fs::File, line: &str) -> Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Write `contents` next to `path` without touching `path` itself
async fn stage(path: &Path, contents: &str) -> Result<PathBuf> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents).await?;
    Ok(temp_path)
}

async fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        debug!("Could not remove {:?}: {}", temp_path, e);
    }
}

/// Write to a temp file and rename it into place
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = stage(path, contents).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}
