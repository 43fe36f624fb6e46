use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a conversation on the wire.
///
/// A personal conversation is named by the unordered pair of its members so
/// both ends use the same identifier; each peer resolves it to "my chat with
/// the other member" via [`ConversationId::counterpart`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationId {
    Room { name: String },
    Personal { members: [String; 2] },
}

impl ConversationId {
    pub fn room(name: impl Into<String>) -> Self {
        ConversationId::Room { name: name.into() }
    }

    pub fn personal(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        let members = if a <= b { [a, b] } else { [b, a] };
        ConversationId::Personal { members }
    }

    pub fn is_room(&self) -> bool {
        matches!(self, ConversationId::Room { .. })
    }

    /// Whether `identity` takes part in this conversation. Rooms are open.
    pub fn involves(&self, identity: &str) -> bool {
        match self {
            ConversationId::Room { .. } => true,
            ConversationId::Personal { members } => members.iter().any(|m| m == identity),
        }
    }

    /// The other member of a personal conversation as seen by `identity`.
    ///
    /// Returns `None` for rooms and for pairs `identity` is not part of.
    pub fn counterpart(&self, identity: &str) -> Option<&str> {
        match self {
            ConversationId::Room { .. } => None,
            ConversationId::Personal { members: [a, b] } => {
                if a == identity {
                    Some(b)
                } else if b == identity {
                    Some(a)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationId::Room { name } => write!(f, "room '{}'", name),
            ConversationId::Personal { members: [a, b] } => write!(f, "personal '{}'/'{}'", a, b),
        }
    }
}
