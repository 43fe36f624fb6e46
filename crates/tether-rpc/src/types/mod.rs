mod conversation;
mod endpoint;
pub mod messages;

pub use conversation::ConversationId;
pub use endpoint::{Endpoint, EndpointSet};
pub use messages::{FindReply, Snapshot};
