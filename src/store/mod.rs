//! Session-scoped conversation storage.

mod locks;
mod memory;

pub use locks::SessionLocks;
pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::error::ScoutError;
use crate::types::ModelMessage;

/// Storage abstraction for conversation histories keyed by session id.
///
/// Implementations must be safe for concurrent use across sessions.
/// Failures to reach the backing resource surface as
/// [`ScoutError::TransientStore`].
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Ordered history for `session_id`. Unknown ids yield an empty history.
    async fn get_history(&self, session_id: &str) -> Result<Vec<ModelMessage>, ScoutError>;

    /// Append `messages` as one contiguous block, creating the session on
    /// first write. Two appends to one session never interleave.
    async fn append(&self, session_id: &str, messages: Vec<ModelMessage>)
        -> Result<(), ScoutError>;
}
