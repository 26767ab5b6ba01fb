use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ConversationStore;
use crate::error::ScoutError;
use crate::types::ModelMessage;

/// Process-lifetime store. Histories are dropped when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<String, Vec<ModelMessage>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn get_history(&self, session_id: &str) -> Result<Vec<ModelMessage>, ScoutError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn append(
        &self,
        session_id: &str,
        messages: Vec<ModelMessage>,
    ) -> Result<(), ScoutError> {
        if messages.is_empty() {
            return Ok(());
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .extend(messages);
        Ok(())
    }
}
