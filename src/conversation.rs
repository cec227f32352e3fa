//! In-memory conversation and message records.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type ConversationId = u64;
pub type MessageId = u64;

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    /// Names of the documents the answer drew on (assistant messages only).
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<Message>,
    last_conversation_id: ConversationId,
    last_message_id: MessageId,
}

/// Conversation and message storage behind `std::sync::RwLock`.
#[derive(Default)]
pub struct ConversationStore {
    inner: RwLock<Inner>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All conversations, most recently updated first.
    pub fn list(&self) -> Vec<Conversation> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<Conversation> = inner.conversations.values().cloned().collect();
        list.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        list
    }

    pub fn get(&self, id: ConversationId) -> Option<Conversation> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.conversations.get(&id).cloned()
    }

    pub fn create(&self, title: &str) -> Conversation {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.last_conversation_id += 1;
        let now = Utc::now();
        let conversation = Conversation {
            id: inner.last_conversation_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        conversation
    }

    /// Bump `updated_at`. Returns `None` for an unknown id.
    pub fn touch(&self, id: ConversationId) -> Option<Conversation> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let conversation = inner.conversations.get_mut(&id)?;
        conversation.updated_at = Utc::now();
        Some(conversation.clone())
    }

    /// Delete a conversation and all of its messages.
    pub fn delete(&self, id: ConversationId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let deleted = inner.conversations.remove(&id).is_some();
        if deleted {
            inner.messages.retain(|m| m.conversation_id != id);
        }
        deleted
    }

    /// Messages of one conversation, oldest first.
    pub fn messages(&self, conversation_id: ConversationId) -> Vec<Message> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    pub fn add_message(
        &self,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        sources: Vec<String>,
    ) -> Message {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.last_message_id += 1;
        let message = Message {
            id: inner.last_message_id,
            conversation_id,
            role,
            content: content.to_string(),
            sources,
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        message
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
