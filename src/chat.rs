//! One question/answer exchange inside a conversation.
//!
//! Stores the user's message, retrieves context, asks the generator, and
//! stores the answer together with the names of the documents it drew on.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use docchat_core::store::DocumentStore;
use docchat_core::DocumentLibrary;

use crate::config::Config;
use crate::conversation::{ConversationId, ConversationStore, Message, Role};
use crate::generate::{self, ChatTurn, GenerationRequest, Generator};

/// Shared state needed to answer messages.
pub struct ChatContext<'a, S: DocumentStore> {
    pub library: &'a DocumentLibrary<S>,
    pub conversations: &'a ConversationStore,
    pub generator: &'a dyn Generator,
    pub config: &'a Config,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub user_message: Message,
    pub assistant_message: Message,
}

/// Answer `content` in conversation `conversation_id`.
///
/// If generation fails, the user message stays stored and the error is
/// returned; no assistant message is recorded.
pub async fn send_message<S: DocumentStore>(
    ctx: &ChatContext<'_, S>,
    conversation_id: ConversationId,
    content: &str,
) -> Result<Exchange> {
    if content.trim().is_empty() {
        bail!("Message content is required");
    }
    if ctx.conversations.get(conversation_id).is_none() {
        bail!("Conversation not found: {}", conversation_id);
    }

    let history = recent_history(
        ctx.conversations,
        conversation_id,
        ctx.config.generation.history_messages,
    );
    let user_message = ctx
        .conversations
        .add_message(conversation_id, Role::User, content, Vec::new());

    let results = ctx.library.search(content, ctx.config.retrieval.limit);
    info!(
        conversation = conversation_id,
        matches = results.len(),
        "retrieved context"
    );

    let request = GenerationRequest {
        system_prompt: generate::system_prompt(&generate::build_context(&results)),
        history,
        query: content.to_string(),
    };
    let answer = ctx
        .generator
        .generate(&request)
        .await
        .with_context(|| format!("Failed to generate AI response with {}", ctx.generator.model_name()))?;

    let assistant_message = ctx.conversations.add_message(
        conversation_id,
        Role::Assistant,
        &answer,
        generate::source_names(&results),
    );
    ctx.conversations.touch(conversation_id);

    Ok(Exchange {
        user_message,
        assistant_message,
    })
}

/// The last `n` messages of a conversation as model turns, oldest first.
pub fn recent_history(
    conversations: &ConversationStore,
    conversation_id: ConversationId,
    n: usize,
) -> Vec<ChatTurn> {
    let messages = conversations.messages(conversation_id);
    let skip = messages.len().saturating_sub(n);
    messages
        .into_iter()
        .skip(skip)
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_text;
    use async_trait::async_trait;
    use docchat_core::store::memory::InMemoryStore;
    use std::sync::Mutex;

    /// Records every request and answers with a fixed string.
    struct Recorder {
        requests: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl Generator for Recorder {
        fn model_name(&self) -> &str {
            "recorder"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("Cats sleep a lot.".to_string())
        }
    }

    #[tokio::test]
    async fn test_exchange_records_sources_and_history() {
        let config = Config::default();
        let library = DocumentLibrary::open(InMemoryStore::new()).await.unwrap();
        ingest_text(
            &library,
            "animals.txt",
            "Cats are small animals. Dogs are loyal companions. Cats often sleep during the day.",
            &config,
        )
        .await
        .unwrap();
        ingest_text(&library, "space.md", "Rockets reach orbit.", &config)
            .await
            .unwrap();

        let conversations = ConversationStore::new();
        let recorder = Recorder {
            requests: Mutex::new(Vec::new()),
        };
        let ctx = ChatContext {
            library: &library,
            conversations: &conversations,
            generator: &recorder,
            config: &config,
        };
        let conv = conversations.create("Pets");

        let first = send_message(&ctx, conv.id, "When do cats sleep?").await.unwrap();
        assert_eq!(first.user_message.role, Role::User);
        assert_eq!(first.assistant_message.content, "Cats sleep a lot.");
        assert_eq!(first.assistant_message.sources, vec!["animals"]);

        send_message(&ctx, conv.id, "Tell me about rockets").await.unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert!(requests[0].history.is_empty());
        assert!(requests[0].system_prompt.contains("[Source 1: animals]"));
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(requests[1].history[0].content, "When do cats sleep?");
        assert_eq!(requests[1].query, "Tell me about rockets");
        assert!(requests[1].system_prompt.contains("[Source 1: space]"));
        assert_eq!(conversations.messages(conv.id).len(), 4);
    }

    #[tokio::test]
    async fn test_rejects_blank_and_unknown_conversation() {
        let config = Config::default();
        let library = DocumentLibrary::open(InMemoryStore::new()).await.unwrap();
        let conversations = ConversationStore::new();
        let recorder = Recorder {
            requests: Mutex::new(Vec::new()),
        };
        let ctx = ChatContext {
            library: &library,
            conversations: &conversations,
            generator: &recorder,
            config: &config,
        };

        assert!(send_message(&ctx, 99, "hello").await.is_err());
        let conv = conversations.create("c");
        assert!(send_message(&ctx, conv.id, "   ").await.is_err());
        assert!(conversations.messages(conv.id).is_empty());
    }

    #[test]
    fn test_recent_history_keeps_last_n() {
        let conversations = ConversationStore::new();
        let conv = conversations.create("c");
        for i in 0..10 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            conversations.add_message(conv.id, role, &format!("m{i}"), Vec::new());
        }
        let history = recent_history(&conversations, conv.id, 6);
        let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m4", "m5", "m6", "m7", "m8", "m9"]);
        assert!(recent_history(&conversations, conv.id, 0).is_empty());
    }
}
