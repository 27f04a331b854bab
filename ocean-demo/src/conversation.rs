//! Conversation state and chat service
//!
//! `ConversationState` is the append-only transcript store. `ChatService`
//! implements the user-facing submit flow: the user message is appended
//! immediately and exactly one assistant reply follows once the simulated
//! latency elapses and the responder answers.

use crate::responder::{QueryRequest, QueryResponder};
use ocean_common::events::{EventBus, MessageInfo, MessageRole, OceanEvent};
use ocean_common::time::{millis_to_duration, now};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Assistant greeting seeded into a fresh transcript
pub const WELCOME_MESSAGE: &str = "Welcome to OceanGPT! I can help you explore ocean data from ARGO floats worldwide. Try asking about temperature profiles, salinity measurements, or specific ocean regions.";

/// Suggested prompts offered next to the chat input
pub const QUICK_PROMPTS: [&str; 4] = [
    "Show salinity near the equator",
    "Temperature profiles in the Atlantic",
    "Compare floats in the Pacific",
    "Recent data from the Indian Ocean",
];

/// Plain transcript data
///
/// Ids keep increasing across `clear()` so that no id is ever reused.
#[derive(Debug)]
pub struct Transcript {
    messages: Vec<MessageInfo>,
    next_id: u64,
    epoch: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
            epoch: 0,
        }
    }

    /// Append a message and return a copy of it
    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) -> MessageInfo {
        let message = MessageInfo {
            id: self.next_id,
            role,
            content: content.into(),
            timestamp: now(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }

    /// Drop every message and start a new epoch
    pub fn clear(&mut self) {
        self.messages.clear();
        self.epoch += 1;
    }

    pub fn messages(&self) -> &[MessageInfo] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Incremented by every `clear()`
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, observable transcript store
pub struct ConversationState {
    transcript: RwLock<Transcript>,
    events: EventBus,
}

impl ConversationState {
    /// Empty transcript
    pub fn new(events: EventBus) -> Self {
        Self {
            transcript: RwLock::new(Transcript::new()),
            events,
        }
    }

    /// Transcript seeded with the assistant welcome message
    pub fn with_welcome(events: EventBus) -> Self {
        let mut transcript = Transcript::new();
        transcript.push(MessageRole::Assistant, WELCOME_MESSAGE);
        Self {
            transcript: RwLock::new(transcript),
            events,
        }
    }

    async fn append(&self, role: MessageRole, content: String) -> MessageInfo {
        let mut transcript = self.transcript.write().await;
        let message = transcript.push(role, content);
        // Emit under the lock so subscribers see transcript order
        self.events.emit_lossy(OceanEvent::MessageAppended {
            message: message.clone(),
            timestamp: message.timestamp,
        });
        message
    }

    /// Append a user message without requesting a reply
    pub async fn append_user_message(&self, content: impl Into<String>) -> MessageInfo {
        self.append(MessageRole::User, content.into()).await
    }

    /// Append a user message and return the epoch it landed in
    ///
    /// Both happen under one write lock, so a concurrent `reset()` is either
    /// fully before the message or clears it.
    pub async fn append_user_message_with_epoch(
        &self,
        content: impl Into<String>,
    ) -> (MessageInfo, u64) {
        let mut transcript = self.transcript.write().await;
        let message = transcript.push(MessageRole::User, content);
        self.events.emit_lossy(OceanEvent::MessageAppended {
            message: message.clone(),
            timestamp: message.timestamp,
        });
        (message, transcript.epoch())
    }

    /// Append an assistant message immediately
    pub async fn append_assistant_message(&self, content: impl Into<String>) -> MessageInfo {
        self.append(MessageRole::Assistant, content.into()).await
    }

    /// Append only if no reset happened since `epoch` was observed
    pub async fn append_if_epoch(
        &self,
        epoch: u64,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Option<MessageInfo> {
        let mut transcript = self.transcript.write().await;
        if transcript.epoch() != epoch {
            return None;
        }
        let message = transcript.push(role, content);
        self.events.emit_lossy(OceanEvent::MessageAppended {
            message: message.clone(),
            timestamp: message.timestamp,
        });
        Some(message)
    }

    /// Clear the transcript; replies still pending are discarded
    pub async fn reset(&self) {
        let mut transcript = self.transcript.write().await;
        transcript.clear();
        self.events.emit_lossy(OceanEvent::ConversationReset { timestamp: now() });
        info!("Conversation reset (epoch {})", transcript.epoch());
    }

    /// Snapshot of all messages in insertion order
    pub async fn messages(&self) -> Vec<MessageInfo> {
        self.transcript.read().await.messages().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.transcript.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transcript.read().await.is_empty()
    }

    pub async fn epoch(&self) -> u64 {
        self.transcript.read().await.epoch()
    }
}

/// Handles user free-text entry against the query responder
#[derive(Clone)]
pub struct ChatService {
    conversation: Arc<ConversationState>,
    responder: Arc<dyn QueryResponder>,
    events: EventBus,
    reply_delay: Duration,
}

impl ChatService {
    pub fn new(
        conversation: Arc<ConversationState>,
        responder: Arc<dyn QueryResponder>,
        events: EventBus,
        reply_delay_ms: u64,
    ) -> Self {
        Self {
            conversation,
            responder,
            events,
            reply_delay: millis_to_duration(reply_delay_ms),
        }
    }

    /// Append a user message and schedule exactly one assistant reply
    ///
    /// Returns the appended user message. The reply task is detached; it
    /// appends a fallback message if the responder fails and appends
    /// nothing if the conversation was reset in the meantime.
    pub async fn submit(&self, text: impl Into<String>) -> MessageInfo {
        let text = text.into();
        let (message, epoch) = self
            .conversation
            .append_user_message_with_epoch(text.clone())
            .await;

        let service = self.clone();
        tokio::spawn(async move {
            service.reply(epoch, text).await;
        });

        message
    }

    async fn reply(&self, epoch: u64, text: String) {
        if !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        }

        let content = match self.responder.query(&QueryRequest::new(text.clone())).await {
            Ok(response) => {
                self.events.emit_lossy(OceanEvent::QueryAnswered {
                    query_id: response.query_id.clone(),
                    matched_ids: response.matched_ids.clone(),
                    confidence: response.confidence,
                    timestamp: now(),
                });
                response.answer_text
            }
            Err(e) => {
                warn!("Query responder failed for {:?}: {}", text, e);
                fallback_reply(&text)
            }
        };

        if self
            .conversation
            .append_if_epoch(epoch, MessageRole::Assistant, content)
            .await
            .is_none()
        {
            debug!("Discarded reply to {:?}: conversation was reset", text);
        }
    }
}

fn fallback_reply(query: &str) -> String {
    format!(
        "Sorry, I couldn't process \"{}\" right now. Please try again in a moment.",
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_ids_are_monotonic_across_clear() {
        let mut transcript = Transcript::new();
        let a = transcript.push(MessageRole::User, "a");
        let b = transcript.push(MessageRole::Assistant, "b");
        transcript.clear();
        let c = transcript.push(MessageRole::User, "c");

        assert!(a.id < b.id && b.id < c.id);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.epoch(), 1);
    }

    #[tokio::test]
    async fn test_welcome_message_seeded() {
        let state = ConversationState::with_welcome(EventBus::new(16));
        let messages = state.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn test_append_emits_event() {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let state = ConversationState::new(events);

        let appended = state.append_assistant_message("hello").await;
        match rx.recv().await.unwrap() {
            OceanEvent::MessageAppended { message, .. } => assert_eq!(message, appended),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_append_if_epoch_rejects_stale_epoch() {
        let state = ConversationState::new(EventBus::new(16));
        let epoch = state.epoch().await;
        state.reset().await;

        let result = state
            .append_if_epoch(epoch, MessageRole::Assistant, "late reply")
            .await;
        assert!(result.is_none());
        assert!(state.is_empty().await);
    }

    #[test]
    fn test_fallback_reply_mentions_query() {
        let reply = fallback_reply("salinity");
        assert!(reply.starts_with("Sorry"));
        assert!(reply.contains("\"salinity\""));
    }

    #[tokio::test]
    async fn test_user_message_epoch_matches_transcript() {
        let state = ConversationState::new(EventBus::new(16));
        state.reset().await;
        state.reset().await;

        let (message, epoch) = state.append_user_message_with_epoch("hi").await;
        assert_eq!(epoch, 2);
        assert_eq!(epoch, state.epoch().await);
        assert_eq!(state.messages().await, vec![message]);

        // A reply tagged with that epoch is accepted
        assert!(state
            .append_if_epoch(epoch, MessageRole::Assistant, "hello")
            .await
            .is_some());
    }
}
