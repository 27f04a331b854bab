//! Integration tests for the chat submit flow
//!
//! Covers:
//! - One user message immediately, one assistant reply after the delay
//! - Reset discarding replies still in flight
//! - Reply text taken from the responder's answer
//! - Fallback reply when the responder fails
//! - Scenario playback sharing the transcript with user chat

use async_trait::async_trait;
use ocean_common::events::{MessageRole, OceanEvent};
use ocean_demo::catalog::{CatalogLatency, MockCatalog};
use ocean_demo::conversation::ChatService;
use ocean_demo::error::{Error, Result};
use ocean_demo::playback::ScenarioPlayer;
use ocean_demo::responder::{
    CannedResponder, ChartInstructions, QueryRequest, QueryResponder, QueryResponse,
    VisualizationDirective,
};
use ocean_demo::scenario::ScenarioLibrary;
use ocean_demo::state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const REPLY_DELAY_MS: u64 = 1500;

/// Responder that always fails
struct FailingResponder;

#[async_trait]
impl QueryResponder for FailingResponder {
    async fn query(&self, _request: &QueryRequest) -> Result<QueryResponse> {
        Err(Error::Query("backend unavailable".to_string()))
    }
}

/// Responder with a fixed answer and a single match
struct FixedAnswerResponder;

#[async_trait]
impl QueryResponder for FixedAnswerResponder {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        Ok(QueryResponse {
            query_id: "q-fixed".to_string(),
            matched_ids: vec!["R12345".to_string()],
            visualization: VisualizationDirective {
                action: "visualize_profiles".to_string(),
                kind: "single_profile".to_string(),
                profiles: Vec::new(),
                chart_instructions: ChartInstructions {
                    x: "temperature".to_string(),
                    y: "depth".to_string(),
                    y_inverted: true,
                },
            },
            answer_text: format!("RESPONDER ANSWER for {}", request.query),
            confidence: 0.5,
        })
    }
}

fn canned() -> Arc<dyn QueryResponder> {
    let catalog = Arc::new(MockCatalog::demo(CatalogLatency::none()));
    Arc::new(CannedResponder::new(catalog, 0))
}

fn chat_service(state: &SharedState, responder: Arc<dyn QueryResponder>) -> ChatService {
    ChatService::new(
        state.conversation.clone(),
        responder,
        state.events.clone(),
        REPLY_DELAY_MS,
    )
}

#[tokio::test(start_paused = true)]
async fn test_submit_appends_user_then_one_reply() {
    let state = SharedState::new();
    let chat = chat_service(&state, canned());
    let before = state.conversation.len().await;

    let user = chat.submit("Show me salinity near the equator").await;
    assert_eq!(user.role, MessageRole::User);
    assert_eq!(state.conversation.len().await, before + 1);

    // Not before the delay
    sleep(Duration::from_millis(REPLY_DELAY_MS - 100)).await;
    assert_eq!(state.conversation.len().await, before + 1);

    sleep(Duration::from_millis(200)).await;
    let messages = state.conversation.messages().await;
    assert_eq!(messages.len(), before + 2);
    let reply = messages.last().unwrap();
    assert_eq!(reply.role, MessageRole::Assistant);
    assert!(reply.id > user.id);
    assert!(reply.content.contains("Show me salinity near the equator"));

    // Exactly one reply, ever
    sleep(Duration::from_secs(10)).await;
    assert_eq!(state.conversation.len().await, before + 2);
}

#[tokio::test(start_paused = true)]
async fn test_reply_emits_query_answered() {
    let state = SharedState::new();
    let mut rx = state.subscribe_events();
    let chat = chat_service(&state, canned());

    chat.submit("temperature in the Pacific").await;
    sleep(Duration::from_secs(2)).await;

    let mut answered = None;
    while let Ok(event) = rx.try_recv() {
        if let OceanEvent::QueryAnswered {
            matched_ids,
            confidence,
            ..
        } = event
        {
            answered = Some((matched_ids, confidence));
        }
    }
    let (matched_ids, confidence) = answered.expect("QueryAnswered not emitted");
    assert_eq!(matched_ids.len(), 3);
    assert!((0.0..=1.0).contains(&confidence));
}

#[tokio::test(start_paused = true)]
async fn test_reset_discards_pending_reply() {
    let state = SharedState::new();
    let chat = chat_service(&state, canned());

    chat.submit("anything").await;
    sleep(Duration::from_millis(500)).await;
    state.conversation.reset().await;

    sleep(Duration::from_secs(5)).await;
    assert!(state.conversation.is_empty().await);

    // New messages after the reset still get their reply
    chat.submit("again").await;
    sleep(Duration::from_secs(2)).await;
    let roles: Vec<_> = state
        .conversation
        .messages()
        .await
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
}

#[tokio::test(start_paused = true)]
async fn test_reply_uses_responder_answer() {
    let state = SharedState::new();
    let chat = chat_service(&state, Arc::new(FixedAnswerResponder));

    chat.submit("hi").await;
    sleep(Duration::from_secs(2)).await;

    let messages = state.conversation.messages().await;
    let reply = messages.last().unwrap();
    assert_eq!(reply.role, MessageRole::Assistant);
    assert_eq!(reply.content, "RESPONDER ANSWER for hi");
}

#[tokio::test(start_paused = true)]
async fn test_submit_right_after_reset_gets_reply() {
    let state = SharedState::new();
    let chat = chat_service(&state, Arc::new(FixedAnswerResponder));

    state.conversation.reset().await;
    let user = chat.submit("depth").await;
    assert_eq!(state.conversation.messages().await, vec![user]);

    sleep(Duration::from_secs(2)).await;
    let contents: Vec<_> = state
        .conversation
        .messages()
        .await
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["depth", "RESPONDER ANSWER for depth"]);
}

#[tokio::test(start_paused = true)]
async fn test_responder_failure_appends_fallback() {
    let state = SharedState::new();
    let chat = chat_service(&state, Arc::new(FailingResponder));

    chat.submit("salinity").await;
    sleep(Duration::from_secs(2)).await;

    let messages = state.conversation.messages().await;
    let reply = messages.last().unwrap();
    assert_eq!(reply.role, MessageRole::Assistant);
    assert!(reply.content.starts_with("Sorry"));
}

#[tokio::test(start_paused = true)]
async fn test_user_chat_during_playback() {
    let state = Arc::new(SharedState::new());
    let chat = chat_service(&state, canned());
    let player = ScenarioPlayer::new(
        state.clone(),
        Arc::new(ScenarioLibrary::builtin().unwrap()),
        Duration::from_secs(1),
    );

    player.start_by_id("equatorial-salinity").await.unwrap();
    chat.submit("what am I looking at?").await;

    sleep(Duration::from_secs(20)).await;

    // Welcome, scenario query, user text, reply, scenario insight
    let messages = state.conversation.messages().await;
    assert_eq!(messages.len(), 5);
    let ids: Vec<u64> = messages.iter().map(|m| m.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(messages[4].content, "AI provides oceanographic insights");
}
