//! Testing utilities for the game-creation flow.
//!
//! This module provides tools for integration testing:
//! - `ScriptedProvider` for deterministic agent responses without API calls
//! - `TestHarness` for scripted end-to-end sessions
//! - Assertion helpers for verifying session state

use crate::agent::{CodeGenerator, GameDesigner, LlmProvider, StoryAnalyst};
use crate::orchestrator::{GameCreationOrchestrator, Phase, SessionState};
use crate::schema::{BookAnalysis, GameDesign, GameType};
use async_trait::async_trait;
use claude::{ContentBlock, EventStream, Request, Response, StopReason, StreamEvent, Usage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted outcome for one provider call.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Return this text as the model's reply.
    Text(String),
    /// Fail the call with a network error carrying this message.
    Failure(String),
}

/// An [`LlmProvider`] that replays scripted outcomes in order.
///
/// Once the script runs dry it returns a fixed placeholder reply, so a
/// test that under-scripts fails on content rather than hanging.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    delay: Mutex<Option<std::time::Duration>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a text reply.
    pub fn expect_text(&self, text: impl Into<String>) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Text(text.into()));
        self
    }

    /// Queue a provider failure.
    pub fn expect_failure(&self, message: impl Into<String>) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Failure(message.into()));
        self
    }

    /// Outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }

    /// Delay every call by `delay` (for exercising timeouts).
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next(&self) -> ScriptedOutcome {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                ScriptedOutcome::Text("The agent has no more scripted responses.".to_string())
            })
    }
}

/// Build a plain text completion response.
pub fn text_response(text: impl Into<String>) -> Response {
    Response {
        id: "msg_scripted".to_string(),
        model: "scripted".to_string(),
        content: vec![ContentBlock::Text { text: text.into() }],
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            input_tokens: 0,
            output_tokens: 0,
        },
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, _request: Request) -> Result<Response, claude::Error> {
        self.simulate_latency().await;
        match self.next() {
            ScriptedOutcome::Text(text) => Ok(text_response(text)),
            ScriptedOutcome::Failure(message) => Err(claude::Error::Network(message)),
        }
    }

    async fn stream(&self, _request: Request) -> Result<EventStream, claude::Error> {
        match self.next() {
            ScriptedOutcome::Text(text) => {
                let events = vec![
                    Ok(StreamEvent::TextDelta { index: 0, text }),
                    Ok(StreamEvent::MessageStop),
                ];
                Ok(Box::pin(futures::stream::iter(events)))
            }
            ScriptedOutcome::Failure(message) => Err(claude::Error::Network(message)),
        }
    }
}

/// Test harness wiring an orchestrator to three scripted providers.
pub struct TestHarness {
    pub orchestrator: GameCreationOrchestrator,
    pub analyst: Arc<ScriptedProvider>,
    pub designer: Arc<ScriptedProvider>,
    pub generator: Arc<ScriptedProvider>,
}

impl TestHarness {
    pub fn new() -> Self {
        let analyst = ScriptedProvider::new();
        let designer = ScriptedProvider::new();
        let generator = ScriptedProvider::new();

        let analyst_provider: Arc<dyn LlmProvider> = analyst.clone();
        let designer_provider: Arc<dyn LlmProvider> = designer.clone();
        let generator_provider: Arc<dyn LlmProvider> = generator.clone();
        let orchestrator = GameCreationOrchestrator::new(
            StoryAnalyst::new(analyst_provider),
            GameDesigner::new(designer_provider),
            CodeGenerator::new(generator_provider),
        );

        Self {
            orchestrator,
            analyst,
            designer,
            generator,
        }
    }

    /// A book image that needs no filesystem access.
    pub fn book_image() -> crate::agent::BookImage {
        crate::agent::BookImage::inline("image/jpeg", "dGVzdC1pbWFnZQ==")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete game script that passes validation with zero warnings.
pub const PLAYABLE_CODE: &str = "\
const config = { type: 'AUTO', width: 800, height: 600 };\n\
function preload() {}\n\
function create() { showGameOver('Play Again', this); }\n\
function update() {}\n\
function showGameOver(label, scene) { restart(label); }\n\
function restart(label) {}\n";

/// An analyst finalize reply embedding a parseable analysis for `title`.
pub fn analysis_reply(title: &str) -> String {
    let mut analysis = BookAnalysis::fallback();
    analysis.book.title = title.to_string();
    format!(
        "What a great conversation! Here's my complete analysis:\n\n{}",
        serde_json::to_string_pretty(&analysis).unwrap()
    )
}

/// A designer finalize reply embedding a parseable design.
pub fn design_reply(title: &str, game_type: GameType) -> String {
    let mut design = GameDesign::fallback();
    design.game_title = title.to_string();
    design.game_type = game_type;
    format!(
        "Here's our finished design - it's going to be awesome!\n\n{}",
        serde_json::to_string_pretty(&design).unwrap()
    )
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the session is in the expected phase.
#[track_caller]
pub fn assert_phase(state: &SessionState, phase: Phase) {
    assert_eq!(
        state.phase, phase,
        "Expected phase {phase:?}, got {:?} (error: {:?})",
        state.phase, state.error
    );
}

/// Assert the session is waiting on user input.
#[track_caller]
pub fn assert_awaiting_input(state: &SessionState) {
    assert!(
        state.awaiting_user_input,
        "Expected session to await user input in phase {:?}",
        state.phase
    );
}

/// Assert the session carries no error.
#[track_caller]
pub fn assert_no_error(state: &SessionState) {
    assert!(
        state.error.is_none(),
        "Expected no session error, got {:?}",
        state.error
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Conversation;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_provider_order() {
        let provider = ScriptedProvider::new();
        provider.expect_text("first").expect_text("second");

        let r1 = provider.complete(Request::new(vec![])).await.unwrap();
        let r2 = provider.complete(Request::new(vec![])).await.unwrap();
        assert_eq!(r1.text(), "first");
        assert_eq!(r2.text(), "second");

        // Script exhausted: placeholder reply, not a hang or panic.
        let r3 = provider.complete(Request::new(vec![])).await.unwrap();
        assert!(r3.text().contains("no more scripted"));
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let provider = ScriptedProvider::new();
        provider.expect_failure("connection reset");

        let result = provider.complete(Request::new(vec![])).await;
        assert!(matches!(result, Err(claude::Error::Network(_))));
    }

    #[tokio::test]
    async fn test_scripted_stream() {
        let provider = ScriptedProvider::new();
        provider.expect_text("streamed");

        let mut stream = provider.stream(Request::new(vec![])).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert!(matches!(first, StreamEvent::TextDelta { ref text, .. } if text == "streamed"));
    }

    #[tokio::test]
    async fn test_scripted_agent_invocation() {
        let provider = ScriptedProvider::new();
        provider.expect_text("Hello there!");

        let scripted: Arc<dyn LlmProvider> = provider.clone();
        let analyst = StoryAnalyst::new(scripted);
        let reply = analyst
            .process_response("hi", "test", &Conversation::new())
            .await
            .unwrap();
        assert_eq!(reply.output, "Hello there!");
        assert!(reply.tool_trace.is_empty());
    }

    #[test]
    fn test_playable_code_is_clean() {
        let validation = crate::codegen::validate::validate_code(PLAYABLE_CODE);
        assert!(validation.is_valid);
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn test_reply_builders_parse() {
        let text = analysis_reply("Dragons Love Tacos");
        let parsed: BookAnalysis =
            crate::extract::extract_document(&text, "test").unwrap();
        assert_eq!(parsed.book.title, "Dragons Love Tacos");

        let text = design_reply("Taco Dash", GameType::TopDown);
        let parsed: GameDesign = crate::extract::extract_document(&text, "test").unwrap();
        assert_eq!(parsed.game_type, GameType::TopDown);
    }
}
