//! The game-creation state machine.
//!
//! [`GameCreationOrchestrator`] is the single authority over session state.
//! It sequences the three agents through the fixed pipeline
//! (book-capture → book-discussion → game-design → code-generation →
//! complete), decides phase completion, parses structured documents out of
//! agent output, and converts every agent failure into the session's error
//! state. Operations never panic across this boundary: caller-contract
//! violations surface as [`OrchestratorError`], everything else lands in
//! [`SessionState::error`].

use crate::agent::{
    BookImage, CodeGenerator, GameDesigner, LlmProvider, StoryAnalyst,
};
use crate::extract::extract_document;
use crate::history::{AgentKind, Conversation};
use crate::schema::{BookAnalysis, GameDesign};
use chrono::{DateTime, Utc};
use claude::Claude;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Conversation length at which a discussion phase finalizes
/// (five user/agent exchange pairs).
///
/// A fixed count rather than semantic completion detection; revisit if the
/// agents ever signal readiness themselves.
pub const DISCUSSION_COMPLETE_LEN: usize = 10;

/// Default wall-clock budget for code generation.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// The completion predicate for both discussion phases.
pub fn discussion_complete(history_len: usize) -> bool {
    history_len >= DISCUSSION_COMPLETE_LEN
}

/// One stage of the book-to-game pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    BookCapture,
    BookDiscussion,
    GameDesign,
    CodeGeneration,
    Complete,
    Error,
}

/// Caller-contract violations. These are programming errors in the calling
/// layer, reported as typed errors rather than stored in session state.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No API key configured - set ANTHROPIC_API_KEY environment variable")]
    NoApiKey,

    #[error("another operation is already in flight for this session")]
    Busy,

    #[error("operation not valid in phase {0:?}")]
    WrongPhase(Phase),

    #[error("session is in the error phase; reset to start over")]
    Halted,

    #[error("no book analysis available")]
    MissingAnalysis,

    #[error("no game design available")]
    MissingDesign,

    #[error("no generated game to revise")]
    NothingToRevise,
}

/// Snapshot of one game-creation session.
///
/// The UI layer reads snapshots returned from orchestrator calls; only the
/// orchestrator mutates the live record.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub phase: Phase,
    pub book_image_uri: Option<String>,
    pub book_analysis: Option<BookAnalysis>,
    pub game_design: Option<GameDesign>,
    pub generated_code: Option<String>,
    pub generated_html: Option<String>,
    /// Conversation for the current phase only.
    pub conversation: Conversation,
    /// The most recent agent message to display.
    pub current_message: Option<String>,
    /// True when the system is blocked waiting for the next user turn.
    pub awaiting_user_input: bool,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub generation_started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: Phase::BookCapture,
            book_image_uri: None,
            book_analysis: None,
            game_design: None,
            generated_code: None,
            generated_html: None,
            conversation: Conversation::new(),
            current_message: None,
            awaiting_user_input: false,
            error: None,
            started_at: Utc::now(),
            generation_started_at: None,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Document to design from when the analysis could not be parsed.
    pub fallback_analysis: Option<BookAnalysis>,

    /// Document to generate from when the design could not be parsed.
    pub fallback_design: Option<GameDesign>,

    /// Wall-clock budget for code generation.
    pub generation_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_analysis: None,
            fallback_design: None,
            generation_timeout: GENERATION_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_fallback_analysis(mut self, analysis: BookAnalysis) -> Self {
        self.fallback_analysis = Some(analysis);
        self
    }

    pub fn with_fallback_design(mut self, design: GameDesign) -> Self {
        self.fallback_design = Some(design);
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }
}

/// Coordinates the Story Analyst, Game Designer, and Code Generator
/// through one game-creation session.
pub struct GameCreationOrchestrator {
    story_analyst: StoryAnalyst,
    game_designer: GameDesigner,
    code_generator: CodeGenerator,
    config: OrchestratorConfig,
    state: SessionState,
    in_flight: bool,
}

impl GameCreationOrchestrator {
    /// Create an orchestrator with explicitly constructed agents.
    pub fn new(
        story_analyst: StoryAnalyst,
        game_designer: GameDesigner,
        code_generator: CodeGenerator,
    ) -> Self {
        Self {
            story_analyst,
            game_designer,
            code_generator,
            config: OrchestratorConfig::default(),
            state: SessionState::new(),
            in_flight: false,
        }
    }

    /// Create an orchestrator backed by the real Claude client.
    ///
    /// Requires `ANTHROPIC_API_KEY` environment variable to be set.
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let client = Claude::from_env().map_err(|_| OrchestratorError::NoApiKey)?;
        let provider: Arc<dyn LlmProvider> = Arc::new(client);

        Ok(Self::new(
            StoryAnalyst::new(provider.clone()),
            GameDesigner::new(provider.clone()),
            CodeGenerator::new(provider),
        ))
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Discard the session and start over from book capture.
    pub fn reset(&mut self) {
        self.state = SessionState::new();
        self.in_flight = false;
    }

    /// Whether the book discussion has gathered enough exchanges.
    pub fn should_complete_book_discussion(&self) -> bool {
        discussion_complete(self.state.conversation.len())
    }

    /// Whether the design conversation has gathered enough exchanges.
    pub fn should_finalize_game_design(&self) -> bool {
        discussion_complete(self.state.conversation.len())
    }

    // ========================================================================
    // Phase transitions
    // ========================================================================

    /// Enter the book-discussion phase from a captured cover image.
    pub async fn start_book_discussion(
        &mut self,
        image: BookImage,
    ) -> Result<SessionState, OrchestratorError> {
        self.begin(Phase::BookCapture)?;
        let result = self.start_book_discussion_inner(image).await;
        self.in_flight = false;
        result
    }

    /// Process one user turn of the book discussion.
    pub async fn process_book_discussion_response(
        &mut self,
        user_response: &str,
    ) -> Result<SessionState, OrchestratorError> {
        self.begin(Phase::BookDiscussion)?;
        let result = self.process_book_discussion_inner(user_response).await;
        self.in_flight = false;
        result
    }

    /// Finalize the book discussion and transition to game design.
    pub async fn complete_book_discussion(
        &mut self,
    ) -> Result<SessionState, OrchestratorError> {
        self.begin(Phase::BookDiscussion)?;
        let result = self.complete_book_discussion_inner().await;
        self.in_flight = false;
        result
    }

    /// Enter the game-design phase directly.
    ///
    /// The book analysis must already exist (in state or as a configured
    /// fallback); entering without one is a programming error.
    pub async fn start_game_design(&mut self) -> Result<SessionState, OrchestratorError> {
        self.check_idle()?;
        if self.state.book_analysis.is_none() && self.config.fallback_analysis.is_none() {
            return Err(OrchestratorError::MissingAnalysis);
        }
        self.in_flight = true;
        let result = self.start_game_design_inner().await;
        self.in_flight = false;
        result
    }

    /// Process one user turn of the design conversation.
    pub async fn process_game_design_response(
        &mut self,
        user_response: &str,
    ) -> Result<SessionState, OrchestratorError> {
        self.begin(Phase::GameDesign)?;
        let result = self.process_game_design_inner(user_response).await;
        self.in_flight = false;
        result
    }

    /// Finalize the design and transition to code generation.
    pub async fn finalize_game_design(&mut self) -> Result<SessionState, OrchestratorError> {
        self.begin(Phase::GameDesign)?;
        let result = self.finalize_game_design_inner().await;
        self.in_flight = false;
        result
    }

    /// Generate the game directly from the current design.
    ///
    /// The game design must already exist (in state or as a configured
    /// fallback); entering without one is a programming error.
    pub async fn start_code_generation(&mut self) -> Result<SessionState, OrchestratorError> {
        self.check_idle()?;
        if self.state.game_design.is_none() && self.config.fallback_design.is_none() {
            return Err(OrchestratorError::MissingDesign);
        }
        self.in_flight = true;
        let result = self.start_code_generation_inner().await;
        self.in_flight = false;
        result
    }

    /// Revise the design from feedback and regenerate the game.
    ///
    /// Failures here are non-fatal: the previous game is never discarded,
    /// the error is reported in state, and the user may retry.
    pub async fn spice_it_up(
        &mut self,
        feedback: &str,
    ) -> Result<SessionState, OrchestratorError> {
        self.check_idle()?;
        if self.state.generated_code.is_none() {
            return Err(OrchestratorError::NothingToRevise);
        }
        self.in_flight = true;
        let result = self.spice_it_up_inner(feedback).await;
        self.in_flight = false;
        result
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_idle(&self) -> Result<(), OrchestratorError> {
        if self.in_flight {
            return Err(OrchestratorError::Busy);
        }
        if self.state.phase == Phase::Error {
            return Err(OrchestratorError::Halted);
        }
        Ok(())
    }

    fn begin(&mut self, expected: Phase) -> Result<(), OrchestratorError> {
        self.check_idle()?;
        if self.state.phase != expected {
            return Err(OrchestratorError::WrongPhase(self.state.phase));
        }
        self.in_flight = true;
        Ok(())
    }

    /// Convert a failure into the terminal error state.
    fn fail(&mut self, err: impl std::fmt::Display) -> SessionState {
        let message = err.to_string();
        error!(error = %message, phase = ?self.state.phase, "session failed");
        self.state.error = Some(message);
        self.state.phase = Phase::Error;
        self.state.awaiting_user_input = false;
        self.state.clone()
    }

    fn effective_analysis(&self) -> BookAnalysis {
        self.state
            .book_analysis
            .clone()
            .or_else(|| self.config.fallback_analysis.clone())
            .unwrap_or_else(BookAnalysis::fallback)
    }

    fn effective_design(&self) -> GameDesign {
        self.state
            .game_design
            .clone()
            .or_else(|| self.config.fallback_design.clone())
            .unwrap_or_else(GameDesign::fallback)
    }

    async fn start_book_discussion_inner(
        &mut self,
        image: BookImage,
    ) -> Result<SessionState, OrchestratorError> {
        self.state.phase = Phase::BookDiscussion;
        self.state.book_image_uri = Some(image.uri());
        debug!("starting book discussion");

        match self
            .story_analyst
            .analyze_book(&image, &self.state.conversation)
            .await
        {
            Ok(reply) => {
                self.state.current_message = Some(reply.output.clone());
                self.state.awaiting_user_input = true;
                self.state
                    .conversation
                    .add_agent(reply.output, AgentKind::StoryAnalyst);
                Ok(self.state.clone())
            }
            Err(e) => Ok(self.fail(e)),
        }
    }

    async fn process_book_discussion_inner(
        &mut self,
        user_response: &str,
    ) -> Result<SessionState, OrchestratorError> {
        self.state.conversation.add_user(user_response);
        self.state.awaiting_user_input = false;

        match self
            .story_analyst
            .process_response(user_response, "book discussion", &self.state.conversation)
            .await
        {
            Ok(reply) => {
                self.state.current_message = Some(reply.output.clone());

                if self.should_complete_book_discussion() {
                    self.complete_book_discussion_inner().await
                } else {
                    self.state
                        .conversation
                        .add_agent(reply.output, AgentKind::StoryAnalyst);
                    self.state.awaiting_user_input = true;
                    Ok(self.state.clone())
                }
            }
            Err(e) => Ok(self.fail(e)),
        }
    }

    async fn complete_book_discussion_inner(
        &mut self,
    ) -> Result<SessionState, OrchestratorError> {
        match self
            .story_analyst
            .complete_analysis(&self.state.conversation)
            .await
        {
            Ok(reply) => {
                self.state.book_analysis = extract_document(&reply.output, "book analysis");
                if self.state.book_analysis.is_none() {
                    warn!("book analysis not parseable; the design phase will use a fallback");
                }
                self.start_game_design_inner().await
            }
            Err(e) => Ok(self.fail(e)),
        }
    }

    async fn start_game_design_inner(&mut self) -> Result<SessionState, OrchestratorError> {
        let analysis = self.effective_analysis();

        self.state.phase = Phase::GameDesign;
        // Fresh conversation for game design.
        self.state.conversation.clear();
        debug!(book = %analysis.book.title, "starting game design");

        match self
            .game_designer
            .start_design(&analysis, &self.state.conversation)
            .await
        {
            Ok(reply) => {
                self.state.current_message = Some(reply.output.clone());
                self.state.awaiting_user_input = true;
                self.state
                    .conversation
                    .add_agent(reply.output, AgentKind::GameDesigner);
                Ok(self.state.clone())
            }
            Err(e) => Ok(self.fail(e)),
        }
    }

    async fn process_game_design_inner(
        &mut self,
        user_response: &str,
    ) -> Result<SessionState, OrchestratorError> {
        self.state.conversation.add_user(user_response);
        self.state.awaiting_user_input = false;

        match self
            .game_designer
            .continue_design(user_response, "game design", &self.state.conversation)
            .await
        {
            Ok(reply) => {
                self.state.current_message = Some(reply.output.clone());

                if self.should_finalize_game_design() {
                    self.finalize_game_design_inner().await
                } else {
                    self.state
                        .conversation
                        .add_agent(reply.output, AgentKind::GameDesigner);
                    self.state.awaiting_user_input = true;
                    Ok(self.state.clone())
                }
            }
            Err(e) => Ok(self.fail(e)),
        }
    }

    async fn finalize_game_design_inner(&mut self) -> Result<SessionState, OrchestratorError> {
        match self
            .game_designer
            .finalize_design(&self.state.conversation)
            .await
        {
            Ok(reply) => {
                self.state.game_design = extract_document(&reply.output, "game design");
                if self.state.game_design.is_none() {
                    warn!("game design not parseable; generation will use a fallback");
                }
                self.start_code_generation_inner().await
            }
            Err(e) => Ok(self.fail(e)),
        }
    }

    async fn start_code_generation_inner(&mut self) -> Result<SessionState, OrchestratorError> {
        let design = self.effective_design();

        self.state.phase = Phase::CodeGeneration;
        self.state.generation_started_at = Some(Utc::now());
        self.state.awaiting_user_input = false;
        debug!(game = %design.game_title, game_type = %design.game_type, "generating game");

        let generation = self.code_generator.generate_game(&design);
        match tokio::time::timeout(self.config.generation_timeout, generation).await {
            Err(_elapsed) => {
                warn!("game generation exceeded its time budget");
                Ok(self.fail(
                    "Game generation took too long - please try again with a simpler design",
                ))
            }
            Ok(Err(e)) => Ok(self.fail(e)),
            Ok(Ok(game)) => {
                self.state.generated_code = Some(game.code);
                self.state.generated_html = Some(game.html);
                self.state.phase = Phase::Complete;
                self.state.current_message = Some("Your game is ready to play!".to_string());
                Ok(self.state.clone())
            }
        }
    }

    async fn spice_it_up_inner(
        &mut self,
        feedback: &str,
    ) -> Result<SessionState, OrchestratorError> {
        let current = self.effective_design();

        let revision = match self
            .game_designer
            .spice_it_up(&current, feedback, &Conversation::new())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                // Non-fatal: the existing game stays playable.
                self.state.error = Some(e.to_string());
                return Ok(self.state.clone());
            }
        };

        let design = match extract_document::<GameDesign>(&revision.output, "revised game design")
        {
            Some(design) => {
                self.state.game_design = Some(design.clone());
                design
            }
            // Parse failure falls back to the unrevised design.
            None => current,
        };

        let previous_code = self.state.generated_code.clone().unwrap_or_default();
        match self
            .code_generator
            .regenerate_with_feedback(&design, feedback, &previous_code)
            .await
        {
            Ok(game) => {
                self.state.generated_code = Some(game.code);
                self.state.generated_html = Some(game.html);
                self.state.current_message = Some("Your updated game is ready!".to_string());
                self.state.error = None;
                Ok(self.state.clone())
            }
            Err(e) => {
                self.state.error = Some(e.to_string());
                Ok(self.state.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_predicate_boundary() {
        assert!(!discussion_complete(9));
        assert!(discussion_complete(10));
        assert!(discussion_complete(11));
    }

    #[test]
    fn test_new_session_state() {
        let state = SessionState::new();
        assert_eq!(state.phase, Phase::BookCapture);
        assert!(state.conversation.is_empty());
        assert!(!state.awaiting_user_input);
        assert!(state.error.is_none());
        assert!(state.book_analysis.is_none());
    }

    #[test]
    fn test_phase_wire_names() {
        assert_eq!(
            serde_json::to_value(Phase::BookDiscussion).unwrap(),
            serde_json::json!("book-discussion")
        );
        assert_eq!(
            serde_json::to_value(Phase::CodeGeneration).unwrap(),
            serde_json::json!("code-generation")
        );
    }

    #[test]
    fn test_default_config_timeout() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.generation_timeout, GENERATION_TIMEOUT);
        assert!(config.fallback_analysis.is_none());
    }
}
