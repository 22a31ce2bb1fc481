//! Book-to-game creation engine with AI agents.
//!
//! This crate provides:
//! - A three-agent pipeline (Story Analyst, Game Designer, Code Generator)
//!   that turns a photographed book cover into a playable Phaser game
//! - The orchestrator state machine that sequences the pipeline
//! - Phaser game templates, code validation, and HTML assembly
//! - A saved-game library
//!
//! # Quick Start
//!
//! ```ignore
//! use gamemaker_core::{BookImage, GameCreationOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut orchestrator = GameCreationOrchestrator::from_env()?;
//!
//!     let state = orchestrator
//!         .start_book_discussion(BookImage::from_path("cover.jpg"))
//!         .await?;
//!     println!("{}", state.current_message.unwrap_or_default());
//!
//!     let state = orchestrator
//!         .process_book_discussion_response("It was about dragons!")
//!         .await?;
//!     println!("{}", state.current_message.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod codegen;
pub mod extract;
pub mod history;
pub mod library;
pub mod orchestrator;
pub mod schema;
pub mod testing;

// Re-export for convenience
pub use gamemaker_macros::Tool;

// Primary public API
pub use agent::{
    Agent, AgentConfig, AgentError, AgentReply, BookImage, CodeGenError, CodeGenerator,
    GameDesigner, GeneratedGame, LlmProvider, StoryAnalyst,
};
pub use history::{AgentKind, ChatMessage, ChatRole, Conversation};
pub use library::{GameLibrary, LibraryError, SavedGame};
pub use orchestrator::{
    GameCreationOrchestrator, OrchestratorConfig, OrchestratorError, Phase, SessionState,
};
pub use schema::{BookAnalysis, GameDesign, GameType};
