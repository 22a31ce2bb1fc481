//! Integration tests that call the real Claude API.
//!
//! These tests require ANTHROPIC_API_KEY to be set (via .env file or
//! environment). Run with:
//! `cargo test -p gamemaker-core --test api_integration -- --ignored`
//!
//! These are marked #[ignore] by default to avoid:
//! - API costs in CI
//! - Test failures when no API key is available
//! - Slow test runs (API calls take seconds)

use gamemaker_core::agent::{CodeGenerator, GameDesigner, LlmProvider};
use gamemaker_core::history::Conversation;
use gamemaker_core::schema::{BookAnalysis, GameDesign};
use gamemaker_core::GameCreationOrchestrator;
use std::sync::Arc;

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

/// Check if API key is available
fn has_api_key() -> bool {
    std::env::var("ANTHROPIC_API_KEY").is_ok()
}

fn provider() -> Arc<dyn LlmProvider> {
    Arc::new(claude::Claude::from_env().expect("ANTHROPIC_API_KEY must be set"))
}

#[tokio::test]
#[ignore]
async fn test_orchestrator_from_env() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let orchestrator = GameCreationOrchestrator::from_env().expect("construction should succeed");
    assert!(orchestrator.state().error.is_none());
}

#[tokio::test]
#[ignore]
async fn test_designer_proposes_game_types() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let designer = GameDesigner::new(provider());
    let analysis = BookAnalysis::fallback();

    let reply = designer
        .start_design(&analysis, &Conversation::new())
        .await
        .expect("start_design should succeed");

    println!("Designer greeting:\n{}", reply.output);
    assert!(!reply.output.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_generate_game_from_fallback_design() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let generator = CodeGenerator::new(provider());
    let design = GameDesign::fallback();

    let game = generator
        .generate_game(&design)
        .await
        .expect("generation should produce valid code");

    println!(
        "Generated {} bytes of code ({} warnings)",
        game.code.len(),
        game.warnings.len()
    );
    assert!(game.html.contains("phaser.min.js"));
    assert!(game.code.contains("function"));
}
