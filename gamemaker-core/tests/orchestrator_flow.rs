//! End-to-end tests for the game-creation flow using scripted agents.
//!
//! These run the real orchestrator, agents, parsing, and validation; only
//! the LLM provider is replaced with scripted responses.

use gamemaker_core::orchestrator::{OrchestratorConfig, Phase};
use gamemaker_core::schema::GameType;
use gamemaker_core::testing::{
    analysis_reply, assert_awaiting_input, assert_no_error, assert_phase, design_reply,
    TestHarness, PLAYABLE_CODE,
};
use gamemaker_core::{AgentKind, ChatRole, OrchestratorError};
use std::time::Duration;

/// Queue a full book-discussion script: greeting, four follow-ups, one
/// discarded follow-up, and the finalize reply.
fn script_discussion(harness: &TestHarness, finalize: &str) {
    harness
        .analyst
        .expect_text("Wow, Dragons Love Tacos! What was the book about?");
    for i in 0..5 {
        harness
            .analyst
            .expect_text(format!("That's so cool! Tell me more ({i})"));
    }
    harness.analyst.expect_text(finalize);
}

/// Queue a full design-phase script: greeting, four follow-ups, one
/// discarded follow-up, and the finalize reply.
fn script_design(harness: &TestHarness, finalize: &str) {
    harness
        .designer
        .expect_text("Let's make a game! Platformer, top-down, or dodger?");
    for i in 0..5 {
        harness
            .designer
            .expect_text(format!("Great choice! What should we collect? ({i})"));
    }
    harness.designer.expect_text(finalize);
}

fn fenced(code: &str) -> String {
    format!("```javascript\n{code}\n```")
}

/// Drive the discussion phase to completion (five user turns).
async fn run_discussion(harness: &mut TestHarness) {
    for i in 0..5 {
        harness
            .orchestrator
            .process_book_discussion_response(&format!("I loved part {i}!"))
            .await
            .expect("discussion turn should not hit a caller guard");
    }
}

/// Drive the design phase to completion (five user turns).
async fn run_design(harness: &mut TestHarness) {
    for i in 0..5 {
        harness
            .orchestrator
            .process_game_design_response(&format!("Let's add idea {i}!"))
            .await
            .expect("design turn should not hit a caller guard");
    }
}

#[tokio::test]
async fn test_start_book_discussion_greets_with_identified_title() {
    let mut harness = TestHarness::new();
    harness
        .analyst
        .expect_text("Wow, Dragons Love Tacos! What was the book about?");

    let state = harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();

    assert_phase(&state, Phase::BookDiscussion);
    assert_awaiting_input(&state);
    assert_no_error(&state);
    assert!(state.book_image_uri.is_some());

    // History is non-empty and ends in an agent turn.
    let last = state.conversation.last().unwrap();
    assert_eq!(last.role, ChatRole::Agent);
    assert_eq!(last.agent, Some(AgentKind::StoryAnalyst));
    assert!(last.content.contains("Dragons Love Tacos"));
}

#[tokio::test]
async fn test_discussion_not_complete_after_four_rounds() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();

    for i in 0..4 {
        let state = harness
            .orchestrator
            .process_book_discussion_response(&format!("round {i}"))
            .await
            .unwrap();
        assert_phase(&state, Phase::BookDiscussion);
        assert_awaiting_input(&state);
    }

    // Nine entries so far: one greeting plus four user/agent pairs.
    assert_eq!(harness.orchestrator.state().conversation.len(), 9);
    assert!(!harness.orchestrator.should_complete_book_discussion());
}

#[tokio::test]
async fn test_fifth_round_completes_discussion_and_starts_design() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    harness
        .designer
        .expect_text("Dragons Love Tacos would make a great platformer!");

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;

    let state = harness.orchestrator.state();
    assert_phase(state, Phase::GameDesign);
    assert_no_error(state);

    // The analysis was parsed out of the finalize reply.
    let analysis = state.book_analysis.as_ref().expect("analysis parsed");
    assert_eq!(analysis.book.title, "Dragons Love Tacos");

    // Fresh conversation holding only the designer's greeting.
    assert_eq!(state.conversation.len(), 1);
    let greeting = state.conversation.last().unwrap();
    assert_eq!(greeting.agent, Some(AgentKind::GameDesigner));
    assert!(state.awaiting_user_input);
}

#[tokio::test]
async fn test_unparseable_analysis_still_reaches_design_phase() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, "I had trouble writing that up, sorry!");
    harness.designer.expect_text("Let's design something fun!");

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;

    let state = harness.orchestrator.state();
    // The document stays unset; the flow proceeds on the fallback.
    assert!(state.book_analysis.is_none());
    assert_phase(state, Phase::GameDesign);
    assert!(state.awaiting_user_input);
    assert_no_error(state);
}

#[tokio::test]
async fn test_full_flow_generates_playable_game() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    script_design(&harness, &design_reply("Taco Dash", GameType::TopDown));
    harness.generator.expect_text(fenced(PLAYABLE_CODE));

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;
    run_design(&mut harness).await;

    let state = harness.orchestrator.state();
    assert_phase(state, Phase::Complete);
    assert_no_error(state);
    assert_eq!(
        state.game_design.as_ref().unwrap().game_type,
        GameType::TopDown
    );

    // Fences stripped, HTML assembled around the code.
    let code = state.generated_code.as_ref().unwrap();
    assert!(!code.contains("```"));
    let html = state.generated_html.as_ref().unwrap();
    assert!(html.contains("phaser.min.js"));
    assert!(html.contains("function update()"));
    assert!(state
        .current_message
        .as_ref()
        .unwrap()
        .contains("ready to play"));
}

#[tokio::test]
async fn test_unparseable_design_generates_from_fallback() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    script_design(&harness, "No JSON from me today!");
    harness.generator.expect_text(PLAYABLE_CODE);

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;
    run_design(&mut harness).await;

    let state = harness.orchestrator.state();
    assert!(state.game_design.is_none());
    assert_phase(state, Phase::Complete);
    assert!(state.generated_html.is_some());
}

#[tokio::test]
async fn test_provider_failure_halts_session() {
    let mut harness = TestHarness::new();
    harness.analyst.expect_text("Hi! What book is this?");
    harness.analyst.expect_failure("connection reset by peer");

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();

    let state = harness
        .orchestrator
        .process_book_discussion_response("hello?")
        .await
        .unwrap();

    assert_phase(&state, Phase::Error);
    assert!(state.error.is_some());
    assert!(!state.awaiting_user_input);

    // The error phase is terminal until reset.
    let result = harness
        .orchestrator
        .process_book_discussion_response("retry?")
        .await;
    assert!(matches!(result, Err(OrchestratorError::Halted)));

    harness.orchestrator.reset();
    assert_phase(harness.orchestrator.state(), Phase::BookCapture);
}

#[tokio::test]
async fn test_syntax_invalid_code_fails_generation() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    script_design(&harness, &design_reply("Taco Dash", GameType::Platformer));
    // Unbalanced brace: fatal, generation must not produce a document.
    harness
        .generator
        .expect_text("function create() { if (broken) {");

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;
    run_design(&mut harness).await;

    let state = harness.orchestrator.state();
    assert_phase(state, Phase::Error);
    assert!(state.error.as_ref().unwrap().contains("validation"));
    assert!(state.generated_code.is_none());
    assert!(state.generated_html.is_none());
}

#[tokio::test]
async fn test_generation_timeout_aborts_with_retry_message() {
    let mut harness = TestHarness::new();
    harness.orchestrator = harness.orchestrator.with_config(
        OrchestratorConfig::default().with_generation_timeout(Duration::from_millis(20)),
    );
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    script_design(&harness, &design_reply("Taco Dash", GameType::Platformer));
    harness.generator.expect_text(PLAYABLE_CODE);
    harness.generator.set_delay(Duration::from_millis(500));

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;
    run_design(&mut harness).await;

    let state = harness.orchestrator.state();
    assert_phase(state, Phase::Error);
    assert!(state.error.as_ref().unwrap().contains("simpler design"));
}

#[tokio::test]
async fn test_spice_it_up_updates_design_and_code() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    script_design(&harness, &design_reply("Taco Dash", GameType::Platformer));
    harness.generator.expect_text(PLAYABLE_CODE);

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;
    run_design(&mut harness).await;
    assert_phase(harness.orchestrator.state(), Phase::Complete);

    // Revision round.
    harness
        .designer
        .expect_text(design_reply("Super Taco Dash", GameType::Platformer));
    let updated_code = format!("{PLAYABLE_CODE}\n// now with lasers\n");
    harness.generator.expect_text(updated_code.clone());

    let state = harness
        .orchestrator
        .spice_it_up("add lasers!")
        .await
        .unwrap();

    assert_phase(&state, Phase::Complete);
    assert_no_error(&state);
    assert_eq!(
        state.game_design.as_ref().unwrap().game_title,
        "Super Taco Dash"
    );
    assert!(state.generated_code.as_ref().unwrap().contains("lasers"));
    assert!(state
        .current_message
        .as_ref()
        .unwrap()
        .contains("updated game"));
}

#[tokio::test]
async fn test_spice_it_up_failure_keeps_previous_game() {
    let mut harness = TestHarness::new();
    script_discussion(&harness, &analysis_reply("Dragons Love Tacos"));
    script_design(&harness, &design_reply("Taco Dash", GameType::Platformer));
    harness.generator.expect_text(PLAYABLE_CODE);

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();
    run_discussion(&mut harness).await;
    run_design(&mut harness).await;

    let before_code = harness.orchestrator.state().generated_code.clone();
    let before_html = harness.orchestrator.state().generated_html.clone();

    // The designer call fails outright.
    harness.designer.expect_failure("rate limited");
    let state = harness
        .orchestrator
        .spice_it_up("make it harder")
        .await
        .unwrap();

    assert_phase(&state, Phase::Complete);
    assert!(state.error.is_some());
    assert_eq!(state.generated_code, before_code);
    assert_eq!(state.generated_html, before_html);

    // A failing regeneration also leaves the game untouched.
    harness
        .designer
        .expect_text(design_reply("Taco Dash 2", GameType::Platformer));
    harness.generator.expect_failure("timeout");
    let state = harness
        .orchestrator
        .spice_it_up("more tacos")
        .await
        .unwrap();

    assert_phase(&state, Phase::Complete);
    assert!(state.error.is_some());
    assert_eq!(state.generated_code, before_code);
    assert_eq!(state.generated_html, before_html);
}

#[tokio::test]
async fn test_phase_guards_reject_out_of_order_calls() {
    let mut harness = TestHarness::new();

    // No discussion has started yet.
    let result = harness
        .orchestrator
        .process_book_discussion_response("hi")
        .await;
    assert!(matches!(result, Err(OrchestratorError::WrongPhase(_))));

    let result = harness.orchestrator.process_game_design_response("hi").await;
    assert!(matches!(result, Err(OrchestratorError::WrongPhase(_))));

    // Nothing generated yet, so nothing to revise.
    let result = harness.orchestrator.spice_it_up("more!").await;
    assert!(matches!(result, Err(OrchestratorError::NothingToRevise)));

    // Direct phase entry without its prerequisite document is reported.
    let result = harness.orchestrator.start_game_design().await;
    assert!(matches!(result, Err(OrchestratorError::MissingAnalysis)));
    let result = harness.orchestrator.start_code_generation().await;
    assert!(matches!(result, Err(OrchestratorError::MissingDesign)));
}

#[tokio::test]
async fn test_start_book_discussion_twice_is_rejected() {
    let mut harness = TestHarness::new();
    harness.analyst.expect_text("Hello!");

    harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await
        .unwrap();

    let result = harness
        .orchestrator
        .start_book_discussion(TestHarness::book_image())
        .await;
    assert!(matches!(result, Err(OrchestratorError::WrongPhase(_))));
}
