//! Interactive game-creation session from the terminal.
//!
//! Usage: `cargo run -p gamemaker-core --example create_game -- cover.jpg`
//!
//! Requires ANTHROPIC_API_KEY (a .env file works). Talks through the book
//! discussion and design phases on stdin, then writes the generated game
//! to `game.html`.

use gamemaker_core::orchestrator::Phase;
use gamemaker_core::{BookImage, GameCreationOrchestrator};
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamemaker_core=info".into()),
        )
        .init();

    let image_path = std::env::args()
        .nth(1)
        .ok_or("usage: create_game <cover-image>")?;

    let mut orchestrator = GameCreationOrchestrator::from_env()?;

    println!("=== The Game Maker ===\n");
    println!("Looking at your book cover...\n");

    let mut state = orchestrator
        .start_book_discussion(BookImage::from_path(&image_path))
        .await?;

    let stdin = io::stdin();
    loop {
        if let Some(ref message) = state.current_message {
            println!("\n[{}]\n{message}", agent_label(&state));
        }

        match state.phase {
            Phase::BookDiscussion | Phase::GameDesign if state.awaiting_user_input => {
                print!("\n> ");
                io::stdout().flush()?;
                let mut line = String::new();
                stdin.lock().read_line(&mut line)?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                state = match state.phase {
                    Phase::BookDiscussion => {
                        orchestrator.process_book_discussion_response(line).await?
                    }
                    _ => orchestrator.process_game_design_response(line).await?,
                };
            }
            Phase::Complete => {
                let html = state.generated_html.clone().unwrap_or_default();
                tokio::fs::write("game.html", &html).await?;
                println!("\nSaved your game to game.html - open it in a browser to play!");
                return Ok(());
            }
            Phase::Error => {
                println!(
                    "\nSomething went wrong: {}",
                    state.error.as_deref().unwrap_or("unknown error")
                );
                return Ok(());
            }
            phase => {
                // Transitions run to completion inside the calls above, so
                // any other phase here means the flow is wedged.
                println!("\nUnexpected phase {phase:?}; exiting.");
                return Ok(());
            }
        }
    }
}

fn agent_label(state: &gamemaker_core::SessionState) -> &'static str {
    state
        .conversation
        .last()
        .and_then(|m| m.agent)
        .map(|a| a.display_name())
        .unwrap_or("Game Maker")
}
