//! The Game Designer agent.
//!
//! Turns a [`BookAnalysis`] into a collaborative design conversation and
//! produces the final [`GameDesign`] document as embedded JSON.

use super::tools::{game_designer_tools, handle_game_designer_tool};
use super::{Agent, AgentConfig, AgentError, AgentReply, LlmProvider};
use crate::history::Conversation;
use crate::schema::{BookAnalysis, GameDesign};
use std::sync::Arc;

/// Creative game design expert for 90s arcade-style games.
pub struct GameDesigner {
    agent: Agent,
}

impl GameDesigner {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(
            provider,
            // High creativity for game design.
            AgentConfig::new("Game Designer").with_temperature(0.9),
        )
    }

    pub fn with_config(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let agent = Agent::new(
            provider,
            config,
            include_str!("prompts/game_designer.txt"),
            game_designer_tools(),
            Box::new(handle_game_designer_tool),
        );
        Self { agent }
    }

    /// Open the design phase: propose 2-3 game types for this book.
    pub async fn start_design(
        &self,
        analysis: &BookAnalysis,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let characters: Vec<&str> = analysis
            .characters
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        let elements: Vec<&str> = analysis
            .game_elements
            .iter()
            .map(|e| e.name.as_str())
            .collect();

        let input = format!(
            "I have a book analysis to work with:\n\n\
             Title: {title}\n\
             Author: {author}\n\
             Plot: {plot}\n\
             Themes: {themes}\n\
             Characters: {characters}\n\
             Game Elements: {elements}\n\n\
             Please:\n\
             1. Analyze the story elements for game potential\n\
             2. Suggest 2-3 game types that would fit this book\n\
             3. Ask the child which type sounds most fun to them\n\
             4. Prepare to collaborate on the detailed design\n\n\
             Present the options in an exciting, kid-friendly way!",
            title = analysis.book.title,
            author = analysis.book.author,
            plot = analysis.plot_summary,
            themes = analysis.themes.join(", "),
            characters = characters.join(", "),
            elements = elements.join(", "),
        );

        self.agent.invoke(&input, history).await
    }

    /// Iterate on the design conversationally.
    pub async fn continue_design(
        &self,
        child_response: &str,
        context: &str,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let input = format!(
            "The child responded: \"{child_response}\"\n\n\
             Context: {context}\n\n\
             Please:\n\
             1. Acknowledge their choice enthusiastically\n\
             2. Ask about specific game elements they want (what to collect, what \
             obstacles, special powers)\n\
             3. Suggest creative ideas that align with the book's story\n\
             4. Build the game design collaboratively\n\n\
             Keep it fun and make them feel like the lead designer!"
        );

        self.agent.invoke(&input, history).await
    }

    /// Propose a revised design incorporating free-text feedback.
    pub async fn spice_it_up(
        &self,
        current_design: &GameDesign,
        feedback: &str,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let design_json =
            serde_json::to_string(current_design).unwrap_or_else(|_| "{}".to_string());

        let input = format!(
            "Current game design: {design_json}\n\n\
             Child's feedback: \"{feedback}\"\n\n\
             Please:\n\
             1. Understand what they want to change or enhance\n\
             2. Suggest creative improvements that keep the game simple to generate\n\
             3. Update only the relevant parts of the design\n\
             4. Make the changes exciting!\n\n\
             Return the complete updated design as a single JSON object with the \
             same camelCase structure as the input."
        );

        self.agent.invoke(&input, history).await
    }

    /// Produce the final structured design for the Code Generator.
    pub async fn finalize_design(
        &self,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let input = "\
Based on our design conversation, create a complete game design document.

The design must include:
1. Game title (based on the book)
2. Game type (platformer, top-down, or obstacle-avoider)
3. Main objective
4. Core mechanics (how the game plays)
5. Characters (player, enemies, NPCs)
6. Collectibles (items to gather)
7. Obstacles (things to avoid)
8. Power-ups (special abilities)
9. Level design (layout and difficulty)
10. Visual style (colors, art style, animations)

Format as a single JSON object with camelCase keys: gameTitle, gameType, \
objective, mechanics [{name, description, implementation}], characters \
[{name, role, abilities, appearance}], collectibles [{name, points, \
appearance}], obstacles [{name, behavior, appearance}], powerUps [{name, \
effect, appearance}], levelDesign {layout, difficulty, estimatedDuration}, \
visualStyle {colorScheme, artStyle, animations}, and designNotes.
Ensure everything is feasible for a simple Phaser.js game.";

        self.agent.invoke(input, history).await
    }
}
