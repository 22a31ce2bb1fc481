//! The Code Generator agent.
//!
//! Turns a [`GameDesign`] into a complete Phaser game: picks the base
//! template for the design's game type, asks the model to customize it,
//! validates the result, and assembles the playable HTML document.

use super::tools::{code_generator_tools, handle_code_generator_tool};
use super::{Agent, AgentConfig, AgentError, AgentReply, LlmProvider};
use crate::codegen::{self, validate::validate_code, validate::Validation};
use crate::history::Conversation;
use crate::schema::{GameDesign, GameType};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors from game generation.
#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("generated code failed validation: {}", errors.join("; "))]
    InvalidCode { errors: Vec<String> },
}

/// A generated, playable game.
#[derive(Debug, Clone)]
pub struct GeneratedGame {
    /// The customized game script.
    pub code: String,
    /// The complete self-contained HTML document.
    pub html: String,
    /// Which base template was used.
    pub template: GameType,
    /// Non-fatal validation warnings, if any markers were missing.
    pub warnings: Vec<String>,
}

/// Phaser.js game developer: generates and revises game code.
pub struct CodeGenerator {
    agent: Agent,
}

impl CodeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(
            provider,
            // Balanced for creative but functional code; more tokens for
            // full game scripts.
            AgentConfig::new("Code Generator")
                .with_temperature(0.5)
                .with_max_tokens(8192),
        )
    }

    pub fn with_config(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let agent = Agent::new(
            provider,
            config,
            include_str!("prompts/code_generator.txt"),
            code_generator_tools(),
            Box::new(handle_code_generator_tool),
        );
        Self { agent }
    }

    /// Generate a complete game from the design.
    pub async fn generate_game(&self, design: &GameDesign) -> Result<GeneratedGame, CodeGenError> {
        let template = codegen::template_for(design.game_type);
        let design_json = serde_json::to_string_pretty(design).unwrap_or_else(|_| "{}".to_string());
        let style_json =
            serde_json::to_string(&design.visual_style).unwrap_or_else(|_| "{}".to_string());

        let input = format!(
            "Generate a complete Phaser.js game based on this design:\n\n\
             {design_json}\n\n\
             Requirements:\n\
             1. Use the {game_type} template as a foundation:\n\
             ```javascript\n{base_code}\n```\n\
             2. Customize it with all the specified mechanics, characters, \
             collectibles, and obstacles\n\
             3. Use the visual style specified: {style_json}\n\
             4. Implement the objective: {objective}\n\
             5. Include unlimited lives (no game over from losing lives)\n\
             6. Add a \"Play Again\" button that reloads the game\n\
             7. Make it colorful and fun!\n\n\
             Technical notes:\n\
             - Use setTint() for colors and setDisplaySize() for sizing\n\
             - No image loading; shapes only\n\
             - Keep it simple but polished\n\
             - Ensure all code is syntactically correct\n\n\
             Return ONLY the complete JavaScript game code (no markdown, no \
             explanations). The code will be inserted into the HTML template.",
            game_type = design.game_type,
            base_code = template.base_code,
            objective = design.objective,
        );

        let reply = self.agent.invoke(&input, &Conversation::new()).await?;
        self.assemble(reply, template.game_type)
    }

    /// Produce a revised game incorporating feedback, preserving the rest.
    pub async fn regenerate_with_feedback(
        &self,
        original_design: &GameDesign,
        feedback: &str,
        previous_code: &str,
    ) -> Result<GeneratedGame, CodeGenError> {
        let design_json =
            serde_json::to_string(original_design).unwrap_or_else(|_| "{}".to_string());

        let input = format!(
            "Original game design: {design_json}\n\n\
             Previous generated code:\n{previous_code}\n\n\
             User feedback: \"{feedback}\"\n\n\
             Please modify the game code to incorporate this feedback.\n\
             Only change the relevant parts, keep everything else working.\n\
             Return ONLY the complete updated JavaScript code."
        );

        let reply = self.agent.invoke(&input, &Conversation::new()).await?;
        self.assemble(reply, original_design.game_type)
    }

    /// Validate a game script: fatal errors fail generation; missing
    /// structural markers are reported as warnings.
    pub fn validate(&self, code: &str) -> Validation {
        validate_code(code)
    }

    fn assemble(&self, reply: AgentReply, template: GameType) -> Result<GeneratedGame, CodeGenError> {
        let code = codegen::strip_code_fences(&reply.output);

        let validation = validate_code(&code);
        if !validation.is_valid {
            return Err(CodeGenError::InvalidCode {
                errors: validation.errors,
            });
        }
        if !validation.warnings.is_empty() {
            warn!(warnings = ?validation.warnings, "generated code is missing structural markers");
        }

        let html = codegen::assemble_html(&code);

        Ok(GeneratedGame {
            code,
            html,
            template,
            warnings: validation.warnings,
        })
    }
}
