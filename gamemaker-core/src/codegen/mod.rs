//! Phaser game templates and HTML assembly.
//!
//! Each supported game type ships a self-contained base script using only
//! Phaser graphics primitives. The generator customizes a base script and
//! drops it into the shared HTML wrapper at the `{{GAME_CODE}}` marker.

pub mod validate;

use crate::schema::GameType;

const PLATFORMER: &str = include_str!("templates/platformer.js");
const TOP_DOWN: &str = include_str!("templates/top_down.js");
const OBSTACLE_AVOIDER: &str = include_str!("templates/obstacle_avoider.js");
const WRAPPER: &str = include_str!("templates/wrapper.html");

const CODE_MARKER: &str = "{{GAME_CODE}}";

/// A base game template.
#[derive(Debug, Clone, Copy)]
pub struct GameTemplate {
    pub game_type: GameType,
    pub description: &'static str,
    pub base_code: &'static str,
}

/// Look up the template for a game type.
///
/// `Custom` designs build on the platformer base, which is the most
/// forgiving starting point for freeform mechanics.
pub fn template_for(game_type: GameType) -> GameTemplate {
    match game_type {
        GameType::Platformer | GameType::Custom => GameTemplate {
            game_type: GameType::Platformer,
            description: "Side-scrolling platformer with jumping and collecting",
            base_code: PLATFORMER,
        },
        GameType::TopDown => GameTemplate {
            game_type: GameType::TopDown,
            description: "Top-down view collection game",
            base_code: TOP_DOWN,
        },
        GameType::ObstacleAvoider => GameTemplate {
            game_type: GameType::ObstacleAvoider,
            description: "Dodge incoming obstacles",
            base_code: OBSTACLE_AVOIDER,
        },
    }
}

/// Wrap game code in the self-contained HTML document a WebView can load.
pub fn assemble_html(code: &str) -> String {
    WRAPPER.replace(CODE_MARKER, code)
}

/// Strip markdown code fences the model sometimes wraps its output in.
pub fn strip_code_fences(output: &str) -> String {
    output
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("```")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::validate::validate_code;

    #[test]
    fn test_every_template_passes_validation() {
        for game_type in [
            GameType::Platformer,
            GameType::TopDown,
            GameType::ObstacleAvoider,
            GameType::Custom,
        ] {
            let template = template_for(game_type);
            let result = validate_code(template.base_code);
            assert!(result.is_valid, "{game_type} template failed validation");
            assert!(
                result.warnings.is_empty(),
                "{game_type} template has warnings: {:?}",
                result.warnings
            );
        }
    }

    #[test]
    fn test_custom_falls_back_to_platformer() {
        let template = template_for(GameType::Custom);
        assert_eq!(template.game_type, GameType::Platformer);
    }

    #[test]
    fn test_assemble_html_substitutes_code() {
        let html = assemble_html("const game = 1;");
        assert!(html.contains("const game = 1;"));
        assert!(!html.contains(CODE_MARKER));
        assert!(html.contains("phaser.min.js"));
    }

    #[test]
    fn test_strip_code_fences() {
        let fenced = "```javascript\nconst a = 1;\n```";
        assert_eq!(strip_code_fences(fenced), "const a = 1;");

        let bare = "const a = 1;";
        assert_eq!(strip_code_fences(bare), "const a = 1;");
    }
}
