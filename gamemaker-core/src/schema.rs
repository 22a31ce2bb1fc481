//! Structured documents exchanged between agent phases.
//!
//! The Story Analyst produces a [`BookAnalysis`]; the Game Designer consumes
//! it and produces a [`GameDesign`]; the Code Generator consumes that. Both
//! documents travel as JSON embedded in agent text, so deserialization is
//! deliberately lenient: every collection defaults to empty and unknown
//! fields are ignored, letting a partially-complete document still parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identification of the photographed book.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    /// Opaque reference to the captured cover image.
    pub cover_image_uri: String,
    pub identified_at: Option<DateTime<Utc>>,
}

/// A character from the story.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryCharacter {
    pub name: String,
    pub description: String,
    /// Role in the story (protagonist, antagonist, helper, ...).
    pub role: String,
    pub traits: Vec<String>,
}

/// What kind of game element a story element maps to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    #[default]
    Collectible,
    Obstacle,
    PowerUp,
    Enemy,
    Goal,
}

/// A story element with game potential.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub name: String,
    pub description: String,
    /// How this connects back to the book's narrative.
    pub story_connection: String,
}

/// The Story Analyst's final output: everything the Game Designer needs
/// to know about the book and the conversation around it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BookAnalysis {
    pub book: BookInfo,
    pub plot_summary: String,
    pub themes: Vec<String>,
    pub characters: Vec<StoryCharacter>,
    pub key_moments: Vec<String>,
    pub game_elements: Vec<GameElement>,
    /// Notes from the conversation with the child.
    pub discussion_notes: Vec<String>,
}

impl BookAnalysis {
    /// A generic analysis used when the agent's output could not be parsed.
    ///
    /// Keeps the flow alive with something the Game Designer can work with.
    pub fn fallback() -> Self {
        Self {
            book: BookInfo {
                title: "A Wonderful Story".to_string(),
                author: "Unknown".to_string(),
                ..BookInfo::default()
            },
            plot_summary: "A brave hero goes on an adventure, makes friends, and saves the day."
                .to_string(),
            themes: vec!["friendship".to_string(), "adventure".to_string()],
            characters: vec![StoryCharacter {
                name: "The Hero".to_string(),
                description: "A brave and kind main character".to_string(),
                role: "protagonist".to_string(),
                traits: vec!["brave".to_string(), "kind".to_string()],
            }],
            key_moments: vec!["The hero sets out on a big adventure".to_string()],
            game_elements: vec![
                GameElement {
                    kind: ElementKind::Collectible,
                    name: "Stars".to_string(),
                    description: "Shiny stars to gather along the way".to_string(),
                    story_connection: "Treasures from the story".to_string(),
                },
                GameElement {
                    kind: ElementKind::Obstacle,
                    name: "Puddles".to_string(),
                    description: "Slippery puddles to jump over".to_string(),
                    story_connection: "Challenges the hero faces".to_string(),
                },
            ],
            discussion_notes: Vec::new(),
        }
    }
}

/// The kind of 90s arcade game to generate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GameType {
    #[default]
    Platformer,
    TopDown,
    ObstacleAvoider,
    Custom,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Platformer => "platformer",
            GameType::TopDown => "top-down",
            GameType::ObstacleAvoider => "obstacle-avoider",
            GameType::Custom => "custom",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A core game mechanic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameMechanic {
    pub name: String,
    pub description: String,
    /// Technical hint for implementation in Phaser.js.
    pub implementation: String,
}

/// A character's role inside the game.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CharacterRole {
    #[default]
    Player,
    Enemy,
    Npc,
}

/// A character as it appears in the game.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameCharacter {
    pub name: String,
    pub role: CharacterRole,
    pub abilities: Vec<String>,
    /// Visual description for sprite creation.
    pub appearance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Collectible {
    pub name: String,
    pub points: i64,
    pub appearance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Obstacle {
    pub name: String,
    /// How it moves or behaves.
    pub behavior: String,
    pub appearance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerUp {
    pub name: String,
    pub effect: String,
    /// Duration in seconds, if temporary.
    pub duration: Option<f64>,
    pub appearance: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelDesign {
    pub layout: String,
    pub difficulty: Difficulty,
    /// Estimated time to complete (e.g. "3-5 minutes").
    pub estimated_duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualStyle {
    /// Main colors to use (hex codes or names).
    pub color_scheme: Vec<String>,
    pub art_style: String,
    pub animations: Vec<String>,
}

/// The Game Designer's final output: a complete design document for the
/// Code Generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDesign {
    pub game_title: String,
    pub game_type: GameType,
    pub objective: String,
    pub mechanics: Vec<GameMechanic>,
    pub characters: Vec<GameCharacter>,
    pub collectibles: Vec<Collectible>,
    pub obstacles: Vec<Obstacle>,
    pub power_ups: Vec<PowerUp>,
    pub level_design: LevelDesign,
    pub visual_style: VisualStyle,
    pub design_notes: Vec<String>,
}

impl GameDesign {
    /// A generic platformer design used when the agent's output could not
    /// be parsed.
    pub fn fallback() -> Self {
        Self {
            game_title: "Storybook Dash".to_string(),
            game_type: GameType::Platformer,
            objective: "Collect all the stars and reach the end of the level!".to_string(),
            mechanics: vec![
                GameMechanic {
                    name: "Jump".to_string(),
                    description: "Press up to jump between platforms".to_string(),
                    implementation: "setVelocityY on cursor up while touching ground".to_string(),
                },
                GameMechanic {
                    name: "Collect".to_string(),
                    description: "Touch stars to collect them for points".to_string(),
                    implementation: "physics overlap between player and collectibles".to_string(),
                },
            ],
            characters: vec![GameCharacter {
                name: "The Hero".to_string(),
                role: CharacterRole::Player,
                abilities: vec!["run".to_string(), "jump".to_string()],
                appearance: "a small red square".to_string(),
            }],
            collectibles: vec![Collectible {
                name: "Star".to_string(),
                points: 10,
                appearance: "a yellow square".to_string(),
            }],
            obstacles: vec![Obstacle {
                name: "Puddle".to_string(),
                behavior: "sits still and blocks the path".to_string(),
                appearance: "a blue rectangle".to_string(),
            }],
            power_ups: Vec::new(),
            level_design: LevelDesign {
                layout: "A handful of floating platforms over solid ground".to_string(),
                difficulty: Difficulty::Easy,
                estimated_duration: "2-3 minutes".to_string(),
            },
            visual_style: VisualStyle {
                color_scheme: vec!["#87CEEB".to_string(), "#ff0000".to_string(), "#ffff00".to_string()],
                art_style: "simple colorful shapes".to_string(),
                animations: vec!["bounce".to_string()],
            },
            design_notes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_analysis_round_trip() {
        let analysis = BookAnalysis::fallback();
        let json = serde_json::to_string(&analysis).unwrap();
        let parsed: BookAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, analysis);
    }

    #[test]
    fn test_book_analysis_camel_case_wire_names() {
        let json = serde_json::to_value(BookAnalysis::fallback()).unwrap();
        assert!(json.get("plotSummary").is_some());
        assert!(json.get("gameElements").is_some());
        assert!(json.get("discussionNotes").is_some());
    }

    #[test]
    fn test_partial_document_still_parses() {
        let parsed: BookAnalysis = serde_json::from_str(
            r#"{"book": {"title": "Dragons Love Tacos", "author": "Adam Rubin"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.book.title, "Dragons Love Tacos");
        assert!(parsed.themes.is_empty());
        assert!(parsed.characters.is_empty());
    }

    #[test]
    fn test_game_type_wire_names() {
        assert_eq!(
            serde_json::to_value(GameType::ObstacleAvoider).unwrap(),
            serde_json::json!("obstacle-avoider")
        );
        let parsed: GameType = serde_json::from_str("\"top-down\"").unwrap();
        assert_eq!(parsed, GameType::TopDown);
    }

    #[test]
    fn test_game_design_partial_parse() {
        let parsed: GameDesign = serde_json::from_str(
            r#"{"gameTitle": "Taco Run", "gameType": "platformer", "objective": "eat tacos"}"#,
        )
        .unwrap();
        assert_eq!(parsed.game_title, "Taco Run");
        assert_eq!(parsed.game_type, GameType::Platformer);
        assert!(parsed.mechanics.is_empty());
    }

    #[test]
    fn test_element_kind_wire_names() {
        let parsed: ElementKind = serde_json::from_str("\"power-up\"").unwrap();
        assert_eq!(parsed, ElementKind::PowerUp);
    }
}
