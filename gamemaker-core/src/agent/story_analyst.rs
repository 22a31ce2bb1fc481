//! The Story Analyst agent.
//!
//! Identifies the photographed book with a vision call, holds the book
//! discussion with the child, and produces the final [`BookAnalysis`]
//! document as embedded JSON.

use super::tools::{handle_story_analyst_tool, story_analyst_tools};
use super::{Agent, AgentConfig, AgentError, AgentReply, LlmProvider};
use crate::history::Conversation;
use base64::Engine;
use claude::Message;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A captured book cover image.
///
/// The orchestration core treats this as an opaque reference; the only
/// requirement is that it resolves to image bytes at invocation time.
#[derive(Debug, Clone)]
pub enum BookImage {
    /// A local file to be read and encoded at call time.
    Path(PathBuf),
    /// Already base64-encoded image data.
    Inline { media_type: String, data: String },
}

impl BookImage {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        BookImage::Path(path.as_ref().to_path_buf())
    }

    pub fn inline(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        BookImage::Inline {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// A display reference for session state.
    pub fn uri(&self) -> String {
        match self {
            BookImage::Path(path) => path.display().to_string(),
            BookImage::Inline { media_type, .. } => format!("inline:{media_type}"),
        }
    }

    /// Resolve to `(media_type, base64_data)`.
    async fn encode(&self) -> Result<(String, String), AgentError> {
        match self {
            BookImage::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                let data = base64::engine::general_purpose::STANDARD.encode(bytes);
                Ok((media_type_for(path), data))
            }
            BookImage::Inline { media_type, data } => Ok((media_type.clone(), data.clone())),
        }
    }
}

fn media_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
    .to_string()
}

/// Children's literature expert: identifies the book and runs the
/// discussion phase.
pub struct StoryAnalyst {
    agent: Agent,
}

impl StoryAnalyst {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(
            provider,
            // More creative for conversation.
            AgentConfig::new("Story Analyst").with_temperature(0.8),
        )
    }

    pub fn with_config(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let agent = Agent::new(
            provider,
            config,
            include_str!("prompts/story_analyst.txt"),
            story_analyst_tools(),
            Box::new(handle_story_analyst_tool),
        );
        Self { agent }
    }

    /// Identify the book from its cover and open the discussion.
    pub async fn analyze_book(
        &self,
        image: &BookImage,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let (media_type, data) = image.encode().await?;

        let instruction = "\
I have a photo of a children's book cover.

Please:
1. Identify the book from the cover. Include a JSON object with \"title\", \
\"author\", and \"briefSummary\" fields. If you cannot identify the book with \
certainty, use \"Unknown\" for the title and author.
2. Greet the child warmly, mention the book by name, and ask them what the \
book was about.

Keep the greeting short, excited, and kid-friendly!";

        self.agent
            .invoke_message(
                Message::user_with_image(instruction, media_type, data),
                history,
            )
            .await
    }

    /// Produce a follow-up conversational turn.
    pub async fn process_response(
        &self,
        child_response: &str,
        context: &str,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let input = format!(
            "The child just said: \"{child_response}\"\n\n\
             Context: {context}\n\n\
             Please:\n\
             1. Acknowledge their response warmly\n\
             2. Ask a relevant follow-up question to learn more\n\
             3. Guide the conversation toward understanding what they loved about the book\n\n\
             Keep the conversation natural and kid-friendly!"
        );

        self.agent.invoke(&input, history).await
    }

    /// Produce the final structured analysis for the Game Designer.
    pub async fn complete_analysis(
        &self,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let input = "\
Based on our conversation, please create a complete book analysis.

Extract and structure:
- Book title and author
- Plot summary (2-3 sentences)
- Main themes
- Key characters with descriptions
- Important plot points
- Story elements that would work well in a game (collectibles, obstacles, goals)
- Notes from our discussion

Format the output as a single JSON object with camelCase keys: book {title, \
author}, plotSummary, themes, characters [{name, description, role, traits}], \
keyMoments, gameElements [{type, name, description, storyConnection}], and \
discussionNotes, so the Game Designer can use it.";

        self.agent.invoke(input, history).await
    }
}
