//! Conversation history for the active phase.
//!
//! Each phase owns its own conversation; history never bleeds between
//! phases. Entries are closed, typed records rather than loose JSON.

use chrono::{DateTime, Utc};
use claude::Message;
use serde::{Deserialize, Serialize};

/// Who produced a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

/// Which specialized agent produced an agent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    StoryAnalyst,
    GameDesigner,
    CodeGenerator,
}

impl AgentKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::StoryAnalyst => "Story Analyst",
            AgentKind::GameDesigner => "Game Designer",
            AgentKind::CodeGenerator => "Code Generator",
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Set on agent turns; `None` for user turns.
    pub agent: Option<AgentKind>,
    pub timestamp: DateTime<Utc>,
}

/// Ordered conversation history for one phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    entries: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.entries.push(ChatMessage {
            role: ChatRole::User,
            content: content.into(),
            agent: None,
            timestamp: Utc::now(),
        });
    }

    /// Append an agent turn.
    pub fn add_agent(&mut self, content: impl Into<String>, agent: AgentKind) {
        self.entries.push(ChatMessage {
            role: ChatRole::Agent,
            content: content.into(),
            agent: Some(agent),
            timestamp: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    /// Drop all entries. Called on every phase transition.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Convert to API message turns (user ↔ assistant).
    pub fn to_messages(&self) -> Vec<Message> {
        self.entries
            .iter()
            .map(|m| match m.role {
                ChatRole::User => Message::user(&m.content),
                ChatRole::Agent => Message::assistant(&m.content),
            })
            .collect()
    }
}
