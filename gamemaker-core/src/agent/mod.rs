//! Generic agent wrapper over the Claude client.
//!
//! An [`Agent`] binds a system prompt and a fixed tool set to an LLM
//! provider and exposes `invoke`/`stream`. Tool calls are executed locally
//! through the agent's handler inside a bounded loop; exceeding the round
//! cap is a failure, never a silent truncation. All provider failures are
//! surfaced as typed [`AgentError`] values.

pub mod code_generator;
pub mod game_designer;
pub mod story_analyst;
pub mod tools;

use crate::history::Conversation;
use async_trait::async_trait;
use claude::{
    Claude, ContentBlock, EventStream, Message, Request, Response, Role, StopReason, Tool,
    ToolResult, ToolUse,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use code_generator::{CodeGenError, CodeGenerator, GeneratedGame};
pub use game_designer::GameDesigner;
pub use story_analyst::{BookImage, StoryAnalyst};

/// Maximum tool-call/response round trips per invocation.
pub const MAX_TOOL_ROUNDS: usize = 10;

/// Errors from agent invocations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Claude API error: {0:?}")]
    Api(#[from] claude::Error),

    #[error("No API key configured")]
    NoApiKey,

    #[error("agent invoked with empty input")]
    EmptyInput,

    #[error("tool loop exceeded {limit} rounds without completing")]
    ToolLoopLimit { limit: usize },

    #[error("could not read book image: {0}")]
    Image(#[from] std::io::Error),
}

/// Abstraction over the LLM backend.
///
/// The production implementation is [`claude::Claude`]; tests substitute a
/// scripted fake. This is the only seam agents reach the network through.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: Request) -> Result<Response, claude::Error>;

    async fn stream(&self, request: Request) -> Result<EventStream, claude::Error>;
}

#[async_trait]
impl LlmProvider for Claude {
    async fn complete(&self, request: Request) -> Result<Response, claude::Error> {
        Claude::complete(self, request).await
    }

    async fn stream(&self, request: Request) -> Result<EventStream, claude::Error> {
        Claude::stream(self, request).await
    }
}

/// Configuration for one agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display name ("Story Analyst").
    pub name: &'static str,

    /// Model override; `None` uses the client default.
    pub model: Option<String>,

    /// Maximum tokens per response.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,
}

impl AgentConfig {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            model: None,
            max_tokens: 4096,
            temperature: Some(0.7),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Record of one tool call made during an invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub input: serde_json::Value,
    pub output: String,
    pub is_error: bool,
}

/// A successful agent invocation: the textual output plus any tool calls
/// made along the way.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub output: String,
    pub tool_trace: Vec<ToolInvocation>,
}

/// Executes an agent's tool calls locally.
pub type ToolHandler = Box<dyn Fn(&ToolUse) -> ToolResult + Send + Sync>;

/// A configured LLM invocation unit: fixed system prompt, fixed tool set,
/// no state of its own beyond configuration.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
    system_prompt: String,
    tools: Vec<Tool>,
    handler: ToolHandler,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: AgentConfig,
        system_prompt: impl Into<String>,
        tools: Vec<Tool>,
        handler: ToolHandler,
    ) -> Self {
        Self {
            provider,
            config,
            system_prompt: system_prompt.into(),
            tools,
            handler,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Invoke the agent with an instruction on top of prior history.
    pub async fn invoke(
        &self,
        input: &str,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        if input.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }

        let mut messages = history.to_messages();
        messages.push(Message::user(input));
        self.run(messages).await
    }

    /// Invoke the agent with a pre-built message (used for image turns).
    pub async fn invoke_message(
        &self,
        message: Message,
        history: &Conversation,
    ) -> Result<AgentReply, AgentError> {
        let mut messages = history.to_messages();
        messages.push(message);
        self.run(messages).await
    }

    /// Stream a response for real-time UI feedback.
    ///
    /// Streaming bypasses the tool loop; it is for display only and never
    /// drives control decisions.
    pub async fn stream(
        &self,
        input: &str,
        history: &Conversation,
    ) -> Result<EventStream, AgentError> {
        if input.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }

        let mut messages = history.to_messages();
        messages.push(Message::user(input));
        let request = self.build_request(messages);
        Ok(self.provider.stream(request).await?)
    }

    async fn run(&self, mut messages: Vec<Message>) -> Result<AgentReply, AgentError> {
        let mut output = String::new();
        let mut tool_trace = Vec::new();

        for round in 0..MAX_TOOL_ROUNDS {
            let request = self.build_request(messages.clone());
            let response = self.provider.complete(request).await?;

            for block in &response.content {
                if let ContentBlock::Text { text } = block {
                    if !output.is_empty() {
                        output.push('\n');
                    }
                    output.push_str(text);
                }
            }

            let tool_uses = response.tool_uses();
            if response.stop_reason != StopReason::ToolUse || tool_uses.is_empty() {
                return Ok(AgentReply { output, tool_trace });
            }

            debug!(
                agent = self.config.name,
                round,
                calls = tool_uses.len(),
                "executing tool calls"
            );

            messages.push(Message {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            let mut tool_results = Vec::new();
            for tool_use in tool_uses {
                let result = (self.handler)(&tool_use);
                tool_trace.push(ToolInvocation {
                    name: tool_use.name.clone(),
                    input: tool_use.input.clone(),
                    output: result.content.clone(),
                    is_error: result.is_error,
                });
                tool_results.push(ContentBlock::ToolResult {
                    tool_use_id: tool_use.id,
                    content: result.content,
                    is_error: result.is_error,
                });
            }

            messages.push(Message {
                role: Role::User,
                content: tool_results,
            });
        }

        Err(AgentError::ToolLoopLimit {
            limit: MAX_TOOL_ROUNDS,
        })
    }

    fn build_request(&self, messages: Vec<Message>) -> Request {
        let mut request = Request::new(normalize(messages))
            .with_system(&self.system_prompt)
            .with_max_tokens(self.config.max_tokens);

        if !self.tools.is_empty() {
            request = request.with_tools(self.tools.clone());
        }
        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        request
    }
}

/// Shape a message list for the Messages API: consecutive same-role turns
/// are coalesced, and the list must open with a user turn (phase
/// conversations open with an agent greeting).
fn normalize(messages: Vec<Message>) -> Vec<Message> {
    let mut result: Vec<Message> = Vec::with_capacity(messages.len());

    for message in messages {
        match result.last_mut() {
            Some(last) if last.role == message.role => last.content.extend(message.content),
            _ => result.push(message),
        }
    }

    if matches!(result.first(), Some(m) if m.role == Role::Assistant) {
        result.insert(0, Message::user("(session start)"));
    }

    result
}
