//! Minimal Anthropic Claude API client.
//!
//! A focused client for Claude's Messages API with:
//! - Non-streaming and streaming completions
//! - Tool use support with an executor loop
//! - Image (vision) content blocks
//! - Proper SSE parsing for streaming responses

mod client;
mod stream;
mod types;

pub use client::Claude;
pub use stream::{EventStream, StreamEvent};
pub use types::{
    ContentBlock, Error, Message, Request, Response, Role, StopReason, Tool, ToolChoice,
    ToolResult, ToolUse, Usage,
};

pub(crate) const API_BASE: &str = "https://api.anthropic.com/v1";
pub(crate) const API_VERSION: &str = "2023-06-01";
pub(crate) const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
