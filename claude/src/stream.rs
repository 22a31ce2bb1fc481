//! Streaming events and SSE parsing.

use crate::types::{Error, StopReason};
use serde::Deserialize;
use std::pin::Pin;
use tokio_stream::Stream;

/// A pinned, boxed stream of streaming events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>;

/// Events from a streaming response.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    MessageStart {
        id: String,
        model: String,
    },
    ContentBlockStart {
        index: usize,
        content_type: String,
        /// Tool use ID (only present for tool_use blocks)
        tool_use_id: Option<String>,
        /// Tool name (only present for tool_use blocks)
        tool_name: Option<String>,
    },
    TextDelta {
        index: usize,
        text: String,
    },
    InputJsonDelta {
        index: usize,
        partial_json: String,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        stop_reason: Option<StopReason>,
    },
    MessageStop,
    Ping,
    Error {
        message: String,
    },
}

/// Parse complete SSE events out of `buffer`, leaving incomplete data behind.
///
/// SSE data lines are newline-terminated; a chunk boundary can split both a
/// line and the JSON payload inside it, so a line whose JSON ends abruptly is
/// left in the buffer until more data arrives.
pub(crate) fn drain_sse_buffer(buffer: &mut String) -> Vec<Result<StreamEvent, Error>> {
    let mut events = Vec::new();

    loop {
        let Some(newline_pos) = buffer.find('\n') else {
            break;
        };

        let line = &buffer[..newline_pos];

        if let Some(json_str) = line.strip_prefix("data: ") {
            if json_str == "[DONE]" {
                events.push(Ok(StreamEvent::MessageStop));
            } else if !json_str.is_empty() {
                match serde_json::from_str::<WireStreamEvent>(json_str) {
                    Ok(event) => events.push(Ok(event.into())),
                    Err(e) => {
                        if e.is_eof() {
                            // Incomplete JSON; wait for the rest of the line.
                            break;
                        }
                        events.push(Err(Error::Parse(format!("SSE parse error: {e}"))));
                    }
                }
            }
        }
        // event: lines, empty lines, and other SSE metadata are skipped.

        buffer.drain(..=newline_pos);
    }

    events
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireStreamEvent {
    MessageStart {
        message: WireMessageStart,
    },
    ContentBlockStart {
        index: usize,
        content_block: WireContentBlockStart,
    },
    ContentBlockDelta {
        index: usize,
        delta: WireDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: WireMessageDelta,
    },
    MessageStop,
    Ping,
    Error {
        error: WireError,
    },
}

#[derive(Debug, Deserialize)]
struct WireMessageStart {
    id: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct WireContentBlockStart {
    r#type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(clippy::enum_variant_names)]
enum WireDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    ThinkingDelta { thinking: String },
}

#[derive(Debug, Deserialize)]
struct WireMessageDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}

impl From<WireStreamEvent> for StreamEvent {
    fn from(event: WireStreamEvent) -> Self {
        match event {
            WireStreamEvent::MessageStart { message } => StreamEvent::MessageStart {
                id: message.id,
                model: message.model,
            },
            WireStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => StreamEvent::ContentBlockStart {
                index,
                content_type: content_block.r#type,
                tool_use_id: content_block.id,
                tool_name: content_block.name,
            },
            WireStreamEvent::ContentBlockDelta { index, delta } => match delta {
                WireDelta::TextDelta { text } => StreamEvent::TextDelta { index, text },
                WireDelta::InputJsonDelta { partial_json } => StreamEvent::InputJsonDelta {
                    index,
                    partial_json,
                },
                WireDelta::ThinkingDelta { thinking } => StreamEvent::TextDelta {
                    index,
                    text: thinking,
                },
            },
            WireStreamEvent::ContentBlockStop { index } => StreamEvent::ContentBlockStop { index },
            WireStreamEvent::MessageDelta { delta } => StreamEvent::MessageDelta {
                stop_reason: delta.stop_reason.map(|s| StopReason::from_wire(&s)),
            },
            WireStreamEvent::MessageStop => StreamEvent::MessageStop,
            WireStreamEvent::Ping => StreamEvent::Ping,
            WireStreamEvent::Error { error } => StreamEvent::Error {
                message: error.message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_complete_event() {
        let mut buffer =
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"hi\"}}\n"
                .to_string();
        let events = drain_sse_buffer(&mut buffer);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Ok(StreamEvent::TextDelta { index: 0, ref text }) if text == "hi"
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_holds_incomplete_line() {
        let mut buffer = "data: {\"type\":\"ping\"".to_string();
        let events = drain_sse_buffer(&mut buffer);
        assert!(events.is_empty());
        assert!(!buffer.is_empty());

        buffer.push_str("}\n");
        let events = drain_sse_buffer(&mut buffer);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamEvent::Ping)));
    }

    #[test]
    fn test_drain_skips_metadata_lines() {
        let mut buffer = "event: ping\ndata: {\"type\":\"ping\"}\n\n".to_string();
        let events = drain_sse_buffer(&mut buffer);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_drain_done_marker() {
        let mut buffer = "data: [DONE]\n".to_string();
        let events = drain_sse_buffer(&mut buffer);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(StreamEvent::MessageStop)));
    }
}
