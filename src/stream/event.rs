use serde::Deserialize;

/// Prefix carried by every SSE line that holds an event payload.
pub const DATA_PREFIX: &str = "data: ";

/// Tool name the service uses for artifact blocks.
pub const ARTIFACT_TOOL_NAME: &str = "artifacts";

/// One decoded event from the completion stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    MessageStart {
        message_id: Option<String>,
    },
    ContentBlockStart {
        index: Option<u64>,
        block_type: String,
        tool_name: Option<String>,
    },
    ContentBlockDelta {
        index: Option<u64>,
        delta: Delta,
    },
    ContentBlockStop {
        index: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Text(String),
    InputJson(String),
    /// Any other delta kind, or a known kind missing its payload.
    Other,
}

impl StreamEvent {
    /// True for a `content_block_start` opening an artifact tool call.
    pub fn opens_artifact(&self) -> bool {
        matches!(
            self,
            StreamEvent::ContentBlockStart { block_type, tool_name: Some(name), .. }
                if block_type == "tool_use" && name == ARTIFACT_TOOL_NAME
        )
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    MessageStart {
        #[serde(default)]
        message: WireMessage,
    },
    ContentBlockStart {
        index: Option<u64>,
        #[serde(default)]
        content_block: WireBlock,
    },
    ContentBlockDelta {
        index: Option<u64>,
        #[serde(default)]
        delta: WireDelta,
    },
    ContentBlockStop {
        index: Option<u64>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Default)]
struct WireMessage {
    uuid: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    partial_json: Option<String>,
}

impl From<WireDelta> for Delta {
    fn from(delta: WireDelta) -> Self {
        match (delta.kind.as_deref(), delta.text, delta.partial_json) {
            (Some("text_delta"), Some(text), _) => Delta::Text(text),
            (Some("input_json_delta"), _, Some(json)) => Delta::InputJson(json),
            _ => Delta::Other,
        }
    }
}

/// Decode one line of the response body.
///
/// Lines without the `data: ` prefix, payloads that are not JSON, and
/// unrecognized event types all yield `None`: the transport interleaves
/// keepalives and comments with real events.
pub fn decode_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let event = match serde_json::from_str::<WireEvent>(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::trace!("ignoring undecodable stream line: {}", e);
            return None;
        }
    };

    match event {
        WireEvent::MessageStart { message } => Some(StreamEvent::MessageStart {
            message_id: message.uuid,
        }),
        WireEvent::ContentBlockStart {
            index,
            content_block,
        } => Some(StreamEvent::ContentBlockStart {
            index,
            block_type: content_block.kind.unwrap_or_default(),
            tool_name: content_block.name,
        }),
        WireEvent::ContentBlockDelta { index, delta } => Some(StreamEvent::ContentBlockDelta {
            index,
            delta: delta.into(),
        }),
        WireEvent::ContentBlockStop { index } => Some(StreamEvent::ContentBlockStop { index }),
        WireEvent::Unknown => None,
    }
}
