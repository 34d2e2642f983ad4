use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

mod load;

pub use load::{InputFormat, LoadError, detect_format, load_path, parse_document, parse_entries, parse_lines};

// ===================================================================
// Top-level log entry, one per JSONL line or `loglines` element
// ===================================================================

/// A single record in a session log.
///
/// Discriminated by the `type` field. Only `user` and `assistant` entries
/// take part in transcript assembly; the rest are kept so that a
/// `loglines` document containing them still validates.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum LogEntry {
    #[serde(rename = "user")]
    User(TurnEntry),
    #[serde(rename = "assistant")]
    Assistant(TurnEntry),
    #[serde(rename = "summary")]
    Summary(SummaryEntry),
    /// Legacy standalone tool invocation marker.
    #[serde(rename = "tool_use")]
    ToolUse(ToolMarkerEntry),
    /// Legacy standalone tool result marker.
    #[serde(rename = "tool_result")]
    ToolResult(ToolMarkerEntry),
}

/// Which side of the exchange a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

// ===================================================================
// Turn entries (user + assistant share the same shape)
// ===================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Legacy shape: the turn payload nested under `message`.
    #[serde(default)]
    pub message: Option<Message>,
    /// Current shape: the content sits directly on the entry.
    #[serde(default)]
    pub content: Option<MessageContent>,

    // --- metadata that only appears on some entries ---
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub is_sidechain: Option<bool>,
    #[serde(default)]
    pub is_meta: Option<bool>,
    /// Set on the synthetic prompt that carries a compacted summary of an
    /// earlier part of the session.
    #[serde(default)]
    pub is_compact_summary: Option<bool>,
}

impl TurnEntry {
    /// The turn's message, preferring the nested `message` field and
    /// falling back to the flat `content` field.
    pub fn resolved_message(&self) -> Option<Message> {
        if let Some(message) = &self.message {
            return Some(message.clone());
        }
        self.content.as_ref().map(|content| Message {
            role: None,
            content: content.clone(),
        })
    }

    pub fn timestamp(&self) -> &str {
        self.timestamp.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub leaf_uuid: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolMarkerEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEntry {
    /// Return the role and turn payload for user/assistant entries.
    pub fn as_turn(&self) -> Option<(Role, &TurnEntry)> {
        match self {
            Self::User(turn) => Some((Role::User, turn)),
            Self::Assistant(turn) => Some((Role::Assistant, turn)),
            Self::Summary(_) | Self::ToolUse(_) | Self::ToolResult(_) => None,
        }
    }

    pub fn is_turn(&self) -> bool {
        self.as_turn().is_some()
    }

    pub fn timestamp(&self) -> &str {
        let ts = match self {
            Self::User(e) | Self::Assistant(e) => &e.timestamp,
            Self::Summary(e) => &e.timestamp,
            Self::ToolUse(e) | Self::ToolResult(e) => &e.timestamp,
        };
        ts.as_deref().unwrap_or_default()
    }
}

// ===================================================================
// Message
// ===================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: Option<String>,
    pub content: MessageContent,
}

/// `content` can be a plain string (typed prompt) or an array of
/// content blocks (assistant responses, tool results).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    pub fn blocks(&self) -> &[ContentBlock] {
        match self {
            Self::Blocks(blocks) => blocks,
            Self::Text(_) => &[],
        }
    }

    /// True for a non-empty block list made entirely of tool results,
    /// i.e. a relay of tool output rather than something the human typed.
    pub fn is_tool_result_only(&self) -> bool {
        match self {
            Self::Blocks(blocks) => {
                !blocks.is_empty()
                    && blocks.iter().all(|b| matches!(b, ContentBlock::ToolResult(_)))
            }
            Self::Text(_) => false,
        }
    }

    /// The string content, or the text of the first text block.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text(t) => Some(t.text.as_str()),
                _ => None,
            }),
        }
    }
}

// ===================================================================
// Content blocks inside content[]
// ===================================================================

/// One typed unit of message content.
///
/// Blocks whose `type` tag is not recognised, or whose known shape does
/// not parse, are kept verbatim in `Unknown` so rendering can fall back
/// to a raw dump instead of rejecting the whole entry.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text(TextBlock),
    Thinking(ThinkingBlock),
    Image(ImageBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
    Unknown(Value),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum KnownBlock {
    #[serde(rename = "text")]
    Text(TextBlock),
    #[serde(rename = "thinking")]
    Thinking(ThinkingBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "tool_use")]
    ToolUse(ToolUseBlock),
    #[serde(rename = "tool_result")]
    ToolResult(ToolResultBlock),
}

impl From<KnownBlock> for ContentBlock {
    fn from(block: KnownBlock) -> Self {
        match block {
            KnownBlock::Text(b) => Self::Text(b),
            KnownBlock::Thinking(b) => Self::Thinking(b),
            KnownBlock::Image(b) => Self::Image(b),
            KnownBlock::ToolUse(b) => Self::ToolUse(b),
            KnownBlock::ToolResult(b) => Self::ToolResult(b),
        }
    }
}

impl ContentBlock {
    /// Classify an already-parsed JSON value.
    pub fn from_value(raw: Value) -> Self {
        match KnownBlock::deserialize(&raw) {
            Ok(known) => known.into(),
            Err(_) => Self::Unknown(raw),
        }
    }

    /// The block as JSON, tag included.
    pub fn to_value(&self) -> Value {
        let (tag, body) = match self {
            Self::Text(b) => ("text", serde_json::to_value(b)),
            Self::Thinking(b) => ("thinking", serde_json::to_value(b)),
            Self::Image(b) => ("image", serde_json::to_value(b)),
            Self::ToolUse(b) => ("tool_use", serde_json::to_value(b)),
            Self::ToolResult(b) => ("tool_result", serde_json::to_value(b)),
            Self::Unknown(raw) => return raw.clone(),
        };
        let mut body = body.unwrap_or_default();
        if let Some(fields) = body.as_object_mut() {
            fields.insert("type".to_string(), Value::from(tag));
        }
        body
    }

    /// The wire tag of this block, or `"unknown"` when it has none.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Thinking(_) => "thinking",
            Self::Image(_) => "image",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResult(_) => "tool_result",
            Self::Unknown(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextBlock {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThinkingBlock {
    pub thinking: String,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageBlock {
    pub source: ImageSource,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageSource {
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolUseBlock {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolResultBlock {
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub content: ToolResultContent,
    #[serde(default)]
    pub is_error: Option<bool>,
}

impl ToolResultBlock {
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// A tool result's `content` is usually a string, sometimes a list of
/// `{type: "text" | "image", ...}` items, and occasionally anything else.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Items(Vec<Value>),
    Other(Value),
}

impl Default for ToolResultContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl ToolResultContent {
    /// The content as separately searchable strings: the text of each
    /// `text` item on its own, and the JSON text of every other shape.
    pub fn search_texts(&self) -> Vec<Cow<'_, str>> {
        match self {
            Self::Text(text) => vec![Cow::Borrowed(text.as_str())],
            Self::Items(items) => items
                .iter()
                .map(|item| match (item.get("type").and_then(Value::as_str), item.get("text")) {
                    (Some("text"), Some(Value::String(text))) => Cow::Borrowed(text.as_str()),
                    _ => Cow::Owned(item.to_string()),
                })
                .collect(),
            Self::Other(value) => vec![Cow::Owned(value.to_string())],
        }
    }
}
