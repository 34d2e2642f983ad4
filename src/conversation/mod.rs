use crate::transcript::{ContentBlock, LogEntry, Message, MessageContent, Role};

/// Maximum number of characters kept in a conversation's preview text.
const PREVIEW_CHARS: usize = 100;

/// One user-initiated exchange plus every assistant and tool turn that
/// follows it until the next real prompt.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Whitespace-normalised, truncated preview of the opening prompt.
    pub user_text: String,
    pub timestamp: String,
    pub messages: Vec<ConversationMessage>,
    /// The opening prompt is a compacted summary of an earlier session.
    pub is_continuation: bool,
}

#[derive(Debug, Clone)]
pub struct ConversationMessage {
    pub role: Role,
    pub message: Message,
    pub timestamp: String,
}

impl ConversationMessage {
    /// A user turn that only relays tool output back to the assistant.
    pub fn is_tool_reply(&self) -> bool {
        self.role == Role::User && self.message.content.is_tool_result_only()
    }
}

/// Fold the entry list into conversations.
///
/// The output vector doubles as the accumulator: its last element is the
/// open conversation. A user turn that is not a pure tool-result relay
/// opens a new one; everything else attaches to the open conversation or
/// is dropped when none exists yet.
pub fn group_conversations(entries: &[LogEntry]) -> Vec<Conversation> {
    entries.iter().fold(Vec::new(), |mut conversations, entry| {
        let Some((role, turn)) = entry.as_turn() else {
            return conversations;
        };
        let Some(message) = turn.resolved_message() else {
            return conversations;
        };
        let timestamp = turn.timestamp().to_string();

        if role == Role::User && !message.content.is_tool_result_only() {
            conversations.push(Conversation {
                user_text: preview_text(&message.content),
                timestamp: timestamp.clone(),
                messages: Vec::new(),
                is_continuation: turn.is_compact_summary.unwrap_or(false),
            });
        }

        if let Some(open) = conversations.last_mut() {
            open.messages.push(ConversationMessage {
                role,
                message,
                timestamp,
            });
        }
        conversations
    })
}

/// Derive the preview shown for a prompt: its text, else a bracketed tag
/// naming the first block's type, else nothing.
pub fn preview_text(content: &MessageContent) -> String {
    let raw = match content.first_text() {
        Some(text) => text.to_string(),
        None => content
            .blocks()
            .first()
            .map(|block| format!("[{}]", block.type_name()))
            .unwrap_or_default(),
    };
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&normalized, PREVIEW_CHARS)
}

/// Truncate a string to `max` chars, appending "..." if truncated.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
    }
}

/// The first non-empty assistant text in a conversation, if any.
pub fn first_assistant_text(messages: &[ConversationMessage]) -> Option<&str> {
    messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .find_map(|m| match &m.message.content {
            MessageContent::Text(text) => Some(text.as_str()).filter(|t| !t.trim().is_empty()),
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text(t) if !t.text.trim().is_empty() => Some(t.text.as_str()),
                _ => None,
            }),
        })
}
