use crate::conversation::{ConversationMessage, truncate};
use crate::transcript::{ContentBlock, LogEntry, Message, ToolUseBlock};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

// ===================================================================
// Shared patterns
// ===================================================================

/// Head of a `git commit` summary line: `[<ref> <hash>]`. Ref names cannot
/// contain brackets.
static COMMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]\n]+) ([0-9a-f]{7,})\]").unwrap());

/// The "create a pull request" hint printed by `git push` to a hosted repo.
static REPO_HINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/([A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+)/pull/new/").unwrap()
});

/// Text longer than this is flagged as long-form content.
const LONG_TEXT_THRESHOLD: usize = 500;
const LONG_TEXT_PREVIEW_CHARS: usize = 200;

/// Tool input fields that conventionally carry large text payloads.
const LONG_TEXT_FIELDS: &[&str] = &["content", "new_string", "newString", "replacement"];

// ===================================================================
// Commit detection
// ===================================================================

/// One commit summary line found in tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMatch<'a> {
    /// Byte range of the whole `[ref hash] message` match.
    pub range: Range<usize>,
    pub hash: &'a str,
    pub message: &'a str,
}

/// Find every commit summary line in `text`, in order.
///
/// A message runs to the end of its line, or to the next `[ref hash]` head
/// when several commits share a line.
pub fn find_commits(text: &str) -> impl Iterator<Item = CommitMatch<'_>> {
    let heads: Vec<(Range<usize>, &str)> = COMMIT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| Some((caps.get(0)?.range(), caps.get(2)?.as_str())))
        .collect();
    let limits: Vec<usize> = heads
        .iter()
        .skip(1)
        .map(|(head, _)| head.start)
        .chain(std::iter::once(text.len()))
        .collect();
    heads.into_iter().zip(limits).map(move |((head, hash), limit)| {
        let line_end = text[head.end..].find('\n').map_or(text.len(), |i| head.end + i);
        let end = line_end.min(limit);
        CommitMatch {
            range: head.start..end,
            hash,
            message: text[head.end..end].trim(),
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub timestamp: String,
}

/// Look for an `owner/repo` identifier in `git push` output across the
/// session's tool results.
pub fn detect_repo(entries: &[LogEntry]) -> Option<String> {
    turn_messages(entries).find_map(|(message, _)| {
        message.content.blocks().iter().find_map(|block| match block {
            ContentBlock::ToolResult(result) => result.content.search_texts().iter().find_map(|text| {
                REPO_HINT_PATTERN
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            }),
            _ => None,
        })
    })
}

/// True when `repo` looks like an `owner/repo` identifier.
pub fn is_repo_identifier(repo: &str) -> bool {
    let mut parts = repo.split('/');
    let valid = |part: Option<&str>| {
        part.is_some_and(|p| {
            !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
        })
    };
    valid(parts.next()) && valid(parts.next()) && parts.next().is_none()
}

// ===================================================================
// Tool names
// ===================================================================

/// Strip an `mcp__<server>__` namespace from a tool name.
fn strip_tool_prefix(name: &str) -> &str {
    name.strip_prefix("mcp__")
        .and_then(|rest| rest.split_once("__"))
        .map_or(name, |(_, tool)| tool)
}

/// Lower-cased, prefix-stripped tool name with separators removed, so
/// `TodoWrite`, `todo_write` and `todo-write` all become `todowrite`.
pub fn tool_key(name: &str) -> String {
    strip_tool_prefix(name)
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The name tool calls are counted under.
pub fn canonical_tool_name(name: &str) -> String {
    match tool_key(name).as_str() {
        "todowrite" | "todoread" => "todo".to_string(),
        _ => strip_tool_prefix(name).to_lowercase(),
    }
}

/// Tool call counts keyed by canonical name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCounts {
    counts: Vec<(String, usize)>,
}

impl ToolCounts {
    pub fn record(&mut self, name: &str) {
        let name = canonical_tool_name(name);
        match self.counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((name, 1)),
        }
    }

    pub fn get(&self, name: &str) -> usize {
        self.counts
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Descending by count; ties keep first-seen order.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> =
            self.counts.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    /// "3 bash · 2 edit · 1 read"
    pub fn summary(&self) -> String {
        self.sorted()
            .iter()
            .map(|(name, count)| format!("{count} {name}"))
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

// ===================================================================
// Long-form content
// ===================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LongTextKind {
    Thinking,
    ToolInput { tool: String, field: &'static str },
}

impl LongTextKind {
    pub fn label(&self) -> String {
        match self {
            Self::Thinking => "thinking".to_string(),
            Self::ToolInput { tool, field } => format!("{tool} {field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongText {
    pub kind: LongTextKind,
    pub preview: String,
    pub full: String,
    pub timestamp: String,
}

impl LongText {
    fn flag(kind: LongTextKind, text: &str, timestamp: &str) -> Option<Self> {
        (text.chars().count() > LONG_TEXT_THRESHOLD).then(|| Self {
            kind,
            preview: truncate(text, LONG_TEXT_PREVIEW_CHARS),
            full: text.to_string(),
            timestamp: timestamp.to_string(),
        })
    }
}

fn long_tool_inputs(tool: &ToolUseBlock, timestamp: &str) -> Vec<LongText> {
    LONG_TEXT_FIELDS
        .iter()
        .filter_map(|field| {
            let text = tool.input.get(*field)?.as_str()?;
            let kind = LongTextKind::ToolInput {
                tool: canonical_tool_name(&tool.name),
                field: *field,
            };
            LongText::flag(kind, text, timestamp)
        })
        .collect()
}

// ===================================================================
// Statistics
// ===================================================================

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub tool_counts: ToolCounts,
    pub long_texts: Vec<LongText>,
    pub commits: Vec<CommitRecord>,
}

/// The narrower per-conversation view used on the index page.
#[derive(Debug, Clone, Default)]
pub struct ConversationStats {
    pub tool_stats: String,
    pub commits: Vec<CommitRecord>,
}

fn turn_messages(entries: &[LogEntry]) -> impl Iterator<Item = (Message, &str)> {
    entries.iter().filter_map(|entry| {
        let (_, turn) = entry.as_turn()?;
        Some((turn.resolved_message()?, turn.timestamp()))
    })
}

fn scan<'a, M>(messages: impl Iterator<Item = (M, &'a str)>) -> SessionStats
where
    M: std::borrow::Borrow<Message>,
{
    let mut stats = SessionStats::default();
    for (message, timestamp) in messages {
        for block in message.borrow().content.blocks() {
            match block {
                ContentBlock::ToolUse(tool) => {
                    stats.tool_counts.record(&tool.name);
                    stats.long_texts.extend(long_tool_inputs(tool, timestamp));
                }
                ContentBlock::Thinking(thinking) => {
                    stats
                        .long_texts
                        .extend(LongText::flag(LongTextKind::Thinking, &thinking.thinking, timestamp));
                }
                ContentBlock::ToolResult(result) => {
                    for text in result.content.search_texts() {
                        stats.commits.extend(find_commits(&text).map(|c| CommitRecord {
                            hash: c.hash.to_string(),
                            message: c.message.to_string(),
                            timestamp: timestamp.to_string(),
                        }));
                    }
                }
                ContentBlock::Text(_) | ContentBlock::Image(_) | ContentBlock::Unknown(_) => {}
            }
        }
    }
    stats
}

/// Whole-session statistics over every user/assistant entry.
pub fn analyze_session(entries: &[LogEntry]) -> SessionStats {
    scan(turn_messages(entries))
}

/// Tool usage summary and commits for one conversation.
pub fn analyze_conversation(messages: &[ConversationMessage]) -> ConversationStats {
    let stats = scan(messages.iter().map(|m| (&m.message, m.timestamp.as_str())));
    ConversationStats {
        tool_stats: stats.tool_counts.summary(),
        commits: stats.commits,
    }
}
