use crate::analysis::{CommitRecord, analyze_conversation, analyze_session, detect_repo};
use crate::conversation::{Conversation, ConversationMessage, first_assistant_text, group_conversations};
use crate::pages::{PAGE_SIZE, Page, page_filename, page_of, paginate};
use crate::render::{Renderer, SCRIPT, STYLE, render_markdown};
use crate::transcript::{LogEntry, Role};
use minijinja::value::Value;
use minijinja::{Error, context};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

pub const INDEX_FILENAME: &str = "index.html";

/// Knobs for one site build.
#[derive(Debug, Clone, Default)]
pub struct SiteOptions {
    /// `owner/repo` used to link commit hashes. When unset, the session's
    /// own `git push` output is searched for one.
    pub repo: Option<String>,
}

/// Deterministic element id for a message, derived from its timestamp.
pub fn message_anchor(timestamp: &str) -> String {
    let id: String = timestamp
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("msg-{id}")
}

/// Element ids for every message, parallel to `conversations`.
///
/// The first message with a given timestamp gets the bare
/// [`message_anchor`]; later ones get `_2`, `_3`, ... appended. `_` never
/// appears in a bare anchor, so ids are unique across the whole site.
pub fn message_anchors(conversations: &[Conversation]) -> Vec<Vec<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    conversations
        .iter()
        .map(|conversation| {
            conversation
                .messages
                .iter()
                .map(|message| {
                    let anchor = message_anchor(&message.timestamp);
                    let count = seen.entry(anchor.clone()).or_insert(0);
                    *count += 1;
                    match *count {
                        1 => anchor,
                        n => format!("{anchor}_{n}"),
                    }
                })
                .collect()
        })
        .collect()
}

/// Build every output document, keyed by file name. The index is always
/// present, even for an empty session.
pub fn build_site(entries: &[LogEntry], options: &SiteOptions) -> Result<BTreeMap<String, String>, Error> {
    let repo = options.repo.clone().or_else(|| {
        let detected = detect_repo(entries);
        if let Some(repo) = &detected {
            debug!(repo = %repo, "using repository found in git push output");
        }
        detected
    });
    let renderer = Renderer::new(repo)?;

    let conversations = group_conversations(entries);
    let pages = paginate(&conversations, PAGE_SIZE);
    info!(
        entries = entries.len(),
        conversations = conversations.len(),
        pages = pages.len(),
        "assembled transcript"
    );

    let anchors = message_anchors(&conversations);
    let mut files = BTreeMap::new();
    for (page, page_anchors) in pages.iter().zip(anchors.chunks(PAGE_SIZE)) {
        files.insert(page_filename(page.page_num), render_page(&renderer, page, page_anchors)?);
    }
    files.insert(
        INDEX_FILENAME.to_string(),
        render_index(&renderer, &conversations, &anchors, entries, pages.len())?,
    );
    Ok(files)
}

fn document_assets() -> (Value, Value) {
    (Value::from_safe_string(STYLE.to_string()), Value::from_safe_string(SCRIPT.to_string()))
}

// ===================================================================
// Pages
// ===================================================================

fn navigation(page_num: usize, total_pages: usize) -> Value {
    let pages: Vec<Value> = (1..=total_pages)
        .map(|num| context! { num, href => page_filename(num), current => num == page_num })
        .collect();
    context! {
        prev => (page_num > 1).then(|| page_filename(page_num - 1)),
        next => (page_num < total_pages).then(|| page_filename(page_num + 1)),
        pages,
    }
}

/// One message block. A message with nothing to show leaves only an empty
/// anchor target so links into it still resolve.
fn render_message(renderer: &Renderer, message: &ConversationMessage, anchor: &str) -> Result<String, Error> {
    let content = renderer.render_content(&message.message.content);
    if content.trim().is_empty() {
        return renderer.render("anchor.html", context! { anchor });
    }
    let (role_class, role_label) = match message.role {
        Role::User if message.is_tool_reply() => ("tool-reply", "Tool reply"),
        Role::User => ("user", "User"),
        Role::Assistant => ("assistant", "Assistant"),
    };
    renderer.render(
        "message.html",
        context! {
            role_class,
            role_label,
            anchor,
            timestamp => &message.timestamp,
            content => Value::from_safe_string(content),
        },
    )
}

/// One page document: navigation, every renderable message, navigation.
/// `anchors` holds the element ids of this page's messages.
pub fn render_page(renderer: &Renderer, page: &Page<'_>, anchors: &[Vec<String>]) -> Result<String, Error> {
    let mut conversations = Vec::new();
    for (conversation, ids) in page.conversations.iter().zip(anchors) {
        let html = conversation
            .messages
            .iter()
            .zip(ids)
            .map(|(m, id)| render_message(renderer, m, id))
            .collect::<Result<String, Error>>()?;
        conversations.push(context! {
            html => Value::from_safe_string(html),
            continuation => conversation.is_continuation,
        });
    }

    let (css, js) = document_assets();
    renderer.render(
        "page.html",
        context! {
            page_num => page.page_num,
            total_pages => page.total_pages,
            nav => navigation(page.page_num, page.total_pages),
            conversations,
            css,
            js,
        },
    )
}

// ===================================================================
// Index
// ===================================================================

fn commit_value(renderer: &Renderer, commit: &CommitRecord) -> Value {
    context! {
        hash => &commit.hash,
        message => &commit.message,
        timestamp => &commit.timestamp,
        url => renderer.commit_url(&commit.hash),
    }
}

fn deep_link(page: usize, anchor: &str) -> String {
    format!("{}#{}", page_filename(page), anchor)
}

/// Link to each message timestamp; the first occurrence wins.
fn message_links<'a>(conversations: &'a [Conversation], anchors: &[Vec<String>]) -> HashMap<&'a str, String> {
    let mut links = HashMap::new();
    for (i, (conversation, ids)) in conversations.iter().zip(anchors).enumerate() {
        for (message, id) in conversation.messages.iter().zip(ids) {
            links
                .entry(message.timestamp.as_str())
                .or_insert_with(|| deep_link(page_of(i, PAGE_SIZE), id));
        }
    }
    links
}

/// The index document: session totals plus one entry per conversation.
pub fn render_index(
    renderer: &Renderer,
    conversations: &[Conversation],
    anchors: &[Vec<String>],
    entries: &[LogEntry],
    total_pages: usize,
) -> Result<String, Error> {
    let stats = analyze_session(entries);

    let items: Vec<Value> = conversations
        .iter()
        .zip(anchors)
        .enumerate()
        .map(|(i, (conversation, ids))| {
            let page = page_of(i, PAGE_SIZE);
            let summary = analyze_conversation(&conversation.messages);
            let commits: Vec<Value> = summary
                .commits
                .iter()
                .map(|commit| commit_value(renderer, commit))
                .collect();
            let preview = first_assistant_text(&conversation.messages)
                .map(|text| Value::from_safe_string(render_markdown(text)))
                .unwrap_or_default();
            context! {
                number => i + 1,
                page,
                href => ids.first().map(|id| deep_link(page, id)).unwrap_or_default(),
                timestamp => &conversation.timestamp,
                user_text => &conversation.user_text,
                continuation => conversation.is_continuation,
                tool_stats => summary.tool_stats,
                commits,
                preview,
            }
        })
        .collect();

    let links = message_links(conversations, anchors);
    let long_texts: Vec<Value> = stats
        .long_texts
        .iter()
        .map(|text| {
            context! {
                kind => text.kind.label(),
                timestamp => &text.timestamp,
                preview => &text.preview,
                href => links.get(text.timestamp.as_str()),
            }
        })
        .collect();

    let top_tools: Vec<Value> = stats
        .tool_counts
        .sorted()
        .into_iter()
        .map(|(name, count)| context! { name, count })
        .collect();

    let pages: Vec<Value> = (1..=total_pages)
        .map(|num| context! { num, href => page_filename(num) })
        .collect();

    let summary = context! {
        prompts => conversations.iter().filter(|c| !c.is_continuation).count(),
        messages => conversations.iter().map(|c| c.messages.len()).sum::<usize>(),
        tool_calls => stats.tool_counts.total(),
        commits => stats.commits.len(),
        pages => total_pages,
    };

    let (css, js) = document_assets();
    renderer.render(
        "index.html",
        context! { summary, top_tools, pages, items, long_texts, css, js },
    )
}
