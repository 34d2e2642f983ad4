use crate::analysis::find_commits;
use crate::transcript::{ContentBlock, ImageSource, MessageContent, ToolResultBlock, ToolResultContent};
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Output, State, context, escape_formatter};
use pulldown_cmark::{Event, Options, Parser, html};
use tracing::warn;

mod tools;

pub const STYLE: &str = include_str!("../assets/style.css");
pub const SCRIPT: &str = include_str!("../assets/script.js");

const TEMPLATES: &[(&str, &str)] = &[
    ("macros.html", include_str!("../templates/macros.html")),
    ("base.html", include_str!("../templates/base.html")),
    ("page.html", include_str!("../templates/page.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("message.html", include_str!("../templates/message.html")),
    ("anchor.html", include_str!("../templates/anchor.html")),
    ("text.html", include_str!("../templates/text.html")),
    ("thinking.html", include_str!("../templates/thinking.html")),
    ("image.html", include_str!("../templates/image.html")),
    ("tool_use.html", include_str!("../templates/tool_use.html")),
    ("tool_write.html", include_str!("../templates/tool_write.html")),
    ("tool_edit.html", include_str!("../templates/tool_edit.html")),
    ("tool_bash.html", include_str!("../templates/tool_bash.html")),
    ("tool_todo.html", include_str!("../templates/tool_todo.html")),
    ("tool_result.html", include_str!("../templates/tool_result.html")),
    ("result_text.html", include_str!("../templates/result_text.html")),
];

// ===================================================================
// Markup helpers
// ===================================================================

/// Escape text for HTML bodies and double-quoted attributes.
///
/// minijinja's built-in HTML escaping also rewrites `/`, which would mangle
/// the file paths and URLs shown verbatim in tool cards.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Auto-escaping formatter that leaves `/` alone so paths and URLs stay
/// readable in the generated markup.
fn html_formatter(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    if value.is_safe() || value.is_none() || value.is_undefined() || !matches!(state.auto_escape(), AutoEscape::Html) {
        return escape_formatter(out, state, value);
    }
    out.write_str(&escape_html(&value.to_string()))
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "writing escaped value"))
}

/// Render markdown to HTML. Raw HTML in the source is shown as text.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Pretty-printed JSON inside a fenced code block. Never fails, so it
/// backs every other renderer.
pub fn json_dump(value: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let longest_run = pretty
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    let markdown = format!("{fence}json\n{pretty}\n{fence}\n");
    format!("<div class=\"unknown-block\">{}</div>", render_markdown(&markdown))
}

// ===================================================================
// Renderer
// ===================================================================

/// Turns content blocks into HTML fragments and assembles documents.
pub struct Renderer {
    env: Environment<'static>,
    repo: Option<String>,
}

impl Renderer {
    /// Build the template environment. `repo` is an `owner/repo`
    /// identifier used to link commit hashes.
    pub fn new(repo: Option<String>) -> Result<Self, Error> {
        let mut env = Environment::new();
        env.set_formatter(html_formatter);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env, repo })
    }

    pub fn commit_url(&self, hash: &str) -> Option<String> {
        self.repo
            .as_ref()
            .map(|repo| format!("https://github.com/{repo}/commit/{hash}"))
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Render a whole message body: a plain string is treated as one text
    /// block, a block list is rendered block by block.
    pub fn render_content(&self, content: &MessageContent) -> String {
        match content {
            MessageContent::Text(text) => self.render_text(text).unwrap_or_else(|err| {
                warn!(error = %err, "falling back to raw text dump");
                json_dump(&serde_json::Value::from(text.as_str()))
            }),
            MessageContent::Blocks(blocks) => blocks.iter().map(|b| self.render_block(b)).collect(),
        }
    }

    /// Render one content block. Total: anything that cannot be rendered
    /// through its template is dumped as JSON.
    pub fn render_block(&self, block: &ContentBlock) -> String {
        let rendered = match block {
            ContentBlock::Text(text) => self.render_text(&text.text),
            ContentBlock::Thinking(thinking) => self.render(
                "thinking.html",
                context! { html => Value::from_safe_string(render_markdown(&thinking.thinking)) },
            ),
            ContentBlock::Image(image) => self.render_image(&image.source),
            ContentBlock::ToolUse(tool) => self.render_tool_use(tool),
            ContentBlock::ToolResult(result) => self.render_tool_result(result),
            ContentBlock::Unknown(raw) => return json_dump(raw),
        };
        rendered.unwrap_or_else(|err| {
            warn!(block = block.type_name(), error = %err, "falling back to raw block dump");
            json_dump(&block.to_value())
        })
    }

    fn render_text(&self, text: &str) -> Result<String, Error> {
        self.render(
            "text.html",
            context! { html => Value::from_safe_string(render_markdown(text)) },
        )
    }

    fn render_image(&self, source: &ImageSource) -> Result<String, Error> {
        self.render(
            "image.html",
            context! { media_type => &source.media_type, data => &source.data },
        )
    }

    // ---------------------------------------------------------------
    // Tool results
    // ---------------------------------------------------------------

    fn render_tool_result(&self, result: &ToolResultBlock) -> Result<String, Error> {
        let (body, wrap) = match &result.content {
            ToolResultContent::Text(text) => (self.render_result_text(text, true)?, true),
            ToolResultContent::Items(items) => {
                let has_image = items.iter().any(|item| item_type(item) == Some("image"));
                let body = items
                    .iter()
                    .map(|item| self.render_result_item(item))
                    .collect::<Result<String, Error>>()?;
                (body, !has_image)
            }
            ToolResultContent::Other(value) => (json_dump(value), true),
        };
        self.render(
            "tool_result.html",
            context! {
                body => Value::from_safe_string(body),
                wrap,
                is_error => result.is_error(),
                tool_use_id => &result.tool_use_id,
            },
        )
    }

    fn render_result_item(&self, item: &serde_json::Value) -> Result<String, Error> {
        match (item_type(item), ContentBlock::from_value(item.clone())) {
            (Some("image"), ContentBlock::Image(image)) => self.render_image(&image.source),
            (Some("text"), ContentBlock::Text(text)) => self.render_result_text(&text.text, false),
            _ => Ok(json_dump(item)),
        }
    }

    /// Plain tool output. With `link_commits`, every commit summary line
    /// becomes a commit card (linked when a repository is configured) and
    /// the text around it is kept as is.
    fn render_result_text(&self, text: &str, link_commits: bool) -> Result<String, Error> {
        let mut segments = Vec::new();
        let mut last = 0;
        if link_commits && self.repo.is_some() {
            for commit in find_commits(text) {
                if commit.range.start > last {
                    segments.push(context! { text => &text[last..commit.range.start] });
                }
                segments.push(context! {
                    commit => context! {
                        hash => commit.hash,
                        message => commit.message,
                        url => self.commit_url(commit.hash),
                    },
                });
                last = commit.range.end;
            }
        }
        if last < text.len() {
            segments.push(context! { text => &text[last..] });
        }
        self.render("result_text.html", context! { segments })
    }
}

fn item_type(item: &serde_json::Value) -> Option<&str> {
    item.get("type").and_then(serde_json::Value::as_str)
}
