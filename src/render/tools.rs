use super::Renderer;
use crate::analysis::tool_key;
use crate::transcript::ToolUseBlock;
use minijinja::{Error, context};
use serde_json::{Map, Value};

/// Tools that get a dedicated renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Write,
    Edit,
    Bash,
    TodoWrite,
    Other,
}

impl ToolKind {
    pub fn classify(name: &str) -> Self {
        match tool_key(name).as_str() {
            "write" | "writefile" => Self::Write,
            "edit" | "editfile" => Self::Edit,
            "bash" | "shell" => Self::Bash,
            "todowrite" => Self::TodoWrite,
            _ => Self::Other,
        }
    }
}

/// First string value found under any of `keys`, or "".
fn input_str<'a>(input: &'a Map<String, Value>, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
}

fn input_bool(input: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter()
        .find_map(|key| input.get(*key).and_then(Value::as_bool))
        .unwrap_or(false)
}

/// Text after the last path separator, or the whole path if there is none.
pub fn base_name(path: &str) -> &str {
    match path.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    }
}

/// Normalised todo status plus its icon.
fn todo_status(status: Option<&str>) -> (&'static str, &'static str) {
    match status {
        Some("completed") => ("completed", "✓"),
        Some("in_progress" | "in-progress") => ("in-progress", "→"),
        _ => ("pending", "○"),
    }
}

impl Renderer {
    pub(super) fn render_tool_use(&self, tool: &ToolUseBlock) -> Result<String, Error> {
        match ToolKind::classify(&tool.name) {
            ToolKind::Write => self.render_write(tool),
            ToolKind::Edit => self.render_edit(tool),
            ToolKind::Bash => self.render_bash(tool),
            ToolKind::TodoWrite => self.render_todos(tool),
            ToolKind::Other => self.render_generic_tool(tool),
        }
    }

    fn render_write(&self, tool: &ToolUseBlock) -> Result<String, Error> {
        let file_path = input_str(&tool.input, &["file_path", "filePath"]);
        self.render(
            "tool_write.html",
            context! {
                id => &tool.id,
                name => &tool.name,
                file_name => base_name(file_path),
                file_path,
                content => input_str(&tool.input, &["content"]),
            },
        )
    }

    fn render_edit(&self, tool: &ToolUseBlock) -> Result<String, Error> {
        let file_path = input_str(&tool.input, &["file_path", "filePath"]);
        self.render(
            "tool_edit.html",
            context! {
                id => &tool.id,
                name => &tool.name,
                file_name => base_name(file_path),
                file_path,
                old_string => input_str(&tool.input, &["old_string", "oldString"]),
                new_string => input_str(&tool.input, &["new_string", "newString"]),
                replace_all => input_bool(&tool.input, &["replace_all", "replaceAll"]),
            },
        )
    }

    fn render_bash(&self, tool: &ToolUseBlock) -> Result<String, Error> {
        let description = input_str(&tool.input, &["description"]);
        self.render(
            "tool_bash.html",
            context! {
                id => &tool.id,
                name => &tool.name,
                description => (!description.is_empty()).then_some(description),
                command => input_str(&tool.input, &["command"]),
            },
        )
    }

    fn render_todos(&self, tool: &ToolUseBlock) -> Result<String, Error> {
        let todos: Vec<minijinja::Value> = tool
            .input
            .get("todos")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|todo| {
                let (status, icon) = todo_status(todo.get("status").and_then(Value::as_str));
                context! {
                    content => todo.get("content").and_then(Value::as_str).unwrap_or_default(),
                    status,
                    icon,
                }
            })
            .collect();
        self.render("tool_todo.html", context! { id => &tool.id, todos })
    }

    fn render_generic_tool(&self, tool: &ToolUseBlock) -> Result<String, Error> {
        let input = serde_json::to_string_pretty(&tool.input).unwrap_or_default();
        let description = input_str(&tool.input, &["description"]);
        self.render(
            "tool_use.html",
            context! {
                id => &tool.id,
                name => &tool.name,
                description => (!description.is_empty()).then_some(description),
                input,
            },
        )
    }
}
