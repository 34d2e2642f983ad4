use serde_json::{Value, json};
use std::path::Path;
use std::process::Command;

/// Run the binary with `args` from `cwd`, returning (exit code, stdout, stderr).
pub fn run_cli(cwd: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_claudescroll"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn binary");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

pub fn prompt(ts: &str, text: &str) -> Value {
    json!({ "type": "user", "timestamp": ts, "message": { "role": "user", "content": text } })
}

pub fn reply(ts: &str, text: &str) -> Value {
    json!({
        "type": "assistant",
        "timestamp": ts,
        "message": { "role": "assistant", "content": [{ "type": "text", "text": text }] }
    })
}

pub fn tool_result(ts: &str, content: &str) -> Value {
    json!({
        "type": "user",
        "timestamp": ts,
        "message": { "role": "user", "content": [
            { "type": "tool_result", "tool_use_id": "toolu_1", "content": content }
        ] }
    })
}

/// Serialize entries one per line.
pub fn jsonl(entries: &[Value]) -> String {
    entries.iter().map(|e| format!("{e}\n")).collect()
}

/// Sorted file names in `dir`.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
