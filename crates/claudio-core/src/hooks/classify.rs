use std::path::Path;

use serde::Serialize;

use crate::error::{ClaudioError, Result};

use super::context::{Category, HookContext};
use super::event::{HookEvent, HookEventKind};

/// Tools whose operation is the extension of the file they touch.
const FILE_TOOLS: &[&str] = &["Read", "Edit", "Write", "MultiEdit"];

/// Characters that may glue a pipe or redirect onto the front of a command.
const SHELL_PUNCTUATION: &[char] = &['|', '<', '>', '&', ';', '(', ')'];

/// A validated hook invocation: who sent it and what it means.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedHook {
    pub session_id: String,
    pub hook_event_name: String,
    #[serde(skip)]
    pub kind: HookEventKind,
    pub context: HookContext,
}

/// Parse raw stdin bytes into a classified hook.
///
/// Only a missing/empty `hook_event_name` or `session_id` (or input that is
/// not a JSON object) fails; every other oddity leaves the affected context
/// field empty.
pub fn parse(raw: &[u8]) -> Result<ParsedHook> {
    let event = HookEvent::from_slice(raw)?;
    classify(&event)
}

/// Convenience for callers that only need the context.
pub fn parse_context(raw: &[u8]) -> Result<HookContext> {
    parse(raw).map(|parsed| parsed.context)
}

pub fn classify(event: &HookEvent) -> Result<ParsedHook> {
    let hook_event_name = required(event.hook_event_name.as_deref(), "hook_event_name")?;
    let session_id = required(event.session_id.as_deref(), "session_id")?;
    let kind = HookEventKind::parse(&hook_event_name);

    let context = build_context(event, kind);
    tracing::debug!(
        event = %hook_event_name,
        category = %context.category,
        tool = ?context.tool_name,
        operation = ?context.operation,
        hint = ?context.sound_hint,
        "classified hook event"
    );

    Ok(ParsedHook {
        session_id,
        hook_event_name,
        kind,
        context,
    })
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ClaudioError::Input(format!(
            "missing required field `{field}`"
        ))),
    }
}

fn build_context(event: &HookEvent, kind: HookEventKind) -> HookContext {
    let mut context = HookContext::new(category_for(event, kind));

    let tool = event
        .tool_name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let operation = tool.and_then(|t| extract_operation(event, t));

    if let Some(hint) = event
        .input_str("sound_hint")
        .map(str::trim)
        .filter(|h| !h.is_empty())
    {
        context = context.with_sound_hint(hint);
    }

    match (tool, operation) {
        (Some("Bash"), Some(op)) => {
            context = context
                .with_tool(op.clone())
                .with_operation(op)
                .with_original_tool("Bash");
        }
        (Some(t), Some(op)) => {
            context = context.with_tool(t).with_operation(op);
        }
        (Some(t), None) => {
            context = context.with_tool(t);
        }
        (None, _) => {}
    }

    context
}

/// Apply the event → category table.
pub fn category_for(event: &HookEvent, kind: HookEventKind) -> Category {
    match kind {
        HookEventKind::PreToolUse => Category::Loading,
        HookEventKind::PostToolUse => match event.response() {
            Some(response) if response.is_failure() => Category::Error,
            _ => Category::Success,
        },
        HookEventKind::UserPromptSubmit | HookEventKind::Notification => Category::Interactive,
        HookEventKind::Stop | HookEventKind::SubagentStop => Category::Completion,
        HookEventKind::Other => Category::System,
    }
}

fn extract_operation(event: &HookEvent, tool: &str) -> Option<String> {
    if tool == "Bash" {
        return event.input_str("command").and_then(bash_program);
    }
    if FILE_TOOLS.contains(&tool) {
        return event.input_str("file_path").and_then(file_extension);
    }
    None
}

/// First program named by a shell command line, lower-cased.
///
/// Looks at the first whitespace-delimited word only, after peeling off
/// leading pipe/redirect punctuation and any directory prefix. Leading
/// `NAME=value` environment assignments are skipped.
pub fn bash_program(command: &str) -> Option<String> {
    let word = command
        .split_whitespace()
        .find(|w| !is_env_assignment(w))?;

    let word = word.trim_start_matches(SHELL_PUNCTUATION);
    let word = word.trim_end_matches(SHELL_PUNCTUATION);
    let word = word.rsplit('/').next().unwrap_or(word);

    if word.is_empty() {
        None
    } else {
        Some(word.to_lowercase())
    }
}

fn is_env_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Lower-cased extension of `path` without the leading dot.
pub fn file_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}
