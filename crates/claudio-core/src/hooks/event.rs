use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ClaudioError, Result};

/// JSON payload received from Claude Code hooks on stdin.
///
/// Every field is optional at the wire level so that a malformed field
/// (a numeric `tool_name`, a non-string `prompt`) degrades to `None` instead
/// of failing the whole parse. Required fields are checked by the classifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub hook_event_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_response: Option<Value>,
    /// Present on UserPromptSubmit events.
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
}

impl HookEvent {
    /// Decode raw stdin bytes. Invalid UTF-8 is replaced rather than
    /// rejected; anything that is not a JSON object is an input error.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(v) => v,
            Err(strict_err) => {
                let lossy = String::from_utf8_lossy(raw);
                serde_json::from_str(&lossy).map_err(|_| {
                    ClaudioError::Input(format!("stdin is not valid JSON: {strict_err}"))
                })?
            }
        };

        if !value.is_object() {
            return Err(ClaudioError::Input(
                "hook payload must be a JSON object".into(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| ClaudioError::Input(format!("malformed hook payload: {e}")))
    }

    /// The `tool_response` object, if the host sent one.
    pub fn response(&self) -> Option<ToolResponse> {
        self.tool_response.as_ref().and_then(ToolResponse::from_value)
    }

    /// Look up a string field of `tool_input`, ignoring non-string values.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.get(key).and_then(Value::as_str)
    }
}

/// The subset of `tool_response` that decides success vs. error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolResponse {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub interrupted: bool,
}

impl ToolResponse {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            stdout: text("stdout"),
            stderr: text("stderr"),
            interrupted: obj
                .get("interrupted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    pub fn is_failure(&self) -> bool {
        self.interrupted || self.stderr.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Lifecycle events Claude Code can invoke a hook for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEventKind {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    Notification,
    Stop,
    SubagentStop,
    /// Any event name this version does not know about.
    Other,
}

impl HookEventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "PreToolUse" => Self::PreToolUse,
            "PostToolUse" => Self::PostToolUse,
            "UserPromptSubmit" => Self::UserPromptSubmit,
            "Notification" => Self::Notification,
            "Stop" => Self::Stop,
            "SubagentStop" => Self::SubagentStop,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for HookEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreToolUse => write!(f, "PreToolUse"),
            Self::PostToolUse => write!(f, "PostToolUse"),
            Self::UserPromptSubmit => write!(f, "UserPromptSubmit"),
            Self::Notification => write!(f, "Notification"),
            Self::Stop => write!(f, "Stop"),
            Self::SubagentStop => write!(f, "SubagentStop"),
            Self::Other => write!(f, "Other"),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
