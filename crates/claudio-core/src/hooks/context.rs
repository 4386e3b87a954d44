use serde::{Deserialize, Serialize};

/// Coarse intent of a hook invocation. Every candidate path starts with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Loading,
    Success,
    Error,
    Interactive,
    Completion,
    System,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Loading,
        Self::Success,
        Self::Error,
        Self::Interactive,
        Self::Completion,
        Self::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
            Self::Interactive => "interactive",
            Self::Completion => "completion",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loading" => Ok(Self::Loading),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "interactive" => Ok(Self::Interactive),
            "completion" => Ok(Self::Completion),
            "system" => Ok(Self::System),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// The classifier's summary of one hook invocation.
///
/// `tool_name` is what analytics report; when a Bash command is promoted to
/// its program (`git`, `npm`) the host's tool name survives in
/// `original_tool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookContext {
    pub category: Category,
    pub tool_name: Option<String>,
    pub operation: Option<String>,
    pub sound_hint: Option<String>,
    pub original_tool: Option<String>,
}

impl HookContext {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            tool_name: None,
            operation: None,
            sound_hint: None,
            original_tool: None,
        }
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_sound_hint(mut self, hint: impl Into<String>) -> Self {
        self.sound_hint = Some(hint.into());
        self
    }

    pub fn with_original_tool(mut self, tool: impl Into<String>) -> Self {
        self.original_tool = Some(tool.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_and_parse() {
        for category in Category::ALL {
            let parsed: Category = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!("SUCCESS".parse::<Category>().unwrap(), Category::Success);
        assert!("celebration".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::Interactive).unwrap();
        assert_eq!(json, "\"interactive\"");
    }

    #[test]
    fn test_context_builders() {
        let ctx = HookContext::new(Category::Success)
            .with_tool("git")
            .with_operation("git")
            .with_original_tool("Bash");
        assert_eq!(ctx.tool_name.as_deref(), Some("git"));
        assert_eq!(ctx.original_tool.as_deref(), Some("Bash"));
        assert!(ctx.sound_hint.is_none());
    }
}
