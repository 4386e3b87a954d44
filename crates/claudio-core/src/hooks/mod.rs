//! Claude Code hook payloads and their classification into a [`HookContext`].

pub mod classify;
pub mod context;
pub mod event;

pub use classify::{classify, parse, parse_context, ParsedHook};
pub use context::{Category, HookContext};
pub use event::{HookEvent, HookEventKind, ToolResponse};
