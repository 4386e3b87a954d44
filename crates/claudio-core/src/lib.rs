//! Claudio core: turns Claude Code hook events into sound file selections.
//!
//! A hook payload is classified into a [`hooks::HookContext`], expanded into
//! an ordered list of candidate sound paths by [`fallback`], and resolved
//! against a soundpack by [`resolver::Resolver`]. Every resolution can be
//! recorded by [`tracking`] for later analysis.

pub mod audio;
pub mod config;
pub mod error;
pub mod fallback;
pub mod hook;
pub mod hooks;
pub mod paths;
pub mod resolver;
pub mod soundpack;
pub mod tracking;

pub use error::{ClaudioError, Result};
pub use hook::{run_hook, HookOutcome};
