//! Ordered candidate sound paths for a hook context.
//!
//! Candidates run from the most specific sound a pack could provide down to
//! the universal `default.wav`:
//!
//! | tier | level | entries                                   |
//! |------|-------|-------------------------------------------|
//! | 1    | 1     | `C/H.wav`                                 |
//! | 2    | 2     | `C/T-O.wav`, `C/T_O.wav`                  |
//! | 3    | 3     | `C/T.wav`, `C/T-generic.wav`, `C/<orig>.wav` |
//! | 4    | 4     | `C/O.wav`                                 |
//! | 5    | 5     | `C.wav`, `C/default.wav`                  |
//! | 6    | 5     | `default.wav`                             |
//!
//! `C` category, `T` tool, `O` operation, `H` sound hint, `orig` the tool a
//! Bash command was promoted from.

use std::collections::HashSet;

use serde::Serialize;

use crate::hooks::HookContext;

/// The only path every candidate list contains, always last.
pub const DEFAULT_SOUND: &str = "default.wav";

/// Level assigned to the universal fallback.
pub const DEFAULT_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ExactHint,
    ToolOperation,
    ToolSpecific,
    OperationSpecific,
    CategoryDefault,
    Universal,
}

impl Tier {
    /// Fallback level recorded for a sound selected in this tier.
    pub fn level(&self) -> u8 {
        match self {
            Self::ExactHint => 1,
            Self::ToolOperation => 2,
            Self::ToolSpecific => 3,
            Self::OperationSpecific => 4,
            Self::CategoryDefault | Self::Universal => DEFAULT_LEVEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub path: String,
    pub tier: Tier,
}

impl Candidate {
    fn new(path: String, tier: Tier) -> Self {
        Self { path, tier }
    }

    pub fn level(&self) -> u8 {
        self.tier.level()
    }
}

/// Build the candidate list for `ctx`. Pure and deterministic; never empty.
pub fn candidates(ctx: &HookContext) -> Vec<Candidate> {
    let category = ctx.category.as_str();
    let tool = ctx.tool_name.as_deref().map(sanitize).filter(|s| !s.is_empty());
    let operation = ctx.operation.as_deref().map(sanitize).filter(|s| !s.is_empty());
    let hint = ctx
        .sound_hint
        .as_deref()
        .map(strip_wav)
        .map(sanitize)
        .filter(|s| !s.is_empty());
    let original = ctx
        .original_tool
        .as_deref()
        .map(sanitize)
        .filter(|s| !s.is_empty());

    let mut out = CandidateList::default();

    if let Some(h) = &hint {
        out.push(format!("{category}/{h}.wav"), Tier::ExactHint);
    }

    if let (Some(t), Some(o)) = (&tool, &operation) {
        if t != o {
            out.push(format!("{category}/{t}-{o}.wav"), Tier::ToolOperation);
            out.push(format!("{category}/{t}_{o}.wav"), Tier::ToolOperation);
        }
    }

    if let Some(t) = &tool {
        out.push(format!("{category}/{t}.wav"), Tier::ToolSpecific);
        out.push(format!("{category}/{t}-generic.wav"), Tier::ToolSpecific);
    }
    if let Some(orig) = &original {
        out.push(format!("{category}/{orig}.wav"), Tier::ToolSpecific);
    }

    if let Some(o) = &operation {
        out.push(format!("{category}/{o}.wav"), Tier::OperationSpecific);
    }

    out.push(format!("{category}.wav"), Tier::CategoryDefault);
    out.push(format!("{category}/default.wav"), Tier::CategoryDefault);
    out.push(DEFAULT_SOUND.to_string(), Tier::Universal);

    out.items
}

/// Just the paths, in probe order.
pub fn candidate_paths(ctx: &HookContext) -> Vec<String> {
    candidates(ctx).into_iter().map(|c| c.path).collect()
}

/// Lower-case and keep only ASCII alphanumerics, `-` and `_`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn strip_wav(hint: &str) -> &str {
    let len = hint.len();
    if len >= 4 && hint.is_char_boundary(len - 4) && hint[len - 4..].eq_ignore_ascii_case(".wav") {
        &hint[..len - 4]
    } else {
        hint
    }
}

#[derive(Default)]
struct CandidateList {
    items: Vec<Candidate>,
    seen: HashSet<String>,
}

impl CandidateList {
    fn push(&mut self, path: String, tier: Tier) {
        if self.seen.insert(path.clone()) {
            self.items.push(Candidate::new(path, tier));
        }
    }
}
