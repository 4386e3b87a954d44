use std::path::PathBuf;

use serde::Serialize;

use crate::fallback::{self, Candidate, DEFAULT_LEVEL, DEFAULT_SOUND};
use crate::hooks::HookContext;
use crate::soundpack::PathMapper;

/// One mapper lookup, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub path: String,
    pub found: bool,
}

/// Outcome of resolving a context against a soundpack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Candidate path that was selected (`default.wav` when nothing matched).
    pub selected_path: String,
    pub fallback_level: u8,
    pub total_candidates: usize,
    pub probes: Vec<Probe>,
    /// Concrete file for `selected_path`, if the pack actually has it.
    pub file: Option<PathBuf>,
}

impl Resolution {
    pub fn found(&self) -> bool {
        self.file.is_some()
    }
}

/// Walks the fallback candidates of a context and stops at the first one the
/// mapper can serve. Never fails.
#[derive(Debug)]
pub struct Resolver<M> {
    mapper: M,
}

impl<M: PathMapper> Resolver<M> {
    pub fn new(mapper: M) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn resolve(&self, ctx: &HookContext) -> Resolution {
        let candidates = fallback::candidates(ctx);
        self.resolve_candidates(&candidates)
    }

    pub fn resolve_candidates(&self, candidates: &[Candidate]) -> Resolution {
        let mut probes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let file = self.probe(&candidate.path);
            probes.push(Probe {
                path: candidate.path.clone(),
                found: file.is_some(),
            });
            if let Some(file) = file {
                tracing::debug!(
                    soundpack = self.mapper.name(),
                    selected = %candidate.path,
                    level = candidate.level(),
                    file = %file.display(),
                    "resolved sound"
                );
                return Resolution {
                    selected_path: candidate.path.clone(),
                    fallback_level: candidate.level(),
                    total_candidates: candidates.len(),
                    probes,
                    file: Some(file),
                };
            }
        }

        // Generated lists always end in default.wav, so this only adds a
        // probe for hand-built candidate lists.
        let mut file = None;
        if !probes.iter().any(|p| p.path == DEFAULT_SOUND) {
            file = self.probe(DEFAULT_SOUND);
            probes.push(Probe {
                path: DEFAULT_SOUND.to_string(),
                found: file.is_some(),
            });
        }

        tracing::debug!(
            soundpack = self.mapper.name(),
            probed = probes.len(),
            "no candidate matched, using default"
        );
        Resolution {
            selected_path: DEFAULT_SOUND.to_string(),
            fallback_level: DEFAULT_LEVEL,
            total_candidates: candidates.len(),
            probes,
            file,
        }
    }

    fn probe(&self, candidate: &str) -> Option<PathBuf> {
        match self.mapper.resolve(candidate) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    soundpack = self.mapper.name(),
                    candidate,
                    "lookup failed, treating as missing: {e}"
                );
                None
            }
        }
    }
}
