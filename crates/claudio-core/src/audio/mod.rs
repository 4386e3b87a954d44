mod system;

pub use system::{Player, SystemCommandBackend};

use std::path::Path;

use crate::error::{ClaudioError, Result};

/// Something that can make a sound file audible.
pub trait AudioBackend {
    fn name(&self) -> &str;

    /// Start playing `path` at `volume` in `[0.0, 1.0]`. Must not block until
    /// playback ends.
    fn play(&self, path: &Path, volume: f32) -> Result<()>;
}

/// Accepts and drops every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

impl AudioBackend for NoopBackend {
    fn name(&self) -> &str {
        "none"
    }

    fn play(&self, path: &Path, _volume: f32) -> Result<()> {
        tracing::debug!(path = %path.display(), "audio disabled, not playing");
        Ok(())
    }
}

/// Build the backend named by `audio_backend` in the config.
///
/// `auto` quietly degrades to [`NoopBackend`] when no player is installed;
/// an explicit `system_command` without a player is a playback error.
pub fn create_backend(name: &str) -> Result<Box<dyn AudioBackend>> {
    match name {
        "none" => Ok(Box::new(NoopBackend)),
        "system_command" => SystemCommandBackend::detect()
            .map(|b| Box::new(b) as Box<dyn AudioBackend>)
            .ok_or_else(|| {
                ClaudioError::Playback(format!(
                    "no audio player found on PATH (tried {})",
                    Player::ALL.map(|p| p.program()).join(", ")
                ))
            }),
        "auto" => match SystemCommandBackend::detect() {
            Some(backend) => Ok(Box::new(backend)),
            None => {
                tracing::warn!("no audio player found on PATH, playback disabled");
                Ok(Box::new(NoopBackend))
            }
        },
        other => Err(ClaudioError::Config(format!(
            "unknown audio backend '{other}'"
        ))),
    }
}
