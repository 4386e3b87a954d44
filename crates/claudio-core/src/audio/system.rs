use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{ClaudioError, Result};

use super::AudioBackend;

/// Command-line players we know how to drive, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    Afplay,
    Paplay,
    PwPlay,
    Ffplay,
    Aplay,
}

impl Player {
    pub const ALL: [Player; 5] = [
        Player::Afplay,
        Player::Paplay,
        Player::PwPlay,
        Player::Ffplay,
        Player::Aplay,
    ];

    pub fn program(self) -> &'static str {
        match self {
            Player::Afplay => "afplay",
            Player::Paplay => "paplay",
            Player::PwPlay => "pw-play",
            Player::Ffplay => "ffplay",
            Player::Aplay => "aplay",
        }
    }

    /// Arguments for playing `path` at `volume`. Players without a volume
    /// control play at their own level.
    pub fn args(self, path: &Path, volume: f32) -> Vec<OsString> {
        let volume = volume.clamp(0.0, 1.0);
        let mut args: Vec<OsString> = match self {
            Player::Afplay => vec!["-v".into(), format!("{volume:.2}").into()],
            // PulseAudio volume is linear with 65536 as 100%.
            Player::Paplay => vec![format!("--volume={}", (volume * 65536.0).round() as u32).into()],
            Player::PwPlay => vec![format!("--volume={volume:.2}").into()],
            Player::Ffplay => vec![
                "-nodisp".into(),
                "-autoexit".into(),
                "-loglevel".into(),
                "quiet".into(),
                "-volume".into(),
                format!("{}", (volume * 100.0).round() as u32).into(),
            ],
            Player::Aplay => vec!["-q".into()],
        };
        args.push(path.as_os_str().to_os_string());
        args
    }
}

/// Plays files by spawning an external player and not waiting for it.
#[derive(Debug, Clone)]
pub struct SystemCommandBackend {
    player: Player,
    program: PathBuf,
}

impl SystemCommandBackend {
    pub fn new(player: Player, program: impl Into<PathBuf>) -> Self {
        Self {
            player,
            program: program.into(),
        }
    }

    /// First known player found on `PATH`.
    pub fn detect() -> Option<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::detect_in(std::env::var_os("PATH"), cwd)
    }

    pub fn detect_in(search_path: Option<impl AsRef<OsStr>>, cwd: impl AsRef<Path>) -> Option<Self> {
        let search_path = search_path?;
        Player::ALL.into_iter().find_map(|player| {
            which::which_in(player.program(), Some(search_path.as_ref()), cwd.as_ref())
                .ok()
                .map(|program| {
                    tracing::debug!(player = player.program(), path = %program.display(), "found audio player");
                    Self::new(player, program)
                })
        })
    }

    pub fn player(&self) -> Player {
        self.player
    }
}

impl AudioBackend for SystemCommandBackend {
    fn name(&self) -> &str {
        self.player.program()
    }

    fn play(&self, path: &Path, volume: f32) -> Result<()> {
        let child = Command::new(&self.program)
            .args(self.player.args(path, volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ClaudioError::Playback(format!(
                    "failed to start {}: {e}",
                    self.program.display()
                ))
            })?;

        tracing::debug!(
            player = self.player.program(),
            pid = child.id(),
            file = %path.display(),
            volume,
            "playback started"
        );
        Ok(())
    }
}
