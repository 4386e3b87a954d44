use crate::error::{ClaudioError, Result};
use crate::paths;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudioConfig {
    /// Playback volume in `[0.0, 1.0]`.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Soundpack identifier: a name, a directory, a `.json` manifest or
    /// `embedded:<name>`.
    #[serde(default = "default_soundpack")]
    pub default_soundpack: String,
    /// Extra directories searched for named soundpacks, before the XDG ones.
    #[serde(default)]
    pub soundpack_paths: Vec<PathBuf>,
    /// When false, hooks are still parsed and tracked but nothing plays.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_audio_backend")]
    pub audio_backend: String,
    #[serde(default)]
    pub sound_tracking: SoundTrackingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundTrackingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Defaults to `~/.cache/claudio/sound-tracking.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for SoundTrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None,
        }
    }
}

impl Default for ClaudioConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            default_soundpack: default_soundpack(),
            soundpack_paths: Vec::new(),
            enabled: true,
            log_level: default_log_level(),
            audio_backend: default_audio_backend(),
            sound_tracking: SoundTrackingConfig::default(),
        }
    }
}

/// Values given on the command line; they beat files and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub volume: Option<f32>,
    pub soundpack: Option<String>,
    pub silent: bool,
    pub log_level: Option<String>,
    pub no_tracking: bool,
}

/// Valid log level names.
pub const VALID_LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// Valid audio backend names.
pub const VALID_AUDIO_BACKENDS: &[&str] = &["auto", "system_command", "none"];

// -- Defaults --

fn default_volume() -> f32 {
    0.5
}
fn default_soundpack() -> String {
    "default".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_audio_backend() -> String {
    "auto".to_string()
}
fn default_true() -> bool {
    true
}

impl ClaudioConfig {
    /// Load configuration from every layer, lowest precedence first:
    /// 1. /etc/xdg/claudio/config.json (system)
    /// 2. ~/.config/claudio/config.json (user)
    /// 3. `explicit`, which must exist when given
    /// 4. `CLAUDIO_*` environment variables
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, &CliOverrides::default())
    }

    /// Like [`ClaudioConfig::load`], with command-line overrides applied on
    /// top. Validation runs once, on the merged result.
    pub fn load_with(explicit: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut layers = vec![paths::system_config_path()];
        if let Some(user) = paths::user_config_path() {
            layers.push(user);
        }

        let mut cfg = Self::from_files(&layers, explicit)?;
        cfg.apply_env_from(|key| std::env::var(key).ok())?;
        cfg.apply_cli(overrides);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Merge JSON files in order. Missing `layers` are skipped; a missing
    /// `explicit` file is an error.
    pub fn from_files(layers: &[PathBuf], explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for layer in layers {
            if layer.is_file() {
                builder = builder.add_source(
                    File::from(layer.as_path())
                        .format(FileFormat::Json)
                        .required(false),
                );
            }
        }

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ClaudioError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Json).required(true));
        }

        let config = builder
            .build()
            .map_err(|e| ClaudioError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ClaudioError::Config(e.to_string()))
    }

    /// Apply `CLAUDIO_*` overrides read through `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("CLAUDIO_VOLUME") {
            self.volume = raw.trim().parse().map_err(|_| {
                ClaudioError::Config(format!("CLAUDIO_VOLUME is not a number: '{raw}'"))
            })?;
        }
        if let Some(pack) = lookup("CLAUDIO_SOUNDPACK") {
            self.default_soundpack = pack;
        }
        if let Some(raw) = lookup("CLAUDIO_ENABLED") {
            self.enabled = parse_bool("CLAUDIO_ENABLED", &raw)?;
        }
        if let Some(level) = lookup("CLAUDIO_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(raw) = lookup("CLAUDIO_SOUND_TRACKING") {
            self.sound_tracking.enabled = parse_bool("CLAUDIO_SOUND_TRACKING", &raw)?;
        }
        if let Some(db) = lookup("CLAUDIO_SOUND_TRACKING_DB") {
            self.sound_tracking.database_path = Some(PathBuf::from(db));
        }
        if let Some(backend) = lookup("CLAUDIO_AUDIO_BACKEND") {
            self.audio_backend = backend;
        }
        Ok(())
    }

    pub fn apply_cli(&mut self, overrides: &CliOverrides) {
        if let Some(volume) = overrides.volume {
            self.volume = volume;
        }
        if let Some(ref pack) = overrides.soundpack {
            self.default_soundpack = pack.clone();
        }
        if overrides.silent {
            self.enabled = false;
        }
        if let Some(ref level) = overrides.log_level {
            self.log_level = level.clone();
        }
        if overrides.no_tracking {
            self.sound_tracking.enabled = false;
        }
    }

    /// Reject out-of-range or unknown values. Level and backend names are
    /// normalised to lowercase.
    pub fn validate(&mut self) -> Result<()> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(ClaudioError::Config(format!(
                "volume {} out of range [0.0, 1.0]",
                self.volume
            )));
        }

        if self.default_soundpack.trim().is_empty() {
            return Err(ClaudioError::Config(
                "default_soundpack must not be empty".to_string(),
            ));
        }

        self.log_level = self.log_level.trim().to_lowercase();
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ClaudioError::Config(format!(
                "unknown log level '{}', valid: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        self.audio_backend = self.audio_backend.trim().to_lowercase();
        if !VALID_AUDIO_BACKENDS.contains(&self.audio_backend.as_str()) {
            return Err(ClaudioError::Config(format!(
                "unknown audio backend '{}', valid: {}",
                self.audio_backend,
                VALID_AUDIO_BACKENDS.join(", ")
            )));
        }

        Ok(())
    }

    /// Soundpack search directories for this configuration.
    pub fn soundpack_search_bases(&self) -> Vec<PathBuf> {
        paths::soundpack_search_bases(&self.soundpack_paths)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ClaudioError::Config(format!(
            "{name} must be true/false, got '{raw}'"
        ))),
    }
}
