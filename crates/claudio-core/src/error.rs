use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudioError {
    #[error("Invalid hook input: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Soundpack load error: {0}")]
    SoundpackLoad(String),

    #[error("Tracking error: {0}")]
    Tracking(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl ClaudioError {
    /// Returns `true` for errors that should stop the invocation with a
    /// non-zero exit. Every other failure degrades to a quieter outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ClaudioError>;
