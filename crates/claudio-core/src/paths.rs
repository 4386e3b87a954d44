//! Platform directories for config files, soundpacks and the tracking store.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "claudio";
const SOUNDPACKS_DIR: &str = "soundpacks";
const CONFIG_FILE: &str = "config.json";
const TRACKING_DB: &str = "sound-tracking.db";

/// Used when `XDG_DATA_DIRS` is unset or empty.
const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// System-wide config file, lowest precedence.
pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/xdg").join(APP_DIR).join(CONFIG_FILE)
}

/// Per-user config file: `~/.config/claudio/config.json`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
}

/// Default tracking database: `~/.cache/claudio/sound-tracking.db`.
pub fn default_tracking_db() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join(APP_DIR).join(TRACKING_DB))
}

/// Directories searched for named soundpacks, highest priority first.
pub fn soundpack_search_bases(configured: &[PathBuf]) -> Vec<PathBuf> {
    let xdg_data_dirs = std::env::var("XDG_DATA_DIRS").ok();
    search_bases_with(
        configured,
        dirs::data_dir().as_deref(),
        dirs::config_dir().as_deref(),
        xdg_data_dirs.as_deref(),
    )
}

fn search_bases_with(
    configured: &[PathBuf],
    data_home: Option<&Path>,
    config_home: Option<&Path>,
    xdg_data_dirs: Option<&str>,
) -> Vec<PathBuf> {
    let data_dirs = xdg_data_dirs
        .filter(|dirs| !dirs.trim().is_empty())
        .unwrap_or(DEFAULT_DATA_DIRS);

    let user = [data_home, config_home]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(APP_DIR).join(SOUNDPACKS_DIR));
    let system = data_dirs
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(APP_DIR).join(SOUNDPACKS_DIR));

    let mut bases: Vec<PathBuf> = Vec::new();
    for base in configured.iter().cloned().chain(user).chain(system) {
        if !bases.contains(&base) {
            bases.push(base);
        }
    }
    bases
}
