//! Soundpack manifests compiled into the binary.
//!
//! These map candidates onto sound files that ship with the operating
//! system, so a fresh install makes noise without downloading anything.

use crate::error::{ClaudioError, Result};

use super::json::JsonMapper;

/// Prefix that selects a bundled manifest, e.g. `embedded:mac-system`.
pub const EMBEDDED_PREFIX: &str = "embedded:";

const MAC_SYSTEM: &str = include_str!("../../soundpacks/mac-system.json");
const WSL: &str = include_str!("../../soundpacks/wsl.json");

const BUNDLED: &[(&str, &str)] = &[("mac-system", MAC_SYSTEM), ("wsl", WSL)];

/// Names accepted after [`EMBEDDED_PREFIX`].
pub fn names() -> impl Iterator<Item = &'static str> {
    BUNDLED.iter().map(|(name, _)| *name)
}

pub fn manifest_json(name: &str) -> Option<&'static str> {
    BUNDLED
        .iter()
        .find(|(bundled, _)| *bundled == name)
        .map(|(_, json)| *json)
}

/// Load the bundled manifest called `name`.
pub fn load(name: &str) -> Result<JsonMapper> {
    let json = manifest_json(name).ok_or_else(|| {
        let known: Vec<_> = names().collect();
        ClaudioError::SoundpackLoad(format!(
            "unknown embedded soundpack '{name}', available: {}",
            known.join(", ")
        ))
    })?;
    JsonMapper::from_json(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::DEFAULT_SOUND;
    use crate::soundpack::PathMapper;

    #[test]
    fn test_every_bundled_manifest_parses() {
        for name in names() {
            let mapper = load(name).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(mapper.name(), name);
            assert!(
                mapper.manifest().mappings.contains_key(DEFAULT_SOUND),
                "{name} has no default.wav"
            );
        }
    }

    #[test]
    fn test_bundled_keys_are_candidate_shaped() {
        for name in names() {
            let mapper = load(name).unwrap();
            for key in mapper.manifest().mappings.keys() {
                assert!(key.ends_with(".wav"), "{name}: {key}");
                assert_eq!(key, &key.to_lowercase(), "{name}: {key}");
                assert!(key.split('/').count() <= 2, "{name}: {key}");
            }
        }
    }

    #[test]
    fn test_unknown_embedded_name() {
        let err = load("speak-and-spell").unwrap_err();
        assert!(matches!(err, ClaudioError::SoundpackLoad(msg) if msg.contains("mac-system")));
    }
}
