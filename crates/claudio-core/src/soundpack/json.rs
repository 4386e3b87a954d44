use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClaudioError, Result};

use super::{MapperKind, PathMapper};

/// On-disk description of a JSON soundpack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundpackManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// Candidate path → absolute audio file.
    pub mappings: BTreeMap<String, PathBuf>,
}

impl SoundpackManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)
            .map_err(|e| ClaudioError::SoundpackLoad(format!("invalid soundpack manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClaudioError::SoundpackLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ClaudioError::SoundpackLoad(
                "soundpack manifest has an empty name".into(),
            ));
        }
        if let Some((key, target)) = self.mappings.iter().find(|(_, t)| !is_absolute(t)) {
            return Err(ClaudioError::SoundpackLoad(format!(
                "soundpack '{}' maps {key} to relative path {}",
                self.name,
                target.display()
            )));
        }
        Ok(())
    }
}

/// `/System/...` on a Windows build, or `C:\...` on a Unix build, still
/// counts as absolute; embedded packs are written for one platform each.
fn is_absolute(path: &Path) -> bool {
    if path.is_absolute() || path.has_root() {
        return true;
    }
    let raw = path.to_string_lossy();
    let bytes = raw.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Soundpack backed by an explicit candidate → file table.
#[derive(Debug, Clone)]
pub struct JsonMapper {
    manifest: SoundpackManifest,
}

impl JsonMapper {
    pub fn new(manifest: SoundpackManifest) -> Self {
        Self { manifest }
    }

    pub fn load(path: &Path) -> Result<Self> {
        SoundpackManifest::load(path).map(Self::new)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        SoundpackManifest::from_json(json).map(Self::new)
    }

    pub fn manifest(&self) -> &SoundpackManifest {
        &self.manifest
    }
}

impl PathMapper for JsonMapper {
    fn resolve(&self, candidate: &str) -> io::Result<Option<PathBuf>> {
        let Some(target) = self.manifest.mappings.get(candidate) else {
            return Ok(None);
        };
        match std::fs::metadata(target) {
            Ok(meta) if meta.is_file() => Ok(Some(target.clone())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    soundpack = %self.manifest.name,
                    candidate,
                    target = %target.display(),
                    "mapped file does not exist"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn kind(&self) -> MapperKind {
        MapperKind::Json
    }

    fn name(&self) -> &str {
        &self.manifest.name
    }
}
