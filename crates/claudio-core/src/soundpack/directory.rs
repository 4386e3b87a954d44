use std::io;
use std::path::{Path, PathBuf};

use super::{MapperKind, PathMapper};

/// Soundpack backed by one or more directory trees laid out by candidate
/// path (`<base>/success/git.wav`). Earlier bases shadow later ones.
#[derive(Debug, Clone)]
pub struct DirectoryMapper {
    name: String,
    bases: Vec<PathBuf>,
}

impl DirectoryMapper {
    pub fn new(name: impl Into<String>, bases: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            bases,
        }
    }

    /// A mapper that never finds anything.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }
}

impl PathMapper for DirectoryMapper {
    fn resolve(&self, candidate: &str) -> io::Result<Option<PathBuf>> {
        let mut first_error = None;

        for base in &self.bases {
            let Some(path) = join_candidate(base, candidate) else {
                return Ok(None);
            };
            match is_readable_file(&path) {
                Ok(true) => return Ok(Some(path)),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), "probe failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    fn kind(&self) -> MapperKind {
        MapperKind::Directory
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Join a `/`-separated candidate onto `base` using native separators.
/// Candidates that try to leave the base are refused.
fn join_candidate(base: &Path, candidate: &str) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for part in candidate.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return None;
        }
        path.push(part);
    }
    Some(path)
}

fn is_readable_file(path: &Path) -> io::Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            std::fs::File::open(path)?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
