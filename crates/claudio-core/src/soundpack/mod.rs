mod directory;
pub mod embedded;
mod json;

pub use directory::DirectoryMapper;
pub use json::{JsonMapper, SoundpackManifest};

use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Turns a `/`-separated candidate path into a concrete audio file.
pub trait PathMapper {
    /// `Ok(Some(path))` when the candidate exists in this pack, `Ok(None)`
    /// when it does not. `Err` only for I/O failures other than "not found".
    fn resolve(&self, candidate: &str) -> io::Result<Option<PathBuf>>;

    fn kind(&self) -> MapperKind;

    fn name(&self) -> &str;
}

impl<T: PathMapper + ?Sized> PathMapper for &T {
    fn resolve(&self, candidate: &str) -> io::Result<Option<PathBuf>> {
        (**self).resolve(candidate)
    }

    fn kind(&self) -> MapperKind {
        (**self).kind()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    Directory,
    Json,
}

impl std::fmt::Display for MapperKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Enum wrapper over the two mapper flavours so callers can hold either by
/// value.
#[derive(Debug, Clone)]
pub enum Soundpack {
    Directory(DirectoryMapper),
    Json(JsonMapper),
}

impl PathMapper for Soundpack {
    fn resolve(&self, candidate: &str) -> io::Result<Option<PathBuf>> {
        match self {
            Soundpack::Directory(m) => m.resolve(candidate),
            Soundpack::Json(m) => m.resolve(candidate),
        }
    }

    fn kind(&self) -> MapperKind {
        match self {
            Soundpack::Directory(m) => m.kind(),
            Soundpack::Json(m) => m.kind(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Soundpack::Directory(m) => m.name(),
            Soundpack::Json(m) => m.name(),
        }
    }
}

/// Pick and build a mapper for `identifier`.
///
/// 1. `embedded:<name>` → bundled JSON manifest.
/// 2. ends with `.json`, or names a regular file → JSON manifest on disk.
/// 3. names a directory → that directory tree.
/// 4. otherwise → `<base>/<identifier>` under every search base that has
///    it; failing that, `<base>/<identifier>.json`; failing that, a mapper
///    with no bases that misses on every probe.
pub fn create_mapper(identifier: &str, search_bases: &[PathBuf]) -> Result<Soundpack> {
    if let Some(name) = identifier.strip_prefix(embedded::EMBEDDED_PREFIX) {
        return embedded::load(name).map(Soundpack::Json);
    }

    let path = Path::new(identifier);
    if identifier.ends_with(".json") || path.is_file() {
        return JsonMapper::load(path).map(Soundpack::Json);
    }

    if path.is_dir() {
        return Ok(Soundpack::Directory(DirectoryMapper::new(
            identifier,
            vec![path.to_path_buf()],
        )));
    }

    let bases: Vec<PathBuf> = search_bases
        .iter()
        .map(|base| base.join(identifier))
        .filter(|candidate| candidate.is_dir())
        .collect();

    if bases.is_empty() {
        let manifest = search_bases
            .iter()
            .map(|base| base.join(format!("{identifier}.json")))
            .find(|candidate| candidate.is_file());
        if let Some(manifest) = manifest {
            return JsonMapper::load(&manifest).map(Soundpack::Json);
        }
        tracing::debug!(
            soundpack = identifier,
            searched = search_bases.len(),
            "soundpack not found in any search path"
        );
    }

    Ok(Soundpack::Directory(DirectoryMapper::new(identifier, bases)))
}

/// Like [`create_mapper`], but a pack that fails to load degrades to an
/// empty mapper instead of an error.
pub fn create_mapper_or_empty(identifier: &str, search_bases: &[PathBuf]) -> Soundpack {
    match create_mapper(identifier, search_bases) {
        Ok(mapper) => mapper,
        Err(e) => {
            tracing::warn!("soundpack '{identifier}' unavailable, continuing silently: {e}");
            Soundpack::Directory(DirectoryMapper::empty(identifier))
        }
    }
}
