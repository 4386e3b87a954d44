mod queries;
mod sqlite;

pub use queries::{FallbackLevelStat, FallbackStats, MissingSound, QueryFilter, SoundUsage};
pub use sqlite::{EventRecorder, SqliteTracker, SCHEMA_VERSION};

use crate::config::SoundTrackingConfig;
use crate::hooks::ParsedHook;
use crate::paths;
use crate::resolver::{Resolution, Resolver};
use crate::soundpack::PathMapper;

/// Where resolutions get recorded. Tracking never changes which sound is
/// selected; any failure here is logged and swallowed.
pub enum Tracker {
    Sqlite(SqliteTracker),
    Noop,
}

impl Tracker {
    /// Open the tracker described by `config`. Disabled tracking never
    /// touches the filesystem; a database that cannot be opened degrades to
    /// [`Tracker::Noop`].
    pub fn open(config: &SoundTrackingConfig) -> Self {
        if !config.enabled {
            return Tracker::Noop;
        }
        let Some(path) = config
            .database_path
            .clone()
            .or_else(paths::default_tracking_db)
        else {
            tracing::warn!("no cache directory available, sound tracking disabled");
            return Tracker::Noop;
        };

        match SqliteTracker::open(&path) {
            Ok(tracker) => {
                tracing::debug!(path = %path.display(), "sound tracking enabled");
                Tracker::Sqlite(tracker)
            }
            Err(e) => {
                tracing::warn!("sound tracking disabled: {e}");
                Tracker::Noop
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Tracker::Sqlite(_))
    }

    /// Resolve `hook` with `resolver`, recording the event and every probe.
    ///
    /// The event row is written before the first probe and committed after
    /// the last, so a crash in between leaves nothing behind.
    pub fn track<M: PathMapper>(&mut self, resolver: &Resolver<M>, hook: &ParsedHook) -> Resolution {
        let tracker = match self {
            Tracker::Sqlite(tracker) => tracker,
            Tracker::Noop => return resolver.resolve(&hook.context),
        };

        let timestamp = chrono::Utc::now().timestamp();
        let recorder = match tracker.begin_event(hook, timestamp) {
            Ok(recorder) => recorder,
            Err(e) => {
                tracing::warn!("failed to record hook event: {e}");
                return resolver.resolve(&hook.context);
            }
        };

        let resolution = resolver.resolve(&hook.context);
        match recorder.finish(&resolution) {
            Ok(event_id) => tracing::debug!(event_id, probes = resolution.probes.len(), "tracked resolution"),
            Err(e) => tracing::warn!("failed to record path lookups: {e}"),
        }
        resolution
    }
}

/// A [`Resolver`] paired with a [`Tracker`]: resolves exactly like the
/// resolver alone and records what it did on the side.
pub struct TrackingResolver<M> {
    resolver: Resolver<M>,
    tracker: Tracker,
}

impl<M: PathMapper> TrackingResolver<M> {
    pub fn new(resolver: Resolver<M>, tracker: Tracker) -> Self {
        Self { resolver, tracker }
    }

    pub fn resolver(&self) -> &Resolver<M> {
        &self.resolver
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn resolve(&mut self, hook: &ParsedHook) -> Resolution {
        self.tracker.track(&self.resolver, hook)
    }
}
