//! One hook invocation from raw payload to (possibly) a sound.

use serde::Serialize;

use crate::audio::AudioBackend;
use crate::config::ClaudioConfig;
use crate::error::Result;
use crate::hooks::{self, HookContext};
use crate::resolver::{Resolution, Resolver};
use crate::soundpack;
use crate::tracking::Tracker;

/// What a hook invocation did.
#[derive(Debug, Clone, Serialize)]
pub struct HookOutcome {
    pub hook_event_name: String,
    pub context: HookContext,
    pub resolution: Resolution,
    /// Whether playback was started.
    pub played: bool,
}

/// Parse `input`, resolve a sound against the configured soundpack, record
/// the resolution and hand the file to `backend`.
///
/// Only a malformed payload is an error. Soundpack, tracking and playback
/// failures are logged and the invocation still succeeds.
pub fn run_hook(input: &[u8], config: &ClaudioConfig, backend: &dyn AudioBackend) -> Result<HookOutcome> {
    let hook = hooks::parse(input)?;

    let mapper = soundpack::create_mapper_or_empty(
        &config.default_soundpack,
        &config.soundpack_search_bases(),
    );
    let resolver = Resolver::new(mapper);
    let mut tracker = Tracker::open(&config.sound_tracking);
    let resolution = tracker.track(&resolver, &hook);

    let played = play(&resolution, config, backend);

    Ok(HookOutcome {
        hook_event_name: hook.hook_event_name,
        context: hook.context,
        resolution,
        played,
    })
}

fn play(resolution: &Resolution, config: &ClaudioConfig, backend: &dyn AudioBackend) -> bool {
    if !config.enabled {
        tracing::debug!("playback disabled");
        return false;
    }
    let Some(file) = resolution.file.as_deref() else {
        // Nothing in the pack, not even default.wav.
        return false;
    };

    match backend.play(file, config.volume) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(backend = backend.name(), "{e}");
            false
        }
    }
}
