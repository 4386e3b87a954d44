//! End-to-end resolution: raw hook payload → classification → candidates →
//! soundpack lookup → tracking.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use claudio_core::config::SoundTrackingConfig;
use claudio_core::fallback::{self, Tier};
use claudio_core::hooks::{self, Category, HookContext};
use claudio_core::resolver::{Resolution, Resolver};
use claudio_core::soundpack::{self, DirectoryMapper, PathMapper};
use claudio_core::tracking::{QueryFilter, SqliteTracker, Tracker, TrackingResolver};

const GIT_PUSH: &str = r#"{
    "hook_event_name": "PostToolUse",
    "session_id": "s1",
    "tool_name": "Bash",
    "tool_input": {"command": "git push origin main"},
    "tool_response": {"stdout": "ok", "stderr": "", "interrupted": false}
}"#;

const EDIT_ERROR: &str = r#"{
    "hook_event_name": "PostToolUse",
    "session_id": "s1",
    "tool_name": "Edit",
    "tool_input": {"file_path": "/x/y.go"},
    "tool_response": {"stderr": "oops", "interrupted": false}
}"#;

const PROMPT: &str = r#"{"hook_event_name": "UserPromptSubmit", "session_id": "s2", "prompt": "hi"}"#;

const STOP: &str = r#"{"hook_event_name": "Stop", "session_id": "s2"}"#;

fn pack(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for rel in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"RIFF").unwrap();
    }
    dir
}

fn resolver_for(dir: &Path) -> Resolver<DirectoryMapper> {
    Resolver::new(DirectoryMapper::new("scenario", vec![dir.to_path_buf()]))
}

fn resolve(raw: &str, dir: &Path) -> Resolution {
    let ctx = hooks::parse_context(raw.as_bytes()).expect("valid payload");
    resolver_for(dir).resolve(&ctx)
}

#[test]
fn bash_git_success_promotes_to_git() {
    let dir = pack(&["success/git.wav", "default.wav"]);
    let resolution = resolve(GIT_PUSH, dir.path());
    assert_eq!(resolution.selected_path, "success/git.wav");
    assert_eq!(resolution.fallback_level, 3);
    assert_eq!(resolution.file, Some(dir.path().join("success/git.wav")));
}

#[test]
fn bash_git_success_falls_back_to_bash() {
    let dir = pack(&["success/bash.wav", "success.wav", "default.wav"]);
    let resolution = resolve(GIT_PUSH, dir.path());
    assert_eq!(resolution.selected_path, "success/bash.wav");
    assert_eq!(resolution.fallback_level, 3);
    assert!(resolution.probes.iter().any(|p| p.path == "success/git.wav" && !p.found));
}

#[test]
fn edit_error_uses_tool_sound() {
    let dir = pack(&["error/edit.wav", "default.wav"]);
    let resolution = resolve(EDIT_ERROR, dir.path());
    assert_eq!(resolution.selected_path, "error/edit.wav");
    assert_eq!(resolution.fallback_level, 3);
    // The tool+operation pair was tried first.
    assert_eq!(resolution.probes[0].path, "error/edit-go.wav");
}

#[test]
fn hint_wins_over_tool() {
    let dir = pack(&["success/celebrate.wav", "success/git.wav"]);
    let ctx = HookContext::new(Category::Success)
        .with_tool("git")
        .with_sound_hint("celebrate");
    let resolution = resolver_for(dir.path()).resolve(&ctx);
    assert_eq!(resolution.selected_path, "success/celebrate.wav");
    assert_eq!(resolution.fallback_level, 1);
}

#[test]
fn universal_fallback_for_every_event() {
    let dir = pack(&["default.wav"]);
    for raw in [GIT_PUSH, EDIT_ERROR, PROMPT, STOP] {
        let resolution = resolve(raw, dir.path());
        assert_eq!(resolution.selected_path, "default.wav", "{raw}");
        assert_eq!(resolution.fallback_level, 5);
        assert!(resolution.found());
    }
}

#[test]
fn disabled_tracking_changes_nothing_and_creates_no_db() {
    let dir = pack(&["success/git.wav", "error/edit.wav", "interactive.wav", "default.wav"]);
    let db = dir.path().join("cache").join("tracking.db");
    let config = SoundTrackingConfig {
        enabled: false,
        database_path: Some(db.clone()),
    };

    let mut tracking = TrackingResolver::new(resolver_for(dir.path()), Tracker::open(&config));
    for raw in [GIT_PUSH, EDIT_ERROR, PROMPT, STOP] {
        let hook = hooks::parse(raw.as_bytes()).unwrap();
        let untracked = resolver_for(dir.path()).resolve(&hook.context);
        assert_eq!(tracking.resolve(&hook), untracked);
    }
    assert!(!db.exists());
    assert!(!db.parent().unwrap().exists());
}

#[test]
fn duplicate_candidates_are_removed() {
    // Promoted Bash command: tool, operation and hint all collapse onto git.
    let ctx = HookContext::new(Category::Success)
        .with_tool("git")
        .with_operation("git")
        .with_original_tool("Bash")
        .with_sound_hint("git");
    let candidates = fallback::candidates(&ctx);

    let unique: HashSet<_> = candidates.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(unique.len(), candidates.len());

    let tool_tier = candidates.iter().filter(|c| c.tier == Tier::ToolSpecific).count();
    assert!(tool_tier <= 3);
    assert_eq!(candidates[0].path, "success/git.wav");
    assert_eq!(candidates.last().unwrap().path, "default.wav");
}

#[test]
fn tracked_probes_match_mapper_calls() {
    let dir = pack(&["success.wav"]);
    let db = dir.path().join("tracking.db");
    let mut tracking = TrackingResolver::new(
        resolver_for(dir.path()),
        Tracker::Sqlite(SqliteTracker::open(&db).unwrap()),
    );

    let hook = hooks::parse(GIT_PUSH.as_bytes()).unwrap();
    let resolution = tracking.resolve(&hook);
    assert_eq!(resolution.selected_path, "success.wav");
    drop(tracking);

    let tracker = SqliteTracker::open(&db).unwrap();
    let missing = tracker.missing_sounds(&QueryFilter::default()).unwrap();
    let missed: HashSet<String> = missing.into_iter().map(|m| m.path).collect();
    let expected: HashSet<String> = resolution
        .probes
        .iter()
        .filter(|p| !p.found)
        .map(|p| p.path.clone())
        .collect();
    assert_eq!(missed, expected);

    let stats = tracker.fallback_stats(&QueryFilter::default()).unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.levels[4].count, 1);
}

#[test]
fn embedded_pack_resolves_without_panicking() {
    // Targets only exist on the matching OS; either way resolution completes.
    let mapper = soundpack::create_mapper_or_empty("embedded:mac-system", &[]);
    let resolver = Resolver::new(&mapper);
    let ctx = hooks::parse_context(STOP.as_bytes()).unwrap();
    let resolution = resolver.resolve(&ctx);
    assert_eq!(resolution.found(), resolution.file.is_some());
    assert_eq!(mapper.name(), "mac-system");
}

#[test]
fn named_pack_found_through_search_bases() {
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("retro");
    std::fs::create_dir_all(root.join("completion")).unwrap();
    std::fs::write(root.join("completion").join("default.wav"), b"RIFF").unwrap();

    let mapper = soundpack::create_mapper("retro", &[PathBuf::from("/nonexistent"), base.path().to_path_buf()])
        .unwrap();
    let resolution = Resolver::new(mapper).resolve(&hooks::parse_context(STOP.as_bytes()).unwrap());
    assert_eq!(resolution.selected_path, "completion/default.wav");
    assert_eq!(resolution.fallback_level, 5);
}
