use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::Serialize;

use crate::error::{ClaudioError, Result};
use crate::hooks::{HookContext, ParsedHook};
use crate::resolver::Resolution;

/// Bumped whenever a migration is added. Migrations are additive only.
pub const SCHEMA_VERSION: i32 = 1;

/// How long to wait on another process's write lock before giving up.
pub(crate) const BUSY_TIMEOUT: Duration = Duration::from_millis(2000);

/// SQLite-backed record of every resolution: one `hook_events` row per
/// invocation and one `path_lookups` row per candidate probed.
pub struct SqliteTracker {
    pub(crate) conn: Connection,
    path: PathBuf,
}

impl SqliteTracker {
    /// Open (or create) the tracking database at `path`, creating parent
    /// directories and the schema as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClaudioError::Tracking(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(&path)
            .map_err(|e| ClaudioError::Tracking(format!("failed to open tracking database: {e}")))?;

        Self::configure_and_init(conn, path)
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            ClaudioError::Tracking(format!("failed to open in-memory tracking database: {e}"))
        })?;

        Self::configure_and_init(conn, PathBuf::from(":memory:"))
    }

    /// Return the path this database was opened with (`:memory:` for in-memory).
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── helpers ────────────────────────────────────────────────────────

    /// Shared initialisation: pragmas + table creation. The journal mode is
    /// left at SQLite's default.
    fn configure_and_init(conn: Connection, path: PathBuf) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| ClaudioError::Tracking(format!("failed to enable foreign keys: {e}")))?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| ClaudioError::Tracking(format!("failed to set busy timeout: {e}")))?;

        let tracker = Self { conn, path };
        tracker.create_tables()?;
        Ok(tracker)
    }

    /// Create all tables and indexes (idempotent).
    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS hook_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp INTEGER NOT NULL,
                    session_id TEXT NOT NULL,
                    tool_name TEXT,
                    selected_path TEXT,
                    fallback_level INTEGER,
                    context TEXT
                );

                CREATE TABLE IF NOT EXISTS path_lookups (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_id INTEGER NOT NULL REFERENCES hook_events(id) ON DELETE CASCADE,
                    path TEXT NOT NULL,
                    sequence INTEGER NOT NULL,
                    found INTEGER NOT NULL CHECK (found IN (0, 1)),
                    UNIQUE(event_id, sequence)
                );

                CREATE INDEX IF NOT EXISTS idx_hook_events_timestamp ON hook_events(timestamp);
                CREATE INDEX IF NOT EXISTS idx_hook_events_session_id ON hook_events(session_id);
                CREATE INDEX IF NOT EXISTS idx_path_lookups_path_found ON path_lookups(path, found);
                CREATE INDEX IF NOT EXISTS idx_path_lookups_event_id ON path_lookups(event_id);
                ",
            )
            .map_err(|e| ClaudioError::Tracking(format!("failed to create tables: {e}")))?;

        let version = self.schema_version()?;
        if version < SCHEMA_VERSION {
            self.conn
                .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
                .map_err(|e| ClaudioError::Tracking(format!("failed to record schema version: {e}")))?;
        }
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i32> {
        self.conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| ClaudioError::Tracking(format!("failed to read schema version: {e}")))
    }

    /// Start recording one hook invocation.
    ///
    /// Takes the write lock immediately and inserts the event row with no
    /// selection yet. Nothing is visible to other connections until
    /// [`EventRecorder::finish`] commits; dropping the recorder rolls back.
    pub fn begin_event(&mut self, hook: &ParsedHook, timestamp: i64) -> Result<EventRecorder<'_>> {
        let context = context_json(&hook.hook_event_name, &hook.context)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ClaudioError::Tracking(format!("failed to begin transaction: {e}")))?;

        tx.execute(
            "INSERT INTO hook_events (timestamp, session_id, tool_name, selected_path, fallback_level, context)
             VALUES (?1, ?2, ?3, NULL, NULL, ?4)",
            params![
                timestamp,
                hook.session_id,
                hook.context.tool_name,
                context
            ],
        )
        .map_err(|e| ClaudioError::Tracking(format!("failed to insert event: {e}")))?;
        let event_id = tx.last_insert_rowid();

        Ok(EventRecorder { tx, event_id })
    }
}

/// An open, uncommitted event. See [`SqliteTracker::begin_event`].
pub struct EventRecorder<'conn> {
    tx: Transaction<'conn>,
    event_id: i64,
}

impl EventRecorder<'_> {
    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    /// Write the probes in order, fill in the selection and commit.
    pub fn finish(self, resolution: &Resolution) -> Result<i64> {
        {
            let mut insert = self
                .tx
                .prepare_cached(
                    "INSERT INTO path_lookups (event_id, path, sequence, found)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| ClaudioError::Tracking(format!("failed to prepare probe insert: {e}")))?;

            for (index, probe) in resolution.probes.iter().enumerate() {
                insert
                    .execute(params![
                        self.event_id,
                        probe.path,
                        index as i64 + 1,
                        probe.found
                    ])
                    .map_err(|e| ClaudioError::Tracking(format!("failed to insert probe: {e}")))?;
            }
        }

        self.tx
            .execute(
                "UPDATE hook_events SET selected_path = ?1, fallback_level = ?2 WHERE id = ?3",
                params![
                    resolution.selected_path,
                    resolution.fallback_level,
                    self.event_id
                ],
            )
            .map_err(|e| ClaudioError::Tracking(format!("failed to update event: {e}")))?;

        let event_id = self.event_id;
        self.tx
            .commit()
            .map_err(|e| ClaudioError::Tracking(format!("failed to commit event: {e}")))?;
        Ok(event_id)
    }
}

#[derive(Serialize)]
struct StoredContext<'a> {
    hook_event_name: &'a str,
    #[serde(flatten)]
    context: &'a HookContext,
}

fn context_json(hook_event_name: &str, context: &HookContext) -> Result<String> {
    Ok(serde_json::to_string(&StoredContext {
        hook_event_name,
        context,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{Category, HookEventKind};
    use crate::resolver::Probe;

    fn hook() -> ParsedHook {
        ParsedHook {
            session_id: "s1".into(),
            hook_event_name: "PostToolUse".into(),
            kind: HookEventKind::PostToolUse,
            context: HookContext::new(Category::Success)
                .with_tool("git")
                .with_operation("git")
                .with_original_tool("Bash"),
        }
    }

    fn resolution() -> Resolution {
        Resolution {
            selected_path: "success/git-generic.wav".into(),
            fallback_level: 3,
            total_candidates: 6,
            probes: vec![
                Probe { path: "success/git.wav".into(), found: false },
                Probe { path: "success/git-generic.wav".into(), found: true },
            ],
            file: Some(PathBuf::from("/packs/x/success/git-generic.wav")),
        }
    }

    fn count(tracker: &SqliteTracker, table: &str) -> i64 {
        tracker
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn open_in_memory_creates_tables() {
        let tracker = SqliteTracker::open_in_memory().expect("should open in-memory DB");
        assert_eq!(tracker.path().to_str().unwrap(), ":memory:");

        let tables: Vec<String> = tracker
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"hook_events".to_string()));
        assert!(tables.contains(&"path_lookups".to_string()));
        assert_eq!(tracker.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn create_tables_is_idempotent() {
        let tracker = SqliteTracker::open_in_memory().expect("should open in-memory DB");
        tracker.create_tables().expect("idempotent create_tables");
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache").join("tracking.db");
        let tracker = SqliteTracker::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(tracker.path(), path.as_path());
    }

    #[test]
    fn finish_writes_event_and_ordered_probes() {
        let mut tracker = SqliteTracker::open_in_memory().unwrap();
        let recorder = tracker.begin_event(&hook(), 1_700_000_000).unwrap();
        let event_id = recorder.finish(&resolution()).unwrap();

        let (selected, level, tool, context): (String, i64, String, String) = tracker
            .conn
            .query_row(
                "SELECT selected_path, fallback_level, tool_name, context FROM hook_events WHERE id = ?1",
                [event_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(selected, "success/git-generic.wav");
        assert_eq!(level, 3);
        assert_eq!(tool, "git");

        let context: serde_json::Value = serde_json::from_str(&context).unwrap();
        assert_eq!(context["category"], "success");
        assert_eq!(context["original_tool"], "Bash");
        assert_eq!(context["hook_event_name"], "PostToolUse");

        let probes: Vec<(String, i64, bool)> = tracker
            .conn
            .prepare("SELECT path, sequence, found FROM path_lookups WHERE event_id = ?1 ORDER BY sequence")
            .unwrap()
            .query_map([event_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            probes,
            vec![
                ("success/git.wav".to_string(), 1, false),
                ("success/git-generic.wav".to_string(), 2, true),
            ]
        );
    }

    #[test]
    fn dropped_recorder_leaves_no_rows() {
        let mut tracker = SqliteTracker::open_in_memory().unwrap();
        {
            let recorder = tracker.begin_event(&hook(), 1_700_000_000).unwrap();
            assert!(recorder.event_id() > 0);
            // Simulated crash between probing and commit.
            drop(recorder);
        }
        assert_eq!(count(&tracker, "hook_events"), 0);
        assert_eq!(count(&tracker, "path_lookups"), 0);
    }

    #[test]
    fn events_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracking.db");
        {
            let mut tracker = SqliteTracker::open(&path).unwrap();
            tracker.begin_event(&hook(), 1).unwrap().finish(&resolution()).unwrap();
        }
        let tracker = SqliteTracker::open(&path).unwrap();
        assert_eq!(count(&tracker, "hook_events"), 1);
        assert_eq!(count(&tracker, "path_lookups"), 2);
    }

    #[test]
    fn probes_reference_existing_events() {
        let mut tracker = SqliteTracker::open_in_memory().unwrap();
        tracker.begin_event(&hook(), 1).unwrap().finish(&resolution()).unwrap();
        let orphans: i64 = tracker
            .conn
            .query_row(
                "SELECT COUNT(*) FROM path_lookups pl LEFT JOIN hook_events e ON e.id = pl.event_id WHERE e.id IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
