//! Read-only analytics over the tracking schema.

use rusqlite::types::Value;
use rusqlite::params_from_iter;
use serde::Serialize;

use crate::error::{ClaudioError, Result};
use crate::hooks::Category;

use super::sqlite::SqliteTracker;

const SECONDS_PER_DAY: i64 = 86_400;

/// Restricts which events an analytics query looks at.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Only events at or after this unix timestamp (seconds).
    pub since: Option<i64>,
    /// Only events whose reported tool matches (case-insensitive).
    pub tool: Option<String>,
    pub category: Option<Category>,
    /// Maximum rows returned; `None` means no limit.
    pub limit: Option<usize>,
}

impl QueryFilter {
    /// Window covering the last `days` days relative to `now`.
    pub fn last_days(days: u32, now: i64) -> Self {
        Self {
            since: Some(now - i64::from(days) * SECONDS_PER_DAY),
            ..Default::default()
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `AND ...` clauses over the `hook_events` alias `e`, plus their bindings.
    fn event_clauses(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut binds = Vec::new();

        if let Some(since) = self.since {
            sql.push_str(" AND e.timestamp >= ?");
            binds.push(Value::Integer(since));
        }
        if let Some(tool) = &self.tool {
            sql.push_str(" AND LOWER(e.tool_name) = LOWER(?)");
            binds.push(Value::Text(tool.clone()));
        }
        if let Some(category) = self.category {
            sql.push_str(" AND json_extract(e.context, '$.category') = ?");
            binds.push(Value::Text(category.as_str().to_string()));
        }
        (sql, binds)
    }

    fn limit_clause(&self, binds: &mut Vec<Value>) -> &'static str {
        match self.limit {
            Some(limit) => {
                binds.push(Value::Integer(limit as i64));
                " LIMIT ?"
            }
            None => "",
        }
    }
}

/// A candidate that packs keep failing to provide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSound {
    pub path: String,
    pub misses: i64,
    pub tools: Vec<String>,
}

/// A sound that actually played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundUsage {
    pub path: String,
    pub plays: i64,
    pub avg_fallback_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackLevelStat {
    pub level: u8,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackStats {
    pub total: i64,
    /// Levels 1 through 5, zero-filled.
    pub levels: Vec<FallbackLevelStat>,
}

impl SqliteTracker {
    /// Candidates probed and not found, most frequent first.
    pub fn missing_sounds(&self, filter: &QueryFilter) -> Result<Vec<MissingSound>> {
        let (clauses, mut binds) = filter.event_clauses();
        let limit = filter.limit_clause(&mut binds);
        let sql = format!(
            "SELECT pl.path, COUNT(*) AS misses, GROUP_CONCAT(DISTINCT e.tool_name) AS tools
             FROM path_lookups pl
             JOIN hook_events e ON e.id = pl.event_id
             WHERE pl.found = 0{clauses}
             GROUP BY pl.path
             ORDER BY misses DESC, pl.path ASC{limit}"
        );

        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params_from_iter(binds), |row| {
                let tools: Option<String> = row.get(2)?;
                Ok(MissingSound {
                    path: row.get(0)?,
                    misses: row.get(1)?,
                    tools: split_tools(tools),
                })
            })
            .map_err(query_error)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_error)
    }

    /// Selected sounds by play count, with how far down the fallback chain
    /// they were found on average.
    pub fn sound_usage(&self, filter: &QueryFilter) -> Result<Vec<SoundUsage>> {
        let (clauses, mut binds) = filter.event_clauses();
        let limit = filter.limit_clause(&mut binds);
        let sql = format!(
            "SELECT e.selected_path, COUNT(*) AS plays, AVG(e.fallback_level) AS avg_level
             FROM hook_events e
             WHERE e.selected_path IS NOT NULL{clauses}
             GROUP BY e.selected_path
             ORDER BY plays DESC, e.selected_path ASC{limit}"
        );

        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params_from_iter(binds), |row| {
                Ok(SoundUsage {
                    path: row.get(0)?,
                    plays: row.get(1)?,
                    avg_fallback_level: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                })
            })
            .map_err(query_error)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_error)
    }

    /// How many resolutions landed on each fallback level.
    pub fn fallback_stats(&self, filter: &QueryFilter) -> Result<FallbackStats> {
        let (clauses, binds) = filter.event_clauses();
        let sql = format!(
            "SELECT e.fallback_level, COUNT(*)
             FROM hook_events e
             WHERE e.fallback_level IS NOT NULL{clauses}
             GROUP BY e.fallback_level
             ORDER BY e.fallback_level"
        );

        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
        let counts = stmt
            .query_map(params_from_iter(binds), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(query_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_error)?;

        let total: i64 = counts.iter().map(|(_, n)| n).sum();
        let levels = (1..=5u8)
            .map(|level| {
                let count = counts
                    .iter()
                    .find(|(l, _)| *l == i64::from(level))
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                let percentage = if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                };
                FallbackLevelStat {
                    level,
                    count,
                    percentage,
                }
            })
            .collect();

        Ok(FallbackStats { total, levels })
    }

    /// Number of completed events matching the filter.
    pub fn event_count(&self, filter: &QueryFilter) -> Result<i64> {
        let (clauses, binds) = filter.event_clauses();
        let sql = format!(
            "SELECT COUNT(*) FROM hook_events e WHERE e.selected_path IS NOT NULL{clauses}"
        );
        self.conn
            .query_row(&sql, params_from_iter(binds), |row| row.get(0))
            .map_err(query_error)
    }
}

fn split_tools(raw: Option<String>) -> Vec<String> {
    let mut tools: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tools.sort();
    tools
}

fn query_error(e: rusqlite::Error) -> ClaudioError {
    ClaudioError::Tracking(format!("analytics query failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookContext, HookEventKind, ParsedHook};
    use crate::resolver::{Probe, Resolution};

    fn hook(category: Category, tool: &str) -> ParsedHook {
        ParsedHook {
            session_id: "s1".into(),
            hook_event_name: "PostToolUse".into(),
            kind: HookEventKind::PostToolUse,
            context: HookContext::new(category).with_tool(tool),
        }
    }

    fn record(tracker: &mut SqliteTracker, hook: &ParsedHook, timestamp: i64, probes: &[(&str, bool)], level: u8) {
        let selected = probes
            .iter()
            .find(|(_, found)| *found)
            .map(|(p, _)| p.to_string())
            .unwrap_or_else(|| "default.wav".into());
        let resolution = Resolution {
            selected_path: selected,
            fallback_level: level,
            total_candidates: probes.len(),
            probes: probes
                .iter()
                .map(|(path, found)| Probe { path: path.to_string(), found: *found })
                .collect(),
            file: None,
        };
        tracker
            .begin_event(hook, timestamp)
            .unwrap()
            .finish(&resolution)
            .unwrap();
    }

    fn seeded() -> SqliteTracker {
        let mut t = SqliteTracker::open_in_memory().unwrap();
        // Two edits that fell back to the category default.
        for ts in [100, 200] {
            record(
                &mut t,
                &hook(Category::Success, "Edit"),
                ts,
                &[("success/edit.wav", false), ("success/edit-generic.wav", false), ("success.wav", true)],
                5,
            );
        }
        // A git error that found its tool sound.
        record(
            &mut t,
            &hook(Category::Error, "git"),
            300,
            &[("error/git.wav", true)],
            3,
        );
        // A Read that missed everything including default.wav.
        record(
            &mut t,
            &hook(Category::Success, "Read"),
            400,
            &[("success/read.wav", false), ("success.wav", false), ("default.wav", false)],
            5,
        );
        t
    }

    #[test]
    fn test_missing_sounds_ordered_by_frequency() {
        let t = seeded();
        let missing = t.missing_sounds(&QueryFilter::default()).unwrap();
        assert_eq!(missing[0].path, "success/edit-generic.wav");
        assert_eq!(missing[0].misses, 2);
        assert_eq!(missing[1].path, "success/edit.wav");
        assert_eq!(missing[1].tools, vec!["Edit"]);
        assert!(missing.iter().any(|m| m.path == "default.wav" && m.tools == vec!["Read"]));
    }

    #[test]
    fn test_missing_sounds_filters() {
        let t = seeded();
        let recent = t.missing_sounds(&QueryFilter { since: Some(300), ..Default::default() }).unwrap();
        assert!(recent.iter().all(|m| m.tools == vec!["Read"]));

        let by_tool = t.missing_sounds(&QueryFilter::default().with_tool("edit")).unwrap();
        assert_eq!(by_tool.len(), 2);

        let errors = t.missing_sounds(&QueryFilter::default().with_category(Category::Error)).unwrap();
        assert!(errors.is_empty());

        let limited = t.missing_sounds(&QueryFilter::default().with_limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_sound_usage_counts_and_levels() {
        let t = seeded();
        let usage = t.sound_usage(&QueryFilter::default()).unwrap();
        assert_eq!(usage[0].path, "success.wav");
        assert_eq!(usage[0].plays, 2);
        assert!((usage[0].avg_fallback_level - 5.0).abs() < f64::EPSILON);

        let git = usage.iter().find(|u| u.path == "error/git.wav").unwrap();
        assert_eq!(git.plays, 1);
        assert!((git.avg_fallback_level - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sound_usage_category_filter() {
        let t = seeded();
        let usage = t
            .sound_usage(&QueryFilter::default().with_category(Category::Error))
            .unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].path, "error/git.wav");
    }

    #[test]
    fn test_fallback_stats_percentages() {
        let t = seeded();
        let stats = t.fallback_stats(&QueryFilter::default()).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.levels.len(), 5);
        assert_eq!(stats.levels[2].count, 1);
        assert!((stats.levels[2].percentage - 25.0).abs() < 1e-9);
        assert_eq!(stats.levels[4].count, 3);
        assert!((stats.levels[4].percentage - 75.0).abs() < 1e-9);
        assert_eq!(stats.levels[0].count, 0);
    }

    #[test]
    fn test_fallback_stats_empty_db() {
        let t = SqliteTracker::open_in_memory().unwrap();
        let stats = t.fallback_stats(&QueryFilter::default()).unwrap();
        assert_eq!(stats.total, 0);
        assert!(stats.levels.iter().all(|l| l.count == 0 && l.percentage == 0.0));
    }

    #[test]
    fn test_event_count_and_window() {
        let t = seeded();
        assert_eq!(t.event_count(&QueryFilter::default()).unwrap(), 4);
        assert_eq!(t.event_count(&QueryFilter::last_days(0, 250)).unwrap(), 2);
    }
}
