use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use claudio_core::config::ClaudioConfig;
use claudio_core::fallback::{self, Tier};
use claudio_core::hooks::{self, Category};
use claudio_core::paths;
use claudio_core::tracking::{FallbackStats, MissingSound, QueryFilter, SoundUsage, SqliteTracker};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Subcommand)]
pub enum Report {
    /// Sounds that were looked for but not found, most requested first
    Missing(ReportArgs),
    /// Sounds that actually played
    Usage(ReportArgs),
    /// How often each fallback level was needed
    Fallback(ReportArgs),
    /// Print the candidate list for a hook event read from stdin
    Candidates {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct ReportArgs {
    /// Only events from the last N days
    #[arg(long)]
    days: Option<u32>,
    /// Only events for this tool (e.g. Edit, git)
    #[arg(long)]
    tool: Option<String>,
    /// Only events in this category (loading, success, error, interactive, completion, system)
    #[arg(long)]
    category: Option<Category>,
    /// Maximum number of rows
    #[arg(short, long, default_value = "20")]
    limit: usize,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    fn filter(&self) -> QueryFilter {
        let mut filter = match self.days {
            Some(days) => QueryFilter::last_days(days, chrono::Utc::now().timestamp()),
            None => QueryFilter::default(),
        };
        if let Some(ref tool) = self.tool {
            filter = filter.with_tool(tool.clone());
        }
        if let Some(category) = self.category {
            filter = filter.with_category(category);
        }
        filter.with_limit(self.limit)
    }
}

pub fn run(report: Report, config: &ClaudioConfig) -> Result<()> {
    match report {
        Report::Candidates { json } => cmd_candidates(json),
        Report::Missing(args) => with_tracker(config, |t| cmd_missing(t, &args)),
        Report::Usage(args) => with_tracker(config, |t| cmd_usage(t, &args)),
        Report::Fallback(args) => with_tracker(config, |t| cmd_fallback(t, &args)),
    }
}

fn database_path(config: &ClaudioConfig) -> Option<PathBuf> {
    config
        .sound_tracking
        .database_path
        .clone()
        .or_else(paths::default_tracking_db)
}

/// Open the tracking database, or explain why there is nothing to report.
fn with_tracker(config: &ClaudioConfig, report: impl FnOnce(&SqliteTracker) -> Result<()>) -> Result<()> {
    let path = match database_path(config) {
        Some(path) if path.is_file() => path,
        other => {
            let shown = other
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no cache directory>".to_string());
            println!(
                "{}",
                format!("No sound tracking data yet ({shown}). Run some hooks with tracking enabled first.")
                    .dimmed()
            );
            return Ok(());
        }
    };

    let tracker = SqliteTracker::open(&path)
        .with_context(|| format!("failed to open tracking database {}", path.display()))?;
    report(&tracker)
}

fn cmd_missing(tracker: &SqliteTracker, args: &ReportArgs) -> Result<()> {
    let missing: Vec<MissingSound> = tracker.missing_sounds(&args.filter())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&missing)?);
        return Ok(());
    }
    if missing.is_empty() {
        println!("{}", "No missing sounds recorded.".dimmed());
        return Ok(());
    }

    println!(
        "{:<8} {:<40} {}",
        "Misses".dimmed(),
        "Path".dimmed(),
        "Tools".dimmed()
    );
    for row in &missing {
        println!(
            "{:<8} {:<40} {}",
            row.misses.to_string().yellow(),
            row.path.cyan(),
            row.tools.join(", ").dimmed()
        );
    }
    Ok(())
}

fn cmd_usage(tracker: &SqliteTracker, args: &ReportArgs) -> Result<()> {
    let usage: Vec<SoundUsage> = tracker.sound_usage(&args.filter())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&usage)?);
        return Ok(());
    }
    if usage.is_empty() {
        println!("{}", "No sounds played yet.".dimmed());
        return Ok(());
    }

    println!(
        "{:<8} {:<10} {}",
        "Plays".dimmed(),
        "Avg level".dimmed(),
        "Path".dimmed()
    );
    for row in &usage {
        println!(
            "{:<8} {:<10} {}",
            row.plays.to_string().green(),
            format!("{:.1}", row.avg_fallback_level),
            row.path.cyan()
        );
    }
    Ok(())
}

fn cmd_fallback(tracker: &SqliteTracker, args: &ReportArgs) -> Result<()> {
    let stats: FallbackStats = tracker.fallback_stats(&args.filter())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    if stats.total == 0 {
        println!("{}", "No resolutions recorded.".dimmed());
        return Ok(());
    }

    println!(
        "{:<6} {:<18} {:<8} {}",
        "Level".dimmed(),
        "Matched by".dimmed(),
        "Count".dimmed(),
        "Share".dimmed()
    );
    for level in &stats.levels {
        let share = format!("{:>5.1}%", level.percentage);
        let share = if level.level <= 3 {
            share.green().to_string()
        } else {
            share.yellow().to_string()
        };
        println!(
            "{:<6} {:<18} {:<8} {}",
            level.level,
            level_label(level.level),
            level.count,
            share
        );
    }
    println!("\n{} {}", "Total:".bold(), stats.total);
    Ok(())
}

fn level_label(level: u8) -> &'static str {
    match level {
        1 => "sound hint",
        2 => "tool + operation",
        3 => "tool",
        4 => "operation",
        _ => "category/default",
    }
}

#[derive(Serialize)]
struct CandidateRow {
    path: String,
    tier: Tier,
    level: u8,
}

fn cmd_candidates(json: bool) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("failed to read hook event from stdin")?;
    let hook = hooks::parse(&input)?;

    let rows: Vec<CandidateRow> = fallback::candidates(&hook.context)
        .into_iter()
        .map(|c| CandidateRow {
            level: c.level(),
            tier: c.tier,
            path: c.path,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        hook.hook_event_name.bold(),
        hook.context.category.to_string().cyan(),
        hook.context.tool_name.as_deref().unwrap_or("-").dimmed()
    );
    for (index, row) in rows.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            index + 1,
            format!("[{}]", row.level).dimmed(),
            row.path
        );
    }
    Ok(())
}
