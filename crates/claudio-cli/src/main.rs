mod analyze;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use claudio_core::audio::{self, AudioBackend, NoopBackend};
use claudio_core::config::{ClaudioConfig, CliOverrides};
use claudio_core::ClaudioError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "claudio",
    about = "Claudio: plays a sound for every Claude Code hook event",
    version
)]
struct Cli {
    /// Extra config file, applied over the system and user files
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Playback volume between 0.0 and 1.0
    #[arg(long, global = true)]
    volume: Option<f32>,
    /// Soundpack name, directory, JSON manifest or embedded:<name>
    #[arg(long, global = true)]
    soundpack: Option<String>,
    /// Resolve and track, but do not play anything
    #[arg(long, global = true)]
    silent: bool,
    /// Log level (debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Do not record this invocation in the tracking database
    #[arg(long, global = true)]
    no_tracking: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Report on recorded sound lookups
    Analyze {
        #[command(subcommand)]
        report: analyze::Report,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            volume: self.volume,
            soundpack: self.soundpack.clone(),
            silent: self.silent,
            log_level: self.log_level.clone(),
            no_tracking: self.no_tracking,
        }
    }
}

/// Entry point for the claudio binary.
///
/// With no subcommand, reads one Claude Code hook event from stdin and plays
/// the matching sound. Exits non-zero only for malformed input or invalid
/// configuration; nothing is written to stdout in hook mode.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = load_config(&cli);
    init_logging(config.as_ref().map_or("warn", |c| c.log_level.as_str()));

    let hook_mode = cli.command.is_none();
    let result = config.and_then(|config| match cli.command {
        None => run_hook(&config),
        Some(Command::Analyze { report }) => analyze::run(report, &config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // In hook mode only bad input or config may fail the host's hook.
            let fatal = !hook_mode
                || e.downcast_ref::<ClaudioError>()
                    .map_or(true, ClaudioError::is_fatal);
            if fatal {
                tracing::error!("claudio: {e:#}");
                ExitCode::FAILURE
            } else {
                tracing::warn!("claudio: {e:#}");
                ExitCode::SUCCESS
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClaudioConfig> {
    Ok(ClaudioConfig::load_with(cli.config.as_deref(), &cli.overrides())?)
}

/// Stderr logging filtered by the configured level unless `RUST_LOG` is set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .compact()
        .init();
}

fn run_hook(config: &ClaudioConfig) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .map_err(|e| ClaudioError::Input(format!("failed to read stdin: {e}")))?;

    let backend = select_backend(config);
    let outcome = claudio_core::run_hook(&input, config, backend.as_ref())?;
    tracing::info!(
        event = %outcome.hook_event_name,
        selected = %outcome.resolution.selected_path,
        level = outcome.resolution.fallback_level,
        played = outcome.played,
        "hook handled"
    );
    Ok(())
}

fn select_backend(config: &ClaudioConfig) -> Box<dyn AudioBackend> {
    if !config.enabled {
        return Box::new(NoopBackend);
    }
    audio::create_backend(&config.audio_backend)
        .context("audio backend unavailable")
        .unwrap_or_else(|e| {
            tracing::error!("{e:#}");
            Box::new(NoopBackend)
        })
}
