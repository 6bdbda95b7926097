//! Linkage FABRIK chain CLI.
//!
//! Provides three modes of operation:
//! - `run`: Drive the chain with a scripted pointer drag and print one JSON
//!   frame per update
//! - `solve`: Solve a single target and print the resulting frame
//! - `config`: Print the effective configuration as TOML

mod frame;
mod script;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Point2;

use linkage_core::prelude::*;
use linkage_ik::prelude::*;
use linkage_input::prelude::*;

use crate::frame::{ChainFrame, FrameLog, FrameRecordPlugin};
use crate::script::{DragPath, ScriptedDrag};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Planar FABRIK chain driven by pointer input.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log verbosity (logs go to stderr).
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the frame loop with a scripted drag.
    Run {
        /// Number of frames to run.
        #[arg(short = 'n', long, default_value_t = 120)]
        frames: u32,

        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Drag path to follow.
        #[arg(short, long, value_enum, default_value_t = DragPath::Circle)]
        path: DragPath,
    },

    /// Solve a single target from the rest pose.
    Solve {
        /// Target x.
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Target y.
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Number of segments (overrides the configuration).
        #[arg(short, long)]
        joints: Option<usize>,

        /// Uniform segment length (overrides the configuration).
        #[arg(short, long)]
        length: Option<f64>,

        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration.
    Config {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

/// Default configuration, or the file at `path`.
fn load_config(path: Option<&Path>) -> Result<LinkageConfig, ConfigError> {
    match path {
        Some(path) => LinkageConfig::from_file(path),
        None => Ok(LinkageConfig::default()),
    }
}

/// Headless app with the full input -> solve -> record pipeline.
fn build_app(app: &mut App, config: LinkageConfig) {
    app.insert_resource(config);
    app.add_plugins((
        LinkageCorePlugin,
        LinkageInputPlugin,
        LinkageIkPlugin,
        FrameRecordPlugin,
    ));
    app.finish();
    app.cleanup();
}

/// Feed `script` for every frame, writing each recorded frame to `out`.
fn drive(
    app: &mut App,
    script: &ScriptedDrag,
    frames: u32,
    out: &mut impl Write,
) -> Result<(), LinkageError> {
    for frame in 0..frames {
        script.feed(frame, &mut app.world_mut().resource_mut::<PointerInput>());
        app.update();

        for chain_frame in app.world_mut().resource_mut::<FrameLog>().drain() {
            chain_frame.write_json_line(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn run_frames(
    config: LinkageConfig,
    frames: u32,
    path: DragPath,
    log_level: LogLevel,
    out: &mut impl Write,
) -> Result<(), LinkageError> {
    config.validate()?;
    let script = ScriptedDrag::new(
        path,
        frames,
        config.chain.base_point(),
        config.chain.lengths().iter().sum(),
    );

    let mut app = App::new();
    app.add_plugins(LogPlugin {
        level: log_level.into(),
        ..default()
    });
    build_app(&mut app, config);
    drive(&mut app, &script, frames, out)?;

    if let Some(result) = app.world().get_resource::<IkChain>().and_then(|c| c.last_result) {
        info!(
            "linkage: {frames} frames, last solve {:?} error {:.3}",
            result.branch, result.error
        );
    }
    Ok(())
}

/// Build the configured chain at rest and solve it toward `target` once.
fn solve_frame(config: &LinkageConfig, target: Point2<f64>) -> Result<ChainFrame, ConfigError> {
    let (chain, result) = solve_chain(config, target)?;
    Ok(ChainFrame::capture(0, &chain, Some(target), Some(result)))
}

/// Replace the chain shape with a uniform one when either override is given.
fn apply_overrides(
    mut config: LinkageConfig,
    joints: Option<usize>,
    length: Option<f64>,
) -> LinkageConfig {
    if joints.is_some() || length.is_some() {
        config.chain.segment_lengths = None;
    }
    if let Some(joints) = joints {
        config.chain.joint_count = joints;
    }
    if let Some(length) = length {
        config.chain.segment_length = length;
    }
    config
}

fn run(cli: Cli) -> Result<(), LinkageError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Some(Commands::Run {
            frames,
            config,
            path,
        }) => {
            let config = load_config(config.as_deref())?;
            run_frames(config, frames, path, cli.log_level, &mut out)
        }
        Some(Commands::Solve {
            x,
            y,
            joints,
            length,
            config,
        }) => {
            let config = apply_overrides(load_config(config.as_deref())?, joints, length);
            solve_frame(&config, Point2::new(x, y))?.write_json_line(&mut out)
        }
        Some(Commands::Config { config }) => {
            let config = load_config(config.as_deref())?;
            out.write_all(config.to_toml_string()?.as_bytes())?;
            Ok(())
        }
        None => {
            // Default: one circle lap with the default chain
            run_frames(
                LinkageConfig::default(),
                120,
                DragPath::Circle,
                cli.log_level,
                &mut out,
            )
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("linkage: {e}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
