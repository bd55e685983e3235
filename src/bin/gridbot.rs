//! gridbot - headless runner
//!
//! Loads a level, queues a program and routine bodies given on the command line,
//! and plays the run tick by tick, pausing between steps the way a renderer would.

use anyhow::{Context, Result, bail};
use clap::Parser;
use gridbot::{
    Color, Command, EngineConfig, GameSession, LevelCatalog, Position, RobotState, Routine,
    RunObserver, StepEffect,
};
use std::path::PathBuf;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gridbot")]
#[command(about = "Run a gridbot program against a level")]
struct Cli {
    /// Main queue, as command tokens (e.g. MOVE LEFT F0 PAINT_RED IF_RED)
    program: Vec<String>,

    /// JSON file with a custom level list (defaults to the built-in levels)
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Level id to play (defaults to the first level)
    #[arg(long)]
    level: Option<u32>,

    /// JSON file with engine limits and pacing
    #[arg(long)]
    config: Option<PathBuf>,

    /// Body of F0, as space separated tokens
    #[arg(long, default_value = "")]
    f0: String,

    /// Body of F1, as space separated tokens
    #[arg(long, default_value = "")]
    f1: String,

    /// Body of F2, as space separated tokens
    #[arg(long, default_value = "")]
    f2: String,

    /// Do not pause between steps
    #[arg(long)]
    instant: bool,
}

struct Reporter;

impl RunObserver for Reporter {
    fn on_robot(&mut self, robot: &RobotState) {
        info!(x = robot.x, y = robot.y, rotation = robot.rotation, "robot");
    }

    fn on_goal_collected(&mut self, goal: Position) {
        info!(at = %goal, "star collected");
    }

    fn on_key_collected(&mut self, key_id: &str) {
        info!(key = key_id, "key collected");
    }

    fn on_paint(&mut self, position: Position, color: Color) {
        info!(at = %position, %color, "cell painted");
    }
}

fn parse_tokens(tokens: &str) -> Result<Vec<Command>> {
    tokens
        .split_whitespace()
        .map(|t| t.parse::<Command>().with_context(|| format!("bad token {t:?}")))
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.levels {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            LevelCatalog::from_json_str(&json).with_context(|| format!("loading {}", path.display()))?
        }
        None => LevelCatalog::builtin(),
    };

    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<EngineConfig>(&json)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if cli.instant {
        config = EngineConfig {
            step_delay_ms: 0,
            paint_delay_ms: 0,
            win_delay_ms: 0,
            ..config
        };
    }

    let mut session = GameSession::new(catalog, config);
    if let Some(id) = cli.level {
        session.load_level(id)?;
    }
    info!(level = session.level().id, name = %session.level().name, "playing");

    for (routine, body) in Routine::ALL.into_iter().zip([&cli.f0, &cli.f1, &cli.f2]) {
        for cmd in parse_tokens(body)? {
            session.push_routine_command(routine, cmd)?;
        }
    }
    for cmd in parse_tokens(&cli.program.join(" "))? {
        session.push_command(cmd)?;
    }

    let start = session.start_run()?;
    if let Some(warning) = &start.warning {
        warn!(%warning, "program truncated");
    }
    info!(steps = start.steps, "running");

    let mut reporter = Reporter;
    while let Some(step) = session.tick(&mut reporter) {
        if let StepEffect::Blocked { at, by } = &step.effect {
            info!(%at, ?by, "bump");
        }
        if !step.delay.is_zero() {
            thread::sleep(step.delay);
        }
    }

    if session.has_won() {
        info!(level = session.level().id, "level complete");
        Ok(())
    } else {
        bail!("program ended without collecting every star");
    }
}
