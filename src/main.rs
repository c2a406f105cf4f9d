//! Headless demo runner (default binary).
//!
//! Plays a level to its terminal phase with a naive auto-player: each
//! round taps the first screw that has a legal destination, then stands
//! in for the animation layer by acknowledging every outstanding command.
//! Useful for eyeballing the event flow (`RUST_LOG=debug`) and for replay
//! of JSON level files.

use std::fs;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use screw_sort::core::{demo_level, LevelConfig, PuzzleSnapshot};
use screw_sort::engine::{EventLog, PuzzleEngine, ScriptedAnimator, TapOutcome};
use screw_sort::types::{GamePhase, ScrewId, ScrewState, Topic};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_args(&args)?;
    run(config)
}

fn parse_args(args: &[String]) -> Result<LevelConfig> {
    let mut level: Option<LevelConfig> = None;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--level" => {
                i += 1;
                let path = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --level"))?;
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading level file {path}"))?;
                level = Some(
                    serde_json::from_str(&text)
                        .with_context(|| format!("parsing level file {path}"))?,
                );
            }
            other => {
                return Err(anyhow!("unknown argument: {other} (expected --level <path>)"));
            }
        }
        i += 1;
    }
    Ok(level.unwrap_or_else(demo_level))
}

fn run(config: LevelConfig) -> Result<()> {
    let mut engine = PuzzleEngine::new(config)?;
    let log = EventLog::attach(&mut engine);
    let mut animator = ScriptedAnimator::new();
    tracing::info!(
        screws = engine.state().session().total_screws,
        buffer = engine.state().buffer().capacity(),
        "level loaded"
    );

    let mut rounds = 0usize;
    while engine.state().session().phase == GamePhase::Playing {
        if !tap_any(&mut engine) {
            break;
        }
        animator.settle(&mut engine);

        rounds += 1;
        if rounds > 10_000 {
            return Err(anyhow!("auto-player failed to terminate"));
        }
    }

    let snapshot = engine.snapshot();
    for line in status_lines(&snapshot) {
        println!("{line}");
    }
    println!(
        "EVENTS removals {} transfers {} trays {} parts {}",
        log.count(Topic::RemovalComplete),
        log.count(Topic::TransferComplete),
        log.count(Topic::TrayRevealed),
        log.count(Topic::PartFreed),
    );

    match snapshot.phase {
        GamePhase::Won => Ok(()),
        GamePhase::Stuck => {
            println!("level soft-locked; see RUST_LOG=debug for the move trail");
            Ok(())
        }
        GamePhase::Playing => Err(anyhow!("auto-player stalled while still playing")),
    }
}

/// Tap the first board screw that has a legal destination.
fn tap_any(engine: &mut PuzzleEngine) -> bool {
    let candidates: Vec<ScrewId> = engine
        .state()
        .screws()
        .filter(|(_, s)| s.state == ScrewState::InBoard && !s.is_animating)
        .map(|(id, _)| id)
        .collect();

    for screw in candidates {
        if matches!(engine.tap_screw(screw), TapOutcome::Accepted(_)) {
            return true;
        }
    }
    false
}

fn status_lines(snapshot: &PuzzleSnapshot) -> [String; 4] {
    [
        format!("PHASE {}", snapshot.phase.as_str().to_uppercase()),
        format!(
            "REMOVED {}/{}",
            snapshot.removed_screws, snapshot.total_screws
        ),
        format!(
            "BUFFER {}/{}",
            snapshot.buffer_len, snapshot.buffer_capacity
        ),
        format!("EPISODE {}", snapshot.episode),
    ]
}
