//! Hexhold Core Driver
//!
//! Demo and verification binary: runs a seeded autoplay game, reports the
//! final state hash, and re-verifies it through the replay harness. With
//! `verify <replay.json>` it checks a recorded action log instead, writing
//! a divergence artifact when reproduction fails.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hexhold::game::replay::{run_replay, verify_replay, Replay, ReplayError};
use hexhold::game::state::GameState;
use hexhold::{apply_action, hash_state, Action, VERSION};

const DIVERGENCE_ARTIFACT: &str = "replay-divergence.json";

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Hexhold Core v{}", VERSION);

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("verify") => {
            let path = args.get(2).context("usage: hexhold-core verify <replay.json>")?;
            verify_recorded_log(Path::new(path))
        }
        _ => {
            demo_game();
            Ok(())
        }
    }
}

/// Run a small autoplay game and prove the log reproduces its hash.
fn demo_game() {
    info!("=== Starting Demo Game ===");

    let seed = "demo";
    let turns = 20;
    let mut actions = vec![Action::Init {
        seed: Some(seed.to_string()),
        width: Some(16),
        height: Some(12),
    }];
    actions.extend(std::iter::repeat_with(|| Action::EndTurn).take(turns));

    let mut state = GameState::initial();
    for action in &actions {
        state = apply_action(&state, action);
    }

    info!("Seed: {}", seed);
    info!("Turns: {}", state.turn);
    if let Some(ext) = state.content_ext.as_ref() {
        info!(
            "Entities: {} units, {} cities on {} tiles",
            ext.units.len(),
            ext.cities.len(),
            ext.tiles.len()
        );
    }
    let direct_hash = hash_state(&state);
    info!("Final State Hash: {}", direct_hash);

    info!("=== Verifying Determinism ===");
    let replay = Replay {
        actions,
        start_seed: Some(seed.to_string()),
    };
    let rerun = run_replay(&GameState::initial(), &replay);
    info!("Replay State Hash: {}", rerun.hash);

    if rerun.hash == direct_hash {
        info!("DETERMINISM VERIFIED: hashes match");
    } else {
        warn!("DETERMINISM FAILURE: hashes differ");
    }
}

/// Verify a recorded replay log from disk.
fn verify_recorded_log(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let replay: Replay = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid replay log", path.display()))?;

    info!(
        "Verifying {} actions (seed: {})",
        replay.actions.len(),
        replay.start_seed.as_deref().unwrap_or("<in log>")
    );

    match verify_replay(&GameState::initial(), &replay) {
        Ok(hash) => {
            info!("REPLAY VERIFIED: {}", hash);
            Ok(())
        }
        Err(ReplayError::Divergence(report)) => {
            let artifact = serde_json::to_string_pretty(&report)
                .context("failed to encode divergence report")?;
            std::fs::write(DIVERGENCE_ARTIFACT, artifact)
                .with_context(|| format!("failed to write {DIVERGENCE_ARTIFACT}"))?;
            warn!(
                "REPLAY DIVERGENCE: expected {} got {} (artifact: {})",
                report.expected_hash, report.actual_hash, DIVERGENCE_ARTIFACT
            );
            anyhow::bail!("replay diverged; reproduction written to {DIVERGENCE_ARTIFACT}")
        }
    }
}
