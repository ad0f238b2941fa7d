//! Stage Walkthrough
//!
//! This example walks one student through the opening of stage 1.
//!
//! Key concepts:
//! - Session-owned story state and stage loading
//! - Gates that follow story state after a refresh
//! - Rejected transitions as values, not errors
//! - Coalesced writes and checkpoints
//!
//! Run with: cargo run --example stage_walkthrough

use hubble_stages::persist::InMemoryStore;
use hubble_stages::session::{Session, SessionConfig};
use hubble_stages::stage::TransitionTarget;
use hubble_stages::stages::spectra_velocity::{self, SpectraMarker};
use hubble_stages::stages::GALAXY_COUNT;
use hubble_stages::story::Measurement;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Stage Walkthrough ===\n");

    let store = Arc::new(InMemoryStore::new());
    let config = SessionConfig {
        log_filter: "hubble_stages=info".to_string(),
        ..SessionConfig::for_student(42)
    };
    let mut session = Session::with_logging(config, store.clone())?;

    let mut stage = session.enter_stage(spectra_velocity::stage()?).await?;
    println!("Loaded stage at: {}", stage.current_step());

    stage.transition_next()?;
    println!("Selecting galaxies from: {}", stage.current_step());

    for i in 0..GALAXY_COUNT {
        session.update_story(|story| story.upsert_measurement(Measurement::new(format!("galaxy-{i}"))));
        session.refresh_stage(&mut stage)?;
        println!(
            "  {} galaxies selected, can advance: {}",
            stage.state().fields().total_galaxies,
            stage.can_transition(TransitionTarget::Next)
        );
    }

    while stage.current_step() < SpectraMarker::ChoRow1 {
        let outcome = stage.transition_next()?;
        if !outcome.is_moved() {
            break;
        }
        println!("  -> {}", outcome.current());
    }

    spectra_velocity::select_example_galaxy(&mut stage, session.story(), Some("example-1".to_string()))?;
    stage.transition_next()?;
    println!("Example galaxy chosen, now at: {}", stage.current_step());

    let outcome = stage.transition_next()?;
    if outcome.is_rejected() {
        println!("Waiting for the spectrum tutorial before {}", SpectraMarker::ResWav1);
    }

    let written = stage.flush().await?;
    println!("\nWrote stage record: {written} ({} writes)", store.stage_writes());

    let checkpoint = stage.state().checkpoint();
    println!("Checkpoint after {} transitions:", checkpoint.history.transitions().len());
    println!("{}", checkpoint.to_json()?);

    Ok(())
}
