//! luckydraw: terminal lucky draw
//!
//! Usage:
//!   luckydraw --auto                         - Play the default draw to the end
//!   luckydraw --min 1 --max 50 -r Gold=1     - Custom range and rounds
//!   luckydraw -c draw.yaml -e winners.json   - Config file, export winners
//!
//! Without `--auto`: Enter spins, `r` resets, `q` quits.

mod args;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use ld_engine::{DrawEvent, EngineSnapshot, Phase};
use ld_session::{DrawSession, SessionBuilder, SessionResult};

use crate::args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.to_config()?;

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    log::info!(
        "[luckydraw] Drawing from {}..={} over {} rounds",
        config.range.min,
        config.range.max,
        config.rounds.len()
    );

    let session = SessionBuilder::from_config(&config).spawn();
    let printer = tokio::spawn(print_events(session.subscribe_events()));

    session
        .initialize(config.range)
        .await
        .context("Failed to initialize draw")?;

    if args.auto {
        run_auto(&session).await?;
    } else {
        run_interactive(&session).await?;
    }

    let snapshot = session.snapshot().await?;
    print_summary(&snapshot);
    if let Some(path) = &args.export {
        export_history(&snapshot, path)?;
        println!("History written to {}", path.display());
    }

    session.shutdown().await;
    if let Err(e) = printer.await {
        log::warn!("[luckydraw] Event printer failed: {}", e);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRIVERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Spin until the engine refuses: every round done or the pool is empty
async fn run_auto(session: &DrawSession) -> Result<()> {
    while spin(session).await? {}
    Ok(())
}

async fn run_interactive(session: &DrawSession) -> Result<()> {
    println!("Enter: spin   r: reset   q: quit");
    announce_round(&session.latest_snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {
                if !spin(session).await? {
                    println!("Nothing left to draw. r: reset   q: quit");
                    continue;
                }
            }
            "r" => {
                session.reset().await?;
                println!("Draw reset");
            }
            "q" => break,
            other => {
                println!("Unknown command '{}'", other);
                continue;
            }
        }
        announce_round(&session.latest_snapshot());
    }
    Ok(())
}

/// One spin through to its reveal (and round transition). False when rejected.
async fn spin(session: &DrawSession) -> SessionResult<bool> {
    match session.start_spin().await {
        Ok(_) => {
            session.wait_until_settled().await?;
            Ok(true)
        }
        Err(e) if e.is_rejection() => {
            log::debug!("[luckydraw] Spin refused: {}", e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

async fn print_events(mut events: broadcast::Receiver<DrawEvent>) {
    loop {
        match events.recv().await {
            Ok(DrawEvent::Tick { value }) => {
                print!("\r  {:>12}", value);
                let _ = std::io::stdout().flush();
            }
            Ok(DrawEvent::Win { record }) => {
                println!(
                    "\r  {:>12}  <- {} winner at {}",
                    record.number,
                    record.round_name,
                    record.formatted_time()
                );
            }
            Ok(DrawEvent::Celebrate) => {}
            Ok(DrawEvent::RoundComplete { round }) => {
                println!("{} complete", round.name);
            }
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn announce_round(snapshot: &EngineSnapshot) {
    match (snapshot.phase, &snapshot.current_round) {
        (Phase::Finished, _) => println!("All rounds drawn"),
        (_, Some(round)) => {
            let drawn = snapshot
                .rounds
                .get(snapshot.current_round_index)
                .map_or(0, |p| p.drawn);
            println!(
                "{}: {}/{} drawn, {} numbers left",
                round.name, drawn, round.required_count, snapshot.remaining
            );
        }
        (_, None) => {}
    }
}

fn print_summary(snapshot: &EngineSnapshot) {
    println!();
    println!("Results: {} winners", snapshot.total_drawn());
    for progress in &snapshot.rounds {
        let mut winners: Vec<_> = snapshot
            .history
            .iter()
            .filter(|r| r.round_id == progress.round_id)
            .map(|r| r.number.to_string())
            .collect();
        // History is newest first
        winners.reverse();
        println!(
            "  {} ({}/{}): {}",
            progress.name,
            progress.drawn,
            progress.required,
            if winners.is_empty() { "-".to_string() } else { winners.join(", ") }
        );
    }
}

fn export_history(snapshot: &EngineSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&snapshot.history)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
