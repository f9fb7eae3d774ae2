//! Session flow tests
//!
//! Runs real tokio timers on a paused clock:
//! - Complete multi-round draws through the session API
//! - Intent rejection while spinning
//! - Configuration edits and re-initialization
//! - Timer cancellation on reset and shutdown

use std::collections::HashSet;

use ld_engine::{DrawError, DrawEvent, DrawRange, Phase, Rejection, RoundPlan, RoundUpdate};
use ld_session::{DrawSession, SessionBuilder, SessionError};
use tokio::sync::broadcast::error::RecvError;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn session(specs: &[(&str, u32)], seed: u64) -> DrawSession {
    SessionBuilder::new()
        .plan(RoundPlan::from_specs(specs.iter().copied()))
        .seed(seed)
        .spawn()
}

fn rejection(err: SessionError) -> Option<Rejection> {
    match err {
        SessionError::Draw(e) => e.rejection(),
        SessionError::Closed => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FULL DRAWS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_two_rounds_play_out() {
    let session = session(&[("Round 1", 2), ("Round 2", 3)], 77);
    let ready = session.initialize(DrawRange::new(1, 10)).await.unwrap();
    assert_eq!(ready.phase, Phase::Ready);
    assert_eq!(ready.remaining, 10);

    let mut phases = Vec::new();
    for _ in 0..5 {
        let spinning = session.start_spin().await.unwrap();
        assert_eq!(spinning.phase, Phase::Spinning);
        phases.push(session.wait_until_settled().await.unwrap().phase);
    }
    assert_eq!(
        phases,
        vec![
            Phase::Revealed,
            Phase::Ready,
            Phase::Revealed,
            Phase::Revealed,
            Phase::Finished
        ]
    );

    let done = session.snapshot().await.unwrap();
    assert_eq!(done.history.len(), 5);
    assert_eq!(done.remaining, 5);
    assert_eq!(done.current_round_index, 2);
    let unique: HashSet<_> = done.history.iter().map(|r| r.number).collect();
    assert_eq!(unique.len(), 5);
    assert_eq!(session.latest_snapshot(), done);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_events_follow_the_spin() {
    let session = session(&[("Only", 1)], 1);
    let mut events = session.subscribe_events();
    session.initialize(DrawRange::new(1, 1)).await.unwrap();
    session.start_spin().await.unwrap();
    let done = session.wait_until_settled().await.unwrap();
    assert_eq!(done.phase, Phase::Finished);

    let mut ticks = 0;
    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            DrawEvent::Tick { value } => {
                assert_eq!(value, 1);
                ticks += 1;
            }
            other => names.push(other.type_name()),
        }
    }

    // The tick due together with the commit may lose the race and be dropped
    assert!((24..=25).contains(&ticks), "ticks: {ticks}");
    assert_eq!(names, vec!["win", "celebrate", "round_complete"]);

    session.shutdown().await;
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_spin_rejected_while_spinning() {
    let session = session(&[("A", 2)], 4);
    session.initialize(DrawRange::new(1, 10)).await.unwrap();
    session.start_spin().await.unwrap();

    let err = session.start_spin().await.unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(rejection(err), Some(Rejection::AlreadySpinning));

    let settled = session.wait_until_settled().await.unwrap();
    assert_eq!(settled.history.len(), 1);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_insufficient_pool_is_reported() {
    let session = session(&[("Big", 5)], 0);
    let err = session.initialize(DrawRange::new(1, 3)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Draw(DrawError::InsufficientPool {
            required: 5,
            available: 3
        })
    ));
    assert_eq!(session.snapshot().await.unwrap().phase, Phase::Idle);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_configuration_round_trip() {
    let session = session(&[("A", 1)], 8);
    let b = session.add_round("B", 1).await.unwrap();
    session.initialize(DrawRange::new(1, 4)).await.unwrap();

    let err = session.add_round("C", 1).await.unwrap_err();
    assert_eq!(rejection(err), Some(Rejection::PlanLocked));

    let idle = session.enter_configuration().await.unwrap();
    assert_eq!(idle.phase, Phase::Idle);
    session
        .update_round(b, RoundUpdate::RequiredCount(3))
        .await
        .unwrap();
    let ready = session.initialize(DrawRange::new(1, 4)).await.unwrap();
    assert_eq!(ready.rounds[1].required, 3);

    // 1 + 3 winners now exceed a pool of 3
    session.enter_configuration().await.unwrap();
    assert!(session.initialize(DrawRange::new(1, 3)).await.is_err());
    let removed = session.remove_round(b).await.unwrap();
    assert_eq!(removed.name, "B");
    session.initialize(DrawRange::new(1, 3)).await.unwrap();

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_initialize_with_new_plan() {
    let session = session(&[("A", 1)], 12);
    session.initialize(DrawRange::new(1, 5)).await.unwrap();

    let plan = RoundPlan::from_specs([("Gold", 1), ("Silver", 2)]);
    let ready = session
        .initialize_with(DrawRange::new(10, 19), plan)
        .await
        .unwrap();
    assert_eq!(ready.phase, Phase::Ready);
    assert_eq!(ready.remaining, 10);
    assert_eq!(ready.rounds.len(), 2);
    assert_eq!(ready.current_round.unwrap().name, "Gold");

    session.shutdown().await;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_reset_mid_spin_discards_the_commit() {
    let session = session(&[("A", 2)], 6);
    session.initialize(DrawRange::new(1, 10)).await.unwrap();
    session.start_spin().await.unwrap();

    let fresh = session.reset().await.unwrap();
    assert_eq!(fresh.phase, Phase::Ready);

    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    let later = session.snapshot().await.unwrap();
    assert!(later.history.is_empty());
    assert_eq!(later.remaining, 10);
    assert_eq!(later.phase, Phase::Ready);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_spin_never_commits() {
    let session = session(&[("A", 1)], 2);
    let mut events = session.subscribe_events();
    session.initialize(DrawRange::new(1, 10)).await.unwrap();
    session.start_spin().await.unwrap();
    session.shutdown().await;

    loop {
        match events.recv().await {
            Ok(DrawEvent::Tick { .. }) | Err(RecvError::Lagged(_)) => {}
            Ok(other) => panic!("unexpected {} after shutdown", other.type_name()),
            Err(RecvError::Closed) => break,
        }
    }
}
