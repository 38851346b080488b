use kanade::judge::area::JudgeTier;
use kanade::judge::engine::SessionState;
use kanade::judge::gauge::GaugeType;
use kanade::model::chart::{ChartFormat, ChartFormatKind};
use kanade::model::lane::{Lane, LaneCategory, LaneIndex};
use kanade::model::note::ChartNote;
use kanade::session::{PlaySession, SessionOptions};

/// A chart of `count` regular notes on one key, 1000 ms apart from t=0.
fn regular_chart(count: usize) -> ChartFormat {
    let mut format = ChartFormat::new(ChartFormatKind::Bms, 120.0);
    format.judge_rank = Some(3);
    format.total_value = Some(300.0);
    let lane = Lane::new(LaneCategory::Note, LaneIndex::Key1);
    for i in 0..count {
        let measure = (i / 2) as u32;
        let pos = 0.5 * (i % 2) as f64;
        format.push_note(lane, ChartNote::normal(measure, pos, i as u32));
    }
    format
}

fn play_all_top_tier(format: &ChartFormat, gauge: GaugeType, count: usize) -> PlaySession {
    let session = PlaySession::new(format, SessionOptions::new(gauge)).unwrap();
    session.start(0.0);
    for i in 0..count {
        let t = i as f64 * 1000.0;
        session.tick(t);
        session.on_press(1, t);
        session.on_release(1, t + 50.0);
    }
    session.tick(count as f64 * 1000.0 + 5000.0);
    session
}

#[test]
fn all_top_tier_run_satisfies_the_balancing_invariant() {
    const N: usize = 16;
    for gauge in GaugeType::all() {
        let format = regular_chart(N);
        let session = play_all_top_tier(&format, *gauge, N);
        let basic = session.snapshot();

        assert_eq!(basic.ex_score(), 2 * N as u32, "{gauge:?}");
        assert_eq!(basic.max_combo, N as u32, "{gauge:?}");
        assert_eq!(basic.tier_count(JudgeTier::Perfect), N as u32, "{gauge:?}");
        assert!(session.is_cleared(), "{gauge:?} did not clear");
        assert!(!session.is_failed());
        assert!((basic.total_acc - 100.0).abs() < 1e-9);
    }
}

#[test]
fn early_quit_misses_every_remaining_note() {
    const N: usize = 10;
    let format = regular_chart(N);
    let session = PlaySession::new(&format, SessionOptions::new(GaugeType::Normal)).unwrap();
    session.start(0.0);

    // Hit note 1, then stop playing entirely.
    session.tick(0.0);
    session.on_press(1, 0.0);
    session.on_release(1, 50.0);
    for i in 1..=20 {
        session.tick(i as f64 * 1000.0);
    }

    let basic = session.snapshot();
    assert_eq!(session.notes_expired(), N as u32);
    assert_eq!(basic.combo, 0);
    assert_eq!(basic.tier_count(JudgeTier::Miss), (N - 1) as u32);
    assert_eq!(basic.tier_count(JudgeTier::Perfect), 1);
}

#[test]
fn survival_gauge_terminates_the_session_early() {
    let format = regular_chart(20);
    let session = PlaySession::new(&format, SessionOptions::new(GaugeType::Hazard)).unwrap();
    session.start(0.0);

    // Missing the very first note breaks a hazard run.
    session.tick(2000.0);
    assert_eq!(session.state(), SessionState::Failed);

    // Input after the terminal state changes nothing.
    session.on_press(1, 2000.0);
    assert_eq!(session.snapshot().judged_notes(), 1);
}

#[test]
fn groove_gauge_only_fails_at_chart_end() {
    let format = regular_chart(4);
    let session = PlaySession::new(&format, SessionOptions::new(GaugeType::Normal)).unwrap();
    session.start(0.0);

    session.tick(2500.0);
    // Several notes missed already, but the groove gauge keeps the run alive.
    assert_eq!(session.state(), SessionState::Running);

    session.tick(10_000.0);
    assert_eq!(session.state(), SessionState::Failed);
}

#[test]
fn hold_notes_score_head_and_tail() {
    let mut format = ChartFormat::new(ChartFormatKind::Bms, 120.0);
    format.judge_rank = Some(3);
    format.total_value = Some(300.0);
    let lane = Lane::new(LaneCategory::Long, LaneIndex::Key1);
    format.push_note(lane, ChartNote::hold_head(0, 0.0, 1));
    format.push_note(lane, ChartNote::hold_tail(0, 0.5, 1));

    let session = PlaySession::new(&format, SessionOptions::new(GaugeType::Normal)).unwrap();
    session.start(0.0);
    session.tick(0.0);
    session.on_press(1, 0.0);
    session.tick(500.0);
    session.on_release(1, 1000.0);
    session.tick(5000.0);

    let basic = session.snapshot();
    assert_eq!(basic.max_combo, 2);
    assert_eq!(basic.tier_count(JudgeTier::Perfect), 2);
    assert_eq!(session.state(), SessionState::Cleared);
}

#[test]
fn mixed_timing_produces_expected_tiers() {
    let format = regular_chart(4);
    let session = PlaySession::new(&format, SessionOptions::new(GaugeType::Normal)).unwrap();
    session.start(0.0);

    // Exact, +40 ms (great), -100 ms (good), +200 ms (bad).
    session.tick(0.0);
    session.on_press(1, 0.0);
    session.on_release(1, 20.0);
    session.tick(1000.0);
    session.on_press(1, 1040.0);
    session.on_release(1, 1060.0);
    session.tick(1900.0);
    session.on_press(1, 1900.0);
    session.on_release(1, 1920.0);
    session.tick(3000.0);
    session.on_press(1, 3200.0);
    session.on_release(1, 3220.0);
    session.tick(10_000.0);

    let basic = session.snapshot();
    assert_eq!(basic.tier_count(JudgeTier::Perfect), 1);
    assert_eq!(basic.tier_count(JudgeTier::Great), 1);
    assert_eq!(basic.tier_count(JudgeTier::Good), 1);
    assert_eq!(basic.tier_count(JudgeTier::Bad), 1);
    // Bad broke the combo that the first three built.
    assert_eq!(basic.max_combo, 3);
    assert_eq!(basic.combo, 0);
    assert_eq!(basic.fast, 1);
    assert_eq!(basic.slow, 2);
}
