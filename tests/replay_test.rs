use kanade::judge::area::{JudgeArea, JudgeTier};
use kanade::judge::engine::SessionState;
use kanade::judge::gauge::GaugeType;
use kanade::judge::score::BasicData;
use kanade::model::chart::{ChartFormat, ChartFormatKind};
use kanade::model::lane::{Lane, LaneCategory, LaneIndex};
use kanade::model::note::ChartNote;
use kanade::replay::command::{ReplayCommand, ReplayHeader, ReplayLog, TimedCommand};
use kanade::session::{PlaySession, SessionOptions};

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

/// Drive a replay session to completion with a fixed tick cadence and
/// return its final record.
fn play_replay(format: &ChartFormat, log: ReplayLog) -> (BasicData, SessionState) {
    let mut options = SessionOptions::new(GaugeType::Normal);
    options.replay = Some(log);
    let session = PlaySession::new(format, options).unwrap();
    session.start(0.0);
    let mut t = 0.0;
    while !matches!(
        session.state(),
        SessionState::Cleared | SessionState::Failed
    ) && t < 60_000.0
    {
        session.tick(t);
        t += 10.0;
    }
    (session.snapshot(), session.state())
}

#[test]
fn recorded_session_replays_to_identical_state() {
    const N: usize = 6;
    let format = regular_chart(N);

    // Live session with deliberately uneven timing.
    let live = PlaySession::new(&format, SessionOptions::new(GaugeType::Normal)).unwrap();
    live.start(0.0);
    let offsets = [0.0, 45.0, -30.0, 120.0, -200.0, 15.0];
    for (i, offset) in offsets.iter().enumerate() {
        let t = i as f64 * 1000.0 + offset;
        live.tick(i as f64 * 1000.0 - 400.0);
        live.on_press(1, t);
        live.on_release(1, t + 60.0);
    }
    let mut t = 6000.0;
    while !matches!(live.state(), SessionState::Cleared | SessionState::Failed) && t < 60_000.0 {
        live.tick(t);
        t += 10.0;
    }
    let live_basic = live.snapshot();
    let log = live.recorded_log(ReplayHeader::default());
    assert_eq!(log.len(), N * 2);

    // Replaying the log twice yields byte-identical final records.
    let (first, first_state) = play_replay(&format, log.clone());
    let (second, second_state) = play_replay(&format, log);
    assert_eq!(first, second);
    assert_eq!(first_state, second_state);

    // And the replay reproduces the live session's judgments.
    assert_eq!(first.judge, live_basic.judge);
    assert_eq!(first.max_combo, live_basic.max_combo);
    assert_eq!(first.ex_score(), live_basic.ex_score());
}

#[test]
fn judgment_injection_replays_bit_for_bit() {
    let format = regular_chart(4);
    let commands = vec![
        TimedCommand {
            ms: 0,
            command: ReplayCommand::Judge {
                area: JudgeArea::ExactPerfect,
            },
        },
        TimedCommand {
            ms: 1000,
            command: ReplayCommand::Judge {
                area: JudgeArea::LateGreat,
            },
        },
        TimedCommand {
            ms: 2000,
            command: ReplayCommand::Judge {
                area: JudgeArea::EarlyGood,
            },
        },
        TimedCommand {
            ms: 3000,
            command: ReplayCommand::Judge {
                area: JudgeArea::Miss,
            },
        },
    ];
    let log = ReplayLog::new(ReplayHeader::default(), commands);

    let (first, _) = play_replay(&format, log.clone());
    let (second, _) = play_replay(&format, log);
    assert_eq!(first, second);
    assert_eq!(first.area_count(JudgeArea::ExactPerfect), 1);
    assert_eq!(first.area_count(JudgeArea::LateGreat), 1);
    assert_eq!(first.area_count(JudgeArea::EarlyGood), 1);
}

#[test]
fn storage_roundtrip_preserves_playback() {
    const N: usize = 4;
    let format = regular_chart(N);
    let live = PlaySession::new(&format, SessionOptions::new(GaugeType::Normal)).unwrap();
    live.start(0.0);
    for i in 0..N {
        let t = i as f64 * 1000.0;
        live.tick(t);
        live.on_press(1, t);
        live.on_release(1, t + 80.0);
    }
    live.tick(20_000.0);
    let log = live.recorded_log(ReplayHeader {
        player: "roundtrip".to_string(),
        ..Default::default()
    });

    let json = log.to_json().unwrap();
    let restored = ReplayLog::from_json(&json).unwrap();
    assert_eq!(restored, log);

    let (from_original, _) = play_replay(&format, log);
    let (from_restored, _) = play_replay(&format, restored);
    assert_eq!(from_original, from_restored);
}

#[test]
fn truncated_log_completes_via_skip_to_end() {
    const N: usize = 10;
    let format = regular_chart(N);

    // Only the first note's input survived truncation.
    let commands = vec![
        TimedCommand {
            ms: 0,
            command: ReplayCommand::Press { key: 1 },
        },
        TimedCommand {
            ms: 80,
            command: ReplayCommand::Release { key: 1 },
        },
    ];
    let log = ReplayLog::new(ReplayHeader::default(), commands);

    let mut options = SessionOptions::new(GaugeType::Normal);
    options.replay = Some(log);
    let session = PlaySession::new(&format, options).unwrap();
    session.start(0.0);
    session.tick(100.0);
    // The caller aborts playback; the session still reaches a defined end.
    session.skip_to_end(200.0);

    let basic = session.snapshot();
    assert_eq!(session.notes_expired(), N as u32);
    assert_eq!(basic.tier_count(JudgeTier::Perfect), 1);
    assert_eq!(basic.tier_count(JudgeTier::Miss), (N - 1) as u32);
    assert!(matches!(
        session.state(),
        SessionState::Cleared | SessionState::Failed
    ));
}

#[test]
fn empty_log_still_reaches_a_terminal_state() {
    let format = regular_chart(3);
    let mut options = SessionOptions::new(GaugeType::Normal);
    options.replay = Some(ReplayLog::new(ReplayHeader::default(), Vec::new()));
    let session = PlaySession::new(&format, options).unwrap();
    session.skip_to_end(0.0);

    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.snapshot().tier_count(JudgeTier::Miss), 3);
}

#[test]
fn pitch_header_slows_command_application() {
    let format = regular_chart(1);
    let header = ReplayHeader {
        pitch_semitones: 12,
        ..Default::default()
    };
    let commands = vec![
        TimedCommand {
            ms: 0,
            command: ReplayCommand::Press { key: 1 },
        },
        TimedCommand {
            ms: 100,
            command: ReplayCommand::Release { key: 1 },
        },
    ];
    let mut options = SessionOptions::new(GaugeType::Normal);
    options.replay = Some(ReplayLog::new(header, commands));
    let session = PlaySession::new(&format, options).unwrap();
    session.start(0.0);

    // At double speed the 100 ms release applies at rel 200 ms; the press
    // at offset 0 applies immediately and judges the note at its recorded
    // timestamp.
    session.tick(0.0);
    assert_eq!(session.snapshot().tier_count(JudgeTier::Perfect), 1);
}
