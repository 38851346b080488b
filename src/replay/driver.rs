use super::command::{ReplayCommand, ReplayLog, TimedCommand};
use crate::chart::timeline::ChartTimeline;
use crate::judge::engine::JudgeEngine;
use crate::model::lane::LANE_INDEX_COUNT;

/// Walks a command log forward, re-driving the judge engine through the
/// same entry points as live input. Judgment commands bypass re-derivation
/// entirely so a historical outcome reproduces bit for bit.
#[derive(Debug)]
pub struct ReplayDriver {
    commands: Vec<TimedCommand>,
    cursor: usize,
    /// Derived from the recorded pitch shift: one semitone per power of
    /// the twelfth root of two.
    playback_speed: f64,
    /// Session-wide playback-rate modifier dividing every offset.
    rate_modifier: f64,
    key_pressing: [bool; LANE_INDEX_COUNT],
}

impl ReplayDriver {
    pub fn new(log: &ReplayLog, rate_modifier: f64) -> Self {
        let semitone = 2f64.powf(1.0 / 12.0);
        Self {
            commands: log.commands().to_vec(),
            cursor: 0,
            playback_speed: semitone.powi(log.header().pitch_semitones),
            rate_modifier,
            key_pressing: [false; LANE_INDEX_COUNT],
        }
    }

    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.commands.len()
    }

    fn scaled_offset(&self, ms: i64) -> f64 {
        (ms as f64 * self.playback_speed / self.rate_modifier).round()
    }

    /// Apply every command whose scaled offset has been reached. Commands
    /// carry their recorded offset as the judgment timestamp, unscaled.
    pub fn step(&mut self, rel_ms: f64, timeline: &mut ChartTimeline, engine: &mut JudgeEngine) {
        while let Some(cmd) = self.commands.get(self.cursor).copied() {
            if rel_ms < self.scaled_offset(cmd.ms) {
                break;
            }
            self.cursor += 1;
            let cmd_time = cmd.ms as f64;
            match cmd.command {
                ReplayCommand::Press { key } => {
                    if key < LANE_INDEX_COUNT {
                        self.key_pressing[key] = true;
                    }
                    engine.on_press(key, cmd_time, timeline);
                }
                ReplayCommand::Release { key } => {
                    if key < LANE_INDEX_COUNT {
                        self.key_pressing[key] = false;
                    }
                    engine.on_release(key, cmd_time, timeline);
                }
                ReplayCommand::Judge { area } => {
                    engine.apply_judgment(area, cmd_time);
                }
            }
        }

        for key in 0..LANE_INDEX_COUNT {
            if self.key_pressing[key] {
                engine.on_hold(key, rel_ms);
            }
        }
    }

    /// Drain the whole log in one call: remaining judgment commands still
    /// apply, raw transitions are not replayed, and every key left held
    /// gets a synthesized release so the final state is well defined even
    /// when playback is aborted early.
    pub fn skip_to_end(
        &mut self,
        end_ms: f64,
        timeline: &mut ChartTimeline,
        engine: &mut JudgeEngine,
    ) {
        while let Some(cmd) = self.commands.get(self.cursor).copied() {
            self.cursor += 1;
            if let ReplayCommand::Judge { area } = cmd.command {
                engine.apply_judgment(area, cmd.ms as f64);
            }
        }
        for key in 0..LANE_INDEX_COUNT {
            if std::mem::take(&mut self.key_pressing[key]) {
                engine.on_release(key, end_ms, timeline);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::area::JudgeArea;
    use crate::judge::gauge::{Gauge, GaugeType};
    use crate::judge::window::{JudgeDifficulty, WindowTable};
    use crate::model::chart::{ChartFormat, ChartFormatKind};
    use crate::model::lane::{Lane, LaneCategory, LaneIndex};
    use crate::model::note::ChartNote;
    use crate::replay::command::ReplayHeader;

    fn setup(notes: Vec<(usize, ChartNote)>) -> (ChartTimeline, JudgeEngine) {
        let mut format = ChartFormat::new(ChartFormatKind::Bms, 120.0);
        for (key, note) in notes {
            let lane = Lane::new(LaneCategory::Note, LaneIndex::from_index(key).unwrap());
            format.push_note(lane, note);
        }
        let windows = WindowTable::for_difficulty(JudgeDifficulty::Easy);
        let mut timeline = ChartTimeline::from_format(&format).unwrap();
        timeline.set_miss_window(windows.miss_window());
        let gauge = Gauge::new(GaugeType::Normal, 300.0, timeline.note_count_total());
        let mut engine = JudgeEngine::new(windows, gauge, &timeline);
        engine.start();
        (timeline, engine)
    }

    fn press_release(key: usize, ms: i64) -> Vec<TimedCommand> {
        vec![
            TimedCommand {
                ms,
                command: ReplayCommand::Press { key },
            },
            TimedCommand {
                ms: ms + 100,
                command: ReplayCommand::Release { key },
            },
        ]
    }

    #[test]
    fn step_applies_commands_up_to_now() {
        let (mut timeline, mut engine) = setup(vec![(1, ChartNote::normal(0, 0.5, 1))]);
        let log = ReplayLog::new(ReplayHeader::default(), press_release(1, 1000));
        let mut driver = ReplayDriver::new(&log, 1.0);

        driver.step(500.0, &mut timeline, &mut engine);
        assert_eq!(engine.basic().judged_notes(), 0);
        assert!(!driver.is_finished());

        driver.step(1100.0, &mut timeline, &mut engine);
        assert_eq!(engine.basic().area_count(JudgeArea::ExactPerfect), 1);
        assert!(driver.is_finished());
    }

    #[test]
    fn pitch_shift_scales_application_time_only() {
        let (mut timeline, mut engine) = setup(vec![(1, ChartNote::normal(0, 0.5, 1))]);
        let header = ReplayHeader {
            pitch_semitones: 12,
            ..Default::default()
        };
        let log = ReplayLog::new(header, press_release(1, 1000));
        let mut driver = ReplayDriver::new(&log, 1.0);
        assert!((driver.playback_speed() - 2.0).abs() < 1e-9);

        // The press is recorded at 1000 ms but applies once rel >= 2000 ms,
        // still judging with its recorded 1000 ms timestamp.
        driver.step(1999.0, &mut timeline, &mut engine);
        assert_eq!(engine.basic().judged_notes(), 0);
        driver.step(2000.0, &mut timeline, &mut engine);
        assert_eq!(engine.basic().area_count(JudgeArea::ExactPerfect), 1);
    }

    #[test]
    fn rate_modifier_divides_offsets() {
        let (mut timeline, mut engine) = setup(vec![(1, ChartNote::normal(0, 0.5, 1))]);
        let log = ReplayLog::new(ReplayHeader::default(), press_release(1, 1000));
        let mut driver = ReplayDriver::new(&log, 2.0);

        driver.step(500.0, &mut timeline, &mut engine);
        assert_eq!(engine.basic().area_count(JudgeArea::ExactPerfect), 1);
    }

    #[test]
    fn judge_commands_inject_directly() {
        let (mut timeline, mut engine) = setup(vec![(1, ChartNote::normal(0, 0.5, 1))]);
        let commands = vec![TimedCommand {
            ms: 1000,
            command: ReplayCommand::Judge {
                area: JudgeArea::LateGood,
            },
        }];
        let log = ReplayLog::new(ReplayHeader::default(), commands);
        let mut driver = ReplayDriver::new(&log, 1.0);

        driver.step(1000.0, &mut timeline, &mut engine);
        // Injected outcome, no note consumed.
        assert_eq!(engine.basic().area_count(JudgeArea::LateGood), 1);
        assert!(timeline.incoming_note(Lane::new(LaneCategory::Note, LaneIndex::Key1)).is_some());
    }

    #[test]
    fn skip_to_end_releases_held_keys() {
        let notes = vec![
            (1, ChartNote::hold_head(0, 0.0, 1)),
            (1, ChartNote::hold_tail(0, 0.5, 1)),
        ];
        let mut format = ChartFormat::new(ChartFormatKind::Bms, 120.0);
        for (key, note) in notes {
            let lane = Lane::new(LaneCategory::Long, LaneIndex::from_index(key).unwrap());
            format.push_note(lane, note);
        }
        let windows = WindowTable::for_difficulty(JudgeDifficulty::Easy);
        let mut timeline = ChartTimeline::from_format(&format).unwrap();
        timeline.set_miss_window(windows.miss_window());
        let gauge = Gauge::new(GaugeType::Normal, 300.0, timeline.note_count_total());
        let mut engine = JudgeEngine::new(windows, gauge, &timeline);
        engine.start();

        let commands = vec![TimedCommand {
            ms: 0,
            command: ReplayCommand::Press { key: 1 },
        }];
        let log = ReplayLog::new(ReplayHeader::default(), commands);
        let mut driver = ReplayDriver::new(&log, 1.0);

        driver.step(0.0, &mut timeline, &mut engine);
        assert!(engine.on_hold(1, 0.0));

        driver.skip_to_end(1000.0, &mut timeline, &mut engine);
        assert!(driver.is_finished());
        // The synthesized release judged the tail.
        assert!(!engine.on_hold(1, 1000.0));
        assert_eq!(engine.basic().area_count(JudgeArea::ExactPerfect), 2);
    }

    #[test]
    fn skip_to_end_applies_remaining_judges_only() {
        let (mut timeline, mut engine) = setup(vec![(1, ChartNote::normal(0, 0.5, 1))]);
        let commands = vec![
            TimedCommand {
                ms: 1000,
                command: ReplayCommand::Press { key: 1 },
            },
            TimedCommand {
                ms: 1500,
                command: ReplayCommand::Judge {
                    area: JudgeArea::EarlyGreat,
                },
            },
        ];
        let log = ReplayLog::new(ReplayHeader::default(), commands);
        let mut driver = ReplayDriver::new(&log, 1.0);

        driver.skip_to_end(2000.0, &mut timeline, &mut engine);
        // The raw press was not replayed; the injected judge was.
        assert_eq!(engine.basic().area_count(JudgeArea::EarlyGreat), 1);
        assert_eq!(engine.basic().area_count(JudgeArea::ExactPerfect), 0);
    }
}
