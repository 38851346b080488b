use log::debug;

use super::area::{JudgeArea, JudgeTier};
use super::gauge::Gauge;
use super::score::BasicData;
use super::window::WindowTable;
use crate::chart::timeline::ChartTimeline;
use crate::model::lane::{LANE_INDEX_COUNT, Lane, LaneCategory, LaneIndex};
use crate::model::note::{ChartNote, Payload};

/// Press-to-mine distance that detonates a mine.
pub const MINE_WINDOW_MS: f64 = 100.0;

/// Mine damage used when a judgment arrives without a note (replay
/// injection); notes carry their own damage.
pub const DEFAULT_MINE_DAMAGE: f64 = 0.02;

/// Session lifecycle. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Cleared,
    Failed,
}

/// A hold whose head was judged and whose tail is still owed.
#[derive(Debug, Clone, Copy)]
struct HoldState {
    lane: Lane,
    tail_index: usize,
    tail_time_ms: f64,
}

/// Classifies input transitions against the timeline and maintains the
/// score/combo/health record and clear/fail status.
#[derive(Debug)]
pub struct JudgeEngine {
    windows: WindowTable,
    gauge: Gauge,
    basic: BasicData,
    state: SessionState,
    holding: Vec<Option<HoldState>>,
    total_notes: u32,
    max_combo_possible: u32,
}

impl JudgeEngine {
    pub fn new(windows: WindowTable, gauge: Gauge, timeline: &ChartTimeline) -> Self {
        let mut basic = BasicData::default();
        basic.health = gauge.health();
        Self {
            windows,
            gauge,
            basic,
            state: SessionState::NotStarted,
            holding: vec![None; LANE_INDEX_COUNT],
            total_notes: timeline.note_count_total(),
            // A hold scores combo at both head and tail.
            max_combo_possible: timeline.note_count_regular() + timeline.note_count_long() * 2,
        }
    }

    /// Transition into the running state. Idempotent once running.
    pub fn start(&mut self) {
        if self.state == SessionState::NotStarted {
            self.state = SessionState::Running;
        }
    }

    /// Judge a press transition on a key. Returns the outcome, or `None`
    /// for a ghost press (no note within the widest window), which has no
    /// effect beyond an optional sound.
    pub fn on_press(
        &mut self,
        key: usize,
        t_ms: f64,
        timeline: &mut ChartTimeline,
    ) -> Option<JudgeArea> {
        if self.state != SessionState::Running {
            return None;
        }
        let index = LaneIndex::from_index(key)?;

        // Mines detonate before any note lookup.
        let mine_lane = Lane::new(LaneCategory::Mine, index);
        let mine = timeline.incoming_note(mine_lane).and_then(|(i, hn)| {
            if (hn.note.time_ms - t_ms).abs() <= MINE_WINDOW_MS {
                let damage = match hn.note.payload {
                    Payload::MineDamage(d) => d,
                    _ => DEFAULT_MINE_DAMAGE,
                };
                Some((i, damage))
            } else {
                None
            }
        });
        if let Some((i, damage)) = mine {
            timeline.mark_hit(mine_lane, i);
            self.apply(JudgeArea::MineHit, t_ms, damage);
            return Some(JudgeArea::MineHit);
        }

        // Nearest unjudged head across the regular and hold lanes.
        let note_lane = Lane::new(LaneCategory::Note, index);
        let long_lane = Lane::new(LaneCategory::Long, index);
        let mut best: Option<(Lane, usize, f64)> = None;
        for lane in [note_lane, long_lane] {
            if let Some((i, hn)) = timeline.incoming_note(lane) {
                if hn.note.is_hold_tail() {
                    continue;
                }
                let delta = t_ms - hn.note.time_ms;
                if delta.abs() > self.windows.press.bad {
                    continue;
                }
                if best.is_none_or(|(_, _, d)| delta.abs() < d.abs()) {
                    best = Some((lane, i, delta));
                }
            }
        }
        let (lane, i, delta) = best?;

        let tier = self
            .windows
            .press
            .judge(delta.abs())
            .expect("delta is within the widest window");
        let area = JudgeArea::classify(delta, tier);
        timeline.mark_hit(lane, i);

        if lane == long_lane {
            let tail = timeline.incoming_note(long_lane).and_then(|(ti, tn)| {
                tn.note
                    .is_hold_tail()
                    .then(|| (ti, tn.note.time_ms))
            });
            if let Some((tail_index, tail_time_ms)) = tail {
                self.holding[key] = Some(HoldState {
                    lane: long_lane,
                    tail_index,
                    tail_time_ms,
                });
            }
        }

        self.apply(area, t_ms, DEFAULT_MINE_DAMAGE);
        Some(area)
    }

    /// Keep-alive for a held key. Heads are judged on press and tails on
    /// release or expiry, so nothing is re-judged here. Returns whether the
    /// key still owes a tail.
    pub fn on_hold(&mut self, key: usize, _t_ms: f64) -> bool {
        self.holding.get(key).is_some_and(|h| h.is_some())
    }

    /// Judge a release transition on a key against the owed hold tail.
    pub fn on_release(
        &mut self,
        key: usize,
        t_ms: f64,
        timeline: &mut ChartTimeline,
    ) -> Option<JudgeArea> {
        if self.state != SessionState::Running {
            return None;
        }
        let hold = self.holding.get_mut(key)?.take()?;

        let delta = t_ms - hold.tail_time_ms;
        if delta < -self.windows.release.bad {
            // Released before the tail window opened: early break.
            timeline.mark_hit(hold.lane, hold.tail_index);
            self.apply(JudgeArea::Miss, t_ms, DEFAULT_MINE_DAMAGE);
            return Some(JudgeArea::Miss);
        }
        if let Some(tier) = self.windows.release.judge(delta.abs()) {
            let area = JudgeArea::classify(delta, tier);
            timeline.mark_hit(hold.lane, hold.tail_index);
            self.apply(area, t_ms, DEFAULT_MINE_DAMAGE);
            return Some(area);
        }
        // Released after the window closed; the tail expires through the
        // timeline like any other unjudged note.
        None
    }

    /// Consume notes the timeline expired unjudged, applying MISS with the
    /// note's own timestamp so the outcome is independent of polling rate.
    pub fn consume_expired(&mut self, timeline: &mut ChartTimeline) {
        if self.state != SessionState::Running {
            timeline.take_expired();
            return;
        }
        for (lane, note) in timeline.take_expired() {
            if self.state != SessionState::Running {
                break;
            }
            match lane.category() {
                Some(LaneCategory::Mine) | Some(LaneCategory::Invisible) => {}
                Some(LaneCategory::Note) => {
                    self.apply(JudgeArea::Miss, note.time_ms, DEFAULT_MINE_DAMAGE);
                }
                Some(LaneCategory::Long) => {
                    if note.is_hold_tail() {
                        self.miss_held_tail(lane, &note);
                    } else {
                        self.apply(JudgeArea::Miss, note.time_ms, DEFAULT_MINE_DAMAGE);
                        // A missed head retires its pending tail silently.
                        let tail = timeline
                            .incoming_note(lane)
                            .and_then(|(ti, tn)| tn.note.is_hold_tail().then_some(ti));
                        if let Some(ti) = tail {
                            timeline.mark_hit(lane, ti);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// An expired tail only scores a MISS when its hold was live; orphan
    /// tails were already settled with their head.
    fn miss_held_tail(&mut self, lane: Lane, note: &ChartNote) {
        let Some(index) = lane.lane_index() else {
            return;
        };
        let key = index.index();
        let held = self.holding[key]
            .is_some_and(|h| h.lane == lane && h.tail_time_ms == note.time_ms);
        if held {
            self.holding[key] = None;
            self.apply(JudgeArea::Miss, note.time_ms, DEFAULT_MINE_DAMAGE);
        }
    }

    /// Inject a pre-computed judgment outcome. This is the replay driver's
    /// direct path: no note lookup, no re-derivation.
    pub fn apply_judgment(&mut self, area: JudgeArea, t_ms: f64) {
        if self.state != SessionState::Running {
            return;
        }
        self.apply(area, t_ms, DEFAULT_MINE_DAMAGE);
    }

    fn apply(&mut self, area: JudgeArea, _t_ms: f64, mine_damage: f64) {
        self.basic.record(area, self.total_notes);
        self.gauge.apply(area.tier(), mine_damage);
        self.basic.health = self.gauge.health();

        if self.gauge.is_failed() && self.state == SessionState::Running {
            debug!("gauge hit the floor, session failed");
            self.state = SessionState::Failed;
        }
    }

    /// End-of-chart decision: once every note lane is exhausted, the session
    /// clears iff the gauge's clear condition holds and no fail triggered.
    pub fn finish(&mut self, timeline: &ChartTimeline) {
        if self.state != SessionState::Running || !timeline.is_exhausted() {
            return;
        }
        self.state = if self.gauge.is_cleared() {
            SessionState::Cleared
        } else {
            SessionState::Failed
        };
    }

    pub fn set_play_time(&mut self, t_ms: f64) {
        self.basic.play_time_ms = t_ms;
    }

    /// Snapshot of the judgment record.
    pub fn basic(&self) -> BasicData {
        self.basic
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_cleared(&self) -> bool {
        self.state == SessionState::Cleared
    }

    pub fn is_failed(&self) -> bool {
        self.state == SessionState::Failed
    }

    pub fn windows(&self) -> &WindowTable {
        &self.windows
    }

    pub fn gauge(&self) -> &Gauge {
        &self.gauge
    }

    pub fn total_notes(&self) -> u32 {
        self.total_notes
    }

    /// Best reachable combo: regular notes once, holds twice.
    pub fn max_combo_possible(&self) -> u32 {
        self.max_combo_possible
    }
}
