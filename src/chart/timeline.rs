use std::collections::BTreeMap;

use super::mapper::PositionTimeMapper;
use crate::error::ChartError;
use crate::model::chart::{ChartFormat, ChartFormatKind};
use crate::model::lane::{LANE_ID_COUNT, Lane, LaneCategory};
use crate::model::note::{ChartNote, Payload};

/// Expiry tolerance applied until the session installs its judge window.
pub const DEFAULT_MISS_WINDOW_MS: f64 = 280.0;

/// Margin subtracted from the first audible note to get the lead-in time.
const LEAD_IN_MARGIN_MS: f64 = 200.0;

/// A chart note plus its play-time bookkeeping.
#[derive(Debug, Clone)]
pub struct HitableNote {
    pub note: ChartNote,
    /// The note's miss deadline passed without a hit.
    pub expired: bool,
    /// The note was consumed by a judgment.
    pub hit: bool,
}

/// Display-only tempo aggregates over the chart's notes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TempoStats {
    /// Note-weighted mean tempo.
    pub average: f64,
    /// Tempo covering the most notes.
    pub main: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-lane ordered note sequences with forward-only cursors, plus the
/// position/time mapping and per-measure arrays for the whole chart.
///
/// Owned exclusively by one play session; mutated only by `update` and
/// `reset` (and `mark_hit` from the judge engine).
#[derive(Debug, Clone)]
pub struct ChartTimeline {
    mapper: PositionTimeMapper,
    lanes: Vec<Vec<HitableNote>>,
    cursors: Vec<usize>,
    /// Judgeable notes whose deadline passed unjudged; drained exactly once.
    expired: Vec<(Lane, ChartNote)>,
    /// Bgm/Special/Bpm notes whose timestamp passed; for audio/visual use.
    expired_auto: Vec<(Lane, ChartNote)>,
    miss_window_ms: f64,
    notes_expired: u32,
    note_count_regular: u32,
    note_count_long: u32,
    current_time_ms: f64,
    current_measure: u32,
    current_measure_pos: f64,
    current_bpm: f64,
    stats: TempoStats,
    total_length_ms: f64,
    lead_in_ms: f64,
}

impl ChartTimeline {
    /// Build a timeline from loaded chart data, keyed on the format tag.
    pub fn from_format(format: &ChartFormat) -> Result<Self, ChartError> {
        match format.kind {
            // Both text formats decode to the same lane/event shape; the
            // tag exists so a new format gets its own construction arm.
            ChartFormatKind::Bms | ChartFormatKind::Bmson => Self::build(format),
        }
    }

    fn build(format: &ChartFormat) -> Result<Self, ChartError> {
        let mapper = PositionTimeMapper::build(
            format.initial_bpm,
            &format.measure_lengths,
            &format.tempo_events,
            &format.pause_events,
            format.max_measure(),
        )?;

        let mut lanes: Vec<Vec<HitableNote>> = vec![Vec::new(); LANE_ID_COUNT];
        for (lane, note) in &format.notes {
            if !lane.is_valid() {
                continue;
            }
            let mut note = note.clone();
            note.time_ms = mapper.time_at(note.measure, note.pos);
            lanes[lane.id()].push(HitableNote {
                note,
                expired: false,
                hit: false,
            });
        }
        for lane in &mut lanes {
            lane.sort_by(|a, b| a.note.time_ms.total_cmp(&b.note.time_ms));
        }

        let mut note_count_regular = 0;
        let mut note_count_long = 0;
        let mut total_length_ms = 0.0f64;
        let mut first_sample_ms = f64::INFINITY;
        let mut bpm_note_count: BTreeMap<u64, u32> = BTreeMap::new();

        for (id, lane) in lanes.iter().enumerate() {
            let category = Lane::from_id(id).category();
            for hn in lane {
                total_length_ms = total_length_ms.max(hn.note.time_ms);
                if matches!(hn.note.payload, Payload::Sample(_)) {
                    first_sample_ms = first_sample_ms.min(hn.note.time_ms);
                }
                match category {
                    Some(LaneCategory::Note) => {
                        note_count_regular += 1;
                        let bpm = mapper.bpm_at_metre(mapper.metre_of(hn.note.measure, hn.note.pos));
                        *bpm_note_count.entry(bpm.to_bits()).or_insert(0) += 1;
                    }
                    Some(LaneCategory::Long) if !hn.note.is_hold_tail() => {
                        note_count_long += 1;
                        let bpm = mapper.bpm_at_metre(mapper.metre_of(hn.note.measure, hn.note.pos));
                        *bpm_note_count.entry(bpm.to_bits()).or_insert(0) += 1;
                    }
                    _ => {}
                }
            }
        }

        let initial_bpm = mapper.initial_bpm();
        let stats = Self::tempo_stats(&bpm_note_count, initial_bpm);
        let lead_in_ms = if first_sample_ms.is_finite() {
            (first_sample_ms - LEAD_IN_MARGIN_MS).max(0.0)
        } else {
            0.0
        };

        Ok(Self {
            mapper,
            lanes,
            cursors: vec![0; LANE_ID_COUNT],
            expired: Vec::new(),
            expired_auto: Vec::new(),
            miss_window_ms: DEFAULT_MISS_WINDOW_MS,
            notes_expired: 0,
            note_count_regular,
            note_count_long,
            current_time_ms: 0.0,
            current_measure: 0,
            current_measure_pos: 0.0,
            current_bpm: initial_bpm,
            stats,
            total_length_ms,
            lead_in_ms,
        })
    }

    fn tempo_stats(bpm_note_count: &BTreeMap<u64, u32>, initial_bpm: f64) -> TempoStats {
        if bpm_note_count.is_empty() {
            return TempoStats {
                average: initial_bpm,
                main: initial_bpm,
                min: initial_bpm,
                max: initial_bpm,
            };
        }
        let mut weighted = 0.0;
        let mut total = 0u32;
        let mut main = (0u32, initial_bpm);
        for (bits, count) in bpm_note_count {
            let bpm = f64::from_bits(*bits);
            weighted += bpm * *count as f64;
            total += *count;
            if *count > main.0 {
                main = (*count, bpm);
            }
        }
        // Keys are positive finite tempos, so bit order is numeric order.
        let min = f64::from_bits(*bpm_note_count.keys().next().expect("non-empty"));
        let max = f64::from_bits(*bpm_note_count.keys().next_back().expect("non-empty"));
        TempoStats {
            average: weighted / total as f64,
            main: main.1,
            min,
            max,
        }
    }

    /// Install the judge table's widest tolerance as the expiry window.
    pub fn set_miss_window(&mut self, miss_window_ms: f64) {
        if miss_window_ms.is_finite() && miss_window_ms >= 0.0 {
            self.miss_window_ms = miss_window_ms;
        }
    }

    pub fn miss_window(&self) -> f64 {
        self.miss_window_ms
    }

    /// Advance all lane cursors to the given relative time.
    ///
    /// Judgeable notes whose `time + miss window` has passed move into the
    /// expired list exactly once; notes already hit by a press advance the
    /// cursor silently. Safe to call repeatedly with the same time.
    pub fn update(&mut self, rel_time_ms: f64) {
        if rel_time_ms < self.current_time_ms {
            // The cursor never rewinds; an explicit reset is the only way back.
            return;
        }
        self.current_time_ms = rel_time_ms;

        for id in 0..LANE_ID_COUNT {
            let category = Lane::from_id(id).category().expect("id in range");
            let tolerance = if category.is_judgeable() {
                self.miss_window_ms
            } else {
                0.0
            };
            let counts = matches!(category, LaneCategory::Note | LaneCategory::Long);

            loop {
                let cursor = self.cursors[id];
                let Some(hn) = self.lanes[id].get_mut(cursor) else {
                    break;
                };
                if hn.hit {
                    self.cursors[id] += 1;
                    if counts {
                        self.notes_expired += 1;
                    }
                    continue;
                }
                if hn.note.time_ms + tolerance <= rel_time_ms {
                    hn.expired = true;
                    let entry = (Lane::from_id(id), hn.note.clone());
                    if category.is_judgeable() {
                        self.expired.push(entry);
                    } else {
                        self.expired_auto.push(entry);
                    }
                    self.cursors[id] += 1;
                    if counts {
                        self.notes_expired += 1;
                    }
                    continue;
                }
                break;
            }
        }

        let metre = self.mapper.metre_at_time(rel_time_ms);
        let (measure, pos) = self.mapper.measure_of_metre(metre);
        self.current_measure = measure;
        self.current_measure_pos = pos;
        self.current_bpm = self.mapper.bpm_at_metre(metre);
    }

    /// Rewind every cursor and clear play-time state. The note data itself
    /// is untouched.
    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            for hn in lane {
                hn.expired = false;
                hn.hit = false;
            }
        }
        self.cursors = vec![0; LANE_ID_COUNT];
        self.expired.clear();
        self.expired_auto.clear();
        self.notes_expired = 0;
        self.current_time_ms = 0.0;
        self.current_measure = 0;
        self.current_measure_pos = 0.0;
        self.current_bpm = self.mapper.initial_bpm();
    }

    /// First pending (neither hit nor expired) note on a lane, with its
    /// index for a later `mark_hit`.
    pub fn incoming_note(&self, lane: Lane) -> Option<(usize, &HitableNote)> {
        if !lane.is_valid() {
            return None;
        }
        let notes = &self.lanes[lane.id()];
        notes
            .iter()
            .enumerate()
            .skip(self.cursors[lane.id()])
            .find(|(_, hn)| !hn.hit && !hn.expired)
    }

    /// Whether a lane has no notes left past its cursor.
    pub fn is_last_note(&self, lane: Lane) -> bool {
        if !lane.is_valid() {
            return true;
        }
        self.cursors[lane.id()] >= self.lanes[lane.id()].len()
    }

    /// Consume a note by judgment, removing it from miss consideration
    /// immediately.
    pub fn mark_hit(&mut self, lane: Lane, index: usize) {
        if !lane.is_valid() {
            return;
        }
        let id = lane.id();
        let Some(hn) = self.lanes[id].get_mut(index) else {
            return;
        };
        hn.hit = true;

        let counts = matches!(
            lane.category(),
            Some(LaneCategory::Note) | Some(LaneCategory::Long)
        );
        while let Some(hn) = self.lanes[id].get(self.cursors[id]) {
            if hn.hit {
                self.cursors[id] += 1;
                if counts {
                    self.notes_expired += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Drain judgeable notes that expired unjudged. Each note appears at
    /// most once across all calls.
    pub fn take_expired(&mut self) -> Vec<(Lane, ChartNote)> {
        std::mem::take(&mut self.expired)
    }

    /// Drain expired Bgm/Special/Bpm notes for the audio/visual collaborators.
    pub fn take_expired_auto(&mut self) -> Vec<(Lane, ChartNote)> {
        std::mem::take(&mut self.expired_auto)
    }

    /// True when no Note/Long lane has a pending note left.
    pub fn is_exhausted(&self) -> bool {
        for id in 0..LANE_ID_COUNT {
            if !matches!(
                Lane::from_id(id).category(),
                Some(LaneCategory::Note) | Some(LaneCategory::Long)
            ) {
                continue;
            }
            let pending = self.lanes[id]
                .iter()
                .skip(self.cursors[id])
                .any(|hn| !hn.hit && !hn.expired);
            if pending {
                return false;
            }
        }
        true
    }

    /// Regular notes plus hold notes (a hold counts once).
    pub fn note_count_total(&self) -> u32 {
        self.note_count_regular + self.note_count_long
    }

    pub fn note_count_regular(&self) -> u32 {
        self.note_count_regular
    }

    pub fn note_count_long(&self) -> u32 {
        self.note_count_long
    }

    /// Notes passed by the cursor so far (hit or expired), Note/Long lanes.
    pub fn notes_expired(&self) -> u32 {
        self.notes_expired
    }

    pub fn mapper(&self) -> &PositionTimeMapper {
        &self.mapper
    }

    pub fn stats(&self) -> TempoStats {
        self.stats
    }

    pub fn current_measure(&self) -> u32 {
        self.current_measure
    }

    /// Fractional position within the current measure, `[0, 1)`.
    pub fn current_measure_pos(&self) -> f64 {
        self.current_measure_pos
    }

    pub fn current_bpm(&self) -> f64 {
        self.current_bpm
    }

    /// Timestamp of the last note of any kind.
    pub fn total_length_ms(&self) -> f64 {
        self.total_length_ms
    }

    /// First audible note time minus a fixed margin, floored at zero.
    pub fn lead_in_ms(&self) -> f64 {
        self.lead_in_ms
    }
}
