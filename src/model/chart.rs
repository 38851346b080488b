use super::lane::Lane;
use super::note::ChartNote;

/// Closed enumeration of supported chart source formats.
///
/// The timeline factory is keyed on this tag; adding a format means adding
/// a variant here, not downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormatKind {
    Bms,
    Bmson,
}

/// A measure-length override: the named measure spans `length` whole-measure
/// units instead of the default 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureLength {
    pub measure: u32,
    pub length: f64,
}

/// A tempo change at a chart position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEvent {
    pub measure: u32,
    /// Fractional offset within the measure, `[0, 1)`.
    pub pos: f64,
    pub bpm: f64,
}

/// A pause at a chart position: time passes, chart position does not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseEvent {
    pub measure: u32,
    /// Fractional offset within the measure, `[0, 1)`.
    pub pos: f64,
    pub duration_ms: f64,
}

/// Everything the chart loader hands over: per-lane notes positioned in
/// chart coordinates plus the timing events needed to place them in time.
///
/// Decoding chart text into this structure is the loader's concern and out
/// of scope here.
#[derive(Debug, Clone)]
pub struct ChartFormat {
    pub kind: ChartFormatKind,
    /// Tempo in effect at chart start.
    pub initial_bpm: f64,
    pub measure_lengths: Vec<MeasureLength>,
    pub tempo_events: Vec<TempoEvent>,
    pub pause_events: Vec<PauseEvent>,
    /// Notes per lane, in chart order. Times are assigned during timeline
    /// construction; `ChartNote::time_ms` is ignored on input.
    pub notes: Vec<(Lane, ChartNote)>,
    /// Declared judge strictness (BMS #RANK), if any.
    pub judge_rank: Option<u32>,
    /// Declared gauge total (BMS #TOTAL), if any.
    pub total_value: Option<f64>,
}

impl ChartFormat {
    pub fn new(kind: ChartFormatKind, initial_bpm: f64) -> Self {
        Self {
            kind,
            initial_bpm,
            measure_lengths: Vec::new(),
            tempo_events: Vec::new(),
            pause_events: Vec::new(),
            notes: Vec::new(),
            judge_rank: None,
            total_value: None,
        }
    }

    /// Add a note to a lane. Invalid lanes are dropped with a warning.
    pub fn push_note(&mut self, lane: Lane, note: ChartNote) {
        if !lane.is_valid() {
            log::warn!(
                "dropping note at measure {} pos {}: invalid lane",
                note.measure,
                note.pos
            );
            return;
        }
        self.notes.push((lane, note));
    }

    /// Highest measure index referenced by any note or event.
    pub fn max_measure(&self) -> u32 {
        let mut max = 0;
        for (_, note) in &self.notes {
            max = max.max(note.measure);
        }
        for len in &self.measure_lengths {
            max = max.max(len.measure);
        }
        for ev in &self.tempo_events {
            max = max.max(ev.measure);
        }
        for ev in &self.pause_events {
            max = max.max(ev.measure);
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lane::{LaneCategory, LaneIndex};

    #[test]
    fn push_note_drops_invalid_lane() {
        let mut format = ChartFormat::new(ChartFormatKind::Bms, 130.0);
        format.push_note(Lane::INVALID, ChartNote::normal(0, 0.0, 1));
        assert!(format.notes.is_empty());

        let lane = Lane::new(LaneCategory::Note, LaneIndex::Key1);
        format.push_note(lane, ChartNote::normal(0, 0.0, 1));
        assert_eq!(format.notes.len(), 1);
    }

    #[test]
    fn max_measure_scans_all_inputs() {
        let mut format = ChartFormat::new(ChartFormatKind::Bms, 130.0);
        let lane = Lane::new(LaneCategory::Note, LaneIndex::Key1);
        format.push_note(lane, ChartNote::normal(3, 0.0, 1));
        format.tempo_events.push(TempoEvent {
            measure: 7,
            pos: 0.5,
            bpm: 180.0,
        });
        format.pause_events.push(PauseEvent {
            measure: 5,
            pos: 0.0,
            duration_ms: 500.0,
        });
        assert_eq!(format.max_measure(), 7);
    }
}
