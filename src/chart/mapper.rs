use crate::error::ChartError;
use crate::model::chart::{MeasureLength, PauseEvent, TempoEvent};

/// Hard cap on addressable measures, matching the fixed per-measure arrays.
pub const MAX_MEASURES: usize = 1000;

/// Shortest measure a chart may declare; shorter declarations are clamped.
pub const MIN_MEASURE_LENGTH: f64 = 1.0 / 192.0;

/// Milliseconds spanned by one whole 4/4 measure at 1 BPM.
const WHOLE_MEASURE_MS: f64 = 240_000.0;

/// A point where the position/time relation changes: a measure boundary,
/// a tempo change, or a pause. `time_at` is the arrival time; `time_after`
/// additionally includes any pause applied at this point.
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    metre: f64,
    time_at: f64,
    time_after: f64,
    bpm_after: f64,
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    Boundary(u32),
    Tempo(f64),
    Pause(f64),
}

impl EventKind {
    /// Application order at one chart position: record the boundary, apply
    /// tempo changes in input order (last wins), then accumulate pauses.
    fn rank(self) -> u8 {
        match self {
            EventKind::Boundary(_) => 0,
            EventKind::Tempo(_) => 1,
            EventKind::Pause(_) => 2,
        }
    }
}

/// Monotonic mapping from chart position (measure + fractional offset,
/// flattened to global metre units) to absolute milliseconds.
#[derive(Debug, Clone)]
pub struct PositionTimeMapper {
    initial_bpm: f64,
    measure_lengths: Vec<f64>,
    /// Cumulative metre offset of each measure start; one extra entry for
    /// the chart end.
    measure_metre: Vec<f64>,
    measure_timestamps: Vec<f64>,
    breakpoints: Vec<Breakpoint>,
}

impl PositionTimeMapper {
    /// Integrate tempo and pause events over the measure grid.
    ///
    /// `max_measure` is the highest measure index any note or event uses.
    pub fn build(
        initial_bpm: f64,
        measure_lengths: &[MeasureLength],
        tempo_events: &[TempoEvent],
        pause_events: &[PauseEvent],
        max_measure: u32,
    ) -> Result<Self, ChartError> {
        if !initial_bpm.is_finite() || initial_bpm <= 0.0 {
            return Err(ChartError::InvalidInitialTempo { bpm: initial_bpm });
        }
        if max_measure as usize >= MAX_MEASURES {
            return Err(ChartError::MeasureOutOfRange {
                measure: max_measure,
                max: MAX_MEASURES - 1,
            });
        }

        let lengths = Self::build_measure_lengths(measure_lengths, max_measure);

        let mut measure_metre = Vec::with_capacity(lengths.len() + 1);
        let mut acc = 0.0;
        for len in &lengths {
            measure_metre.push(acc);
            acc += len;
        }
        measure_metre.push(acc);

        let points = Self::collect_points(&lengths, &measure_metre, tempo_events, pause_events);

        let mut breakpoints: Vec<Breakpoint> = Vec::with_capacity(points.len());
        let mut measure_timestamps = vec![0.0; lengths.len()];
        let mut time = 0.0;
        let mut bpm = initial_bpm;
        let mut prev_metre = 0.0;

        for (metre, kind) in points {
            let same_point = breakpoints
                .last()
                .is_some_and(|bp| bp.metre == metre);
            if !same_point {
                time += (metre - prev_metre) * WHOLE_MEASURE_MS / bpm;
                prev_metre = metre;
                breakpoints.push(Breakpoint {
                    metre,
                    time_at: time,
                    time_after: time,
                    bpm_after: bpm,
                });
            }
            let bp = breakpoints.last_mut().expect("just pushed");
            match kind {
                EventKind::Boundary(m) => {
                    measure_timestamps[m as usize] = bp.time_at;
                }
                EventKind::Tempo(new_bpm) => {
                    bpm = new_bpm;
                    bp.bpm_after = new_bpm;
                }
                EventKind::Pause(ms) => {
                    bp.time_after += ms;
                    time = bp.time_after;
                }
            }
        }

        Ok(Self {
            initial_bpm,
            measure_lengths: lengths,
            measure_metre,
            measure_timestamps,
            breakpoints,
        })
    }

    pub fn initial_bpm(&self) -> f64 {
        self.initial_bpm
    }

    pub fn measure_count(&self) -> usize {
        self.measure_lengths.len()
    }

    pub fn measure_length(&self, measure: u32) -> f64 {
        self.measure_lengths
            .get(measure as usize)
            .copied()
            .unwrap_or(1.0)
    }

    /// Absolute timestamp of a measure start, if the measure exists.
    pub fn measure_timestamp(&self, measure: u32) -> Option<f64> {
        self.measure_timestamps.get(measure as usize).copied()
    }

    /// Global metre of a chart position. `pos` outside `[0, 1)` is clamped.
    pub fn metre_of(&self, measure: u32, pos: f64) -> f64 {
        let m = measure as usize;
        if m >= self.measure_lengths.len() {
            return *self.measure_metre.last().expect("never empty");
        }
        let pos = if pos.is_finite() { pos.clamp(0.0, 1.0) } else { 0.0 };
        self.measure_metre[m] + pos * self.measure_lengths[m]
    }

    /// Total metre span of the chart.
    pub fn total_metre(&self) -> f64 {
        *self.measure_metre.last().expect("never empty")
    }

    /// Absolute milliseconds of a chart position.
    pub fn time_at(&self, measure: u32, pos: f64) -> f64 {
        self.time_at_metre(self.metre_of(measure, pos))
    }

    /// Absolute milliseconds of a global metre position.
    ///
    /// A position exactly at a pause resolves to the arrival time; the pause
    /// applies to everything after it.
    pub fn time_at_metre(&self, metre: f64) -> f64 {
        match self
            .breakpoints
            .binary_search_by(|bp| bp.metre.total_cmp(&metre))
        {
            Ok(index) => self.breakpoints[index].time_at,
            Err(0) => 0.0,
            Err(pos) => {
                let bp = self.breakpoints[pos - 1];
                bp.time_after + (metre - bp.metre) * WHOLE_MEASURE_MS / bp.bpm_after
            }
        }
    }

    /// Tempo in effect at a global metre position.
    pub fn bpm_at_metre(&self, metre: f64) -> f64 {
        match self
            .breakpoints
            .binary_search_by(|bp| bp.metre.total_cmp(&metre))
        {
            Ok(index) => self.breakpoints[index].bpm_after,
            Err(0) => self.initial_bpm,
            Err(pos) => self.breakpoints[pos - 1].bpm_after,
        }
    }

    /// Inverse mapping: global metre position at an absolute time.
    /// Time inside a pause holds the pause's position.
    pub fn metre_at_time(&self, time_ms: f64) -> f64 {
        let time_ms = time_ms.max(0.0);
        let pos = self
            .breakpoints
            .partition_point(|bp| bp.time_at <= time_ms);
        if pos == 0 {
            return 0.0;
        }
        let bp = self.breakpoints[pos - 1];
        let metre = if time_ms < bp.time_after {
            bp.metre
        } else {
            bp.metre + (time_ms - bp.time_after) * bp.bpm_after / WHOLE_MEASURE_MS
        };
        metre.min(self.total_metre())
    }

    /// Decompose a global metre into `(measure, fraction within measure)`.
    pub fn measure_of_metre(&self, metre: f64) -> (u32, f64) {
        let count = self.measure_lengths.len();
        let pos = self.measure_metre[..count].partition_point(|m| *m <= metre);
        let m = pos.saturating_sub(1).min(count - 1);
        let frac = ((metre - self.measure_metre[m]) / self.measure_lengths[m]).clamp(0.0, 1.0);
        (m as u32, frac)
    }

    fn build_measure_lengths(overrides: &[MeasureLength], max_measure: u32) -> Vec<f64> {
        let mut lengths = vec![1.0; max_measure as usize + 1];
        for entry in overrides {
            let slot = match lengths.get_mut(entry.measure as usize) {
                Some(slot) => slot,
                None => continue,
            };
            if !entry.length.is_finite() || entry.length < MIN_MEASURE_LENGTH {
                log::warn!(
                    "measure {} declares length {}, clamping to {}",
                    entry.measure,
                    entry.length,
                    MIN_MEASURE_LENGTH
                );
                *slot = MIN_MEASURE_LENGTH;
            } else {
                *slot = entry.length;
            }
        }
        lengths
    }

    fn collect_points(
        lengths: &[f64],
        measure_metre: &[f64],
        tempo_events: &[TempoEvent],
        pause_events: &[PauseEvent],
    ) -> Vec<(f64, EventKind)> {
        let metre_of = |measure: u32, pos: f64| -> f64 {
            let m = (measure as usize).min(lengths.len() - 1);
            let pos = if pos.is_finite() { pos.clamp(0.0, 1.0) } else { 0.0 };
            measure_metre[m] + pos * lengths[m]
        };

        let mut points: Vec<(f64, EventKind)> = Vec::new();
        for (m, metre) in measure_metre[..lengths.len()].iter().enumerate() {
            points.push((*metre, EventKind::Boundary(m as u32)));
        }
        for ev in tempo_events {
            if !ev.bpm.is_finite() || ev.bpm <= 0.0 {
                log::warn!(
                    "dropping tempo change to {} at measure {}: not a positive tempo",
                    ev.bpm,
                    ev.measure
                );
                continue;
            }
            points.push((metre_of(ev.measure, ev.pos), EventKind::Tempo(ev.bpm)));
        }
        for ev in pause_events {
            if !ev.duration_ms.is_finite() || ev.duration_ms < 0.0 {
                log::warn!(
                    "dropping pause of {} ms at measure {}: not a valid duration",
                    ev.duration_ms,
                    ev.measure
                );
                continue;
            }
            points.push((metre_of(ev.measure, ev.pos), EventKind::Pause(ev.duration_ms)));
        }

        let tempo_sorted = tempo_events
            .windows(2)
            .all(|w| (w[0].measure, w[0].pos) <= (w[1].measure, w[1].pos));
        let pause_sorted = pause_events
            .windows(2)
            .all(|w| (w[0].measure, w[0].pos) <= (w[1].measure, w[1].pos));
        if !tempo_sorted || !pause_sorted {
            log::warn!("chart timing events are not in chart order, sorting");
        }
        // Stable sort keeps input order for duplicate events at one position,
        // so the last authored tempo wins.
        points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.rank().cmp(&b.1.rank())));
        points
    }
}
