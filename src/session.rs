use parking_lot::Mutex;

use crate::chart::timeline::{ChartTimeline, TempoStats};
use crate::error::SessionError;
use crate::judge::engine::{JudgeEngine, SessionState};
use crate::judge::gauge::{DEFAULT_TOTAL, Gauge, GaugeType};
use crate::judge::score::BasicData;
use crate::judge::window::{JudgeDifficulty, WindowTable};
use crate::model::chart::ChartFormat;
use crate::model::lane::{LANE_INDEX_COUNT, Lane};
use crate::model::note::ChartNote;
use crate::replay::command::{ReplayHeader, ReplayLog};
use crate::replay::driver::ReplayDriver;
use crate::replay::recorder::ReplayRecorder;

/// Session construction parameters. The gauge is always the caller's
/// choice; the judge difficulty falls back to the chart's declared rank.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub gauge: GaugeType,
    /// Overrides the chart's declared rank. Construction fails if neither
    /// side resolves a difficulty.
    pub difficulty: Option<JudgeDifficulty>,
    /// Session-wide playback-rate modifier, dividing replay offsets.
    pub rate_modifier: f64,
    /// When set, the session is driven by this log instead of live input.
    pub replay: Option<ReplayLog>,
}

impl SessionOptions {
    pub fn new(gauge: GaugeType) -> Self {
        Self {
            gauge,
            difficulty: None,
            rate_modifier: 1.0,
            replay: None,
        }
    }
}

struct SessionInner {
    timeline: ChartTimeline,
    engine: JudgeEngine,
    driver: Option<ReplayDriver>,
    recorder: ReplayRecorder,
    start_ms: Option<f64>,
}

/// One chart-play session.
///
/// The timing tick and the input-polling tick run as independent periodic
/// tasks but mutate the same timeline and judgment state, so every entry
/// point here takes the session's single lock. Time is sampled once per
/// tick by the caller and passed in, giving all lanes the same snapshot.
pub struct PlaySession {
    inner: Mutex<SessionInner>,
}

impl PlaySession {
    /// Build a session. An unresolved judge configuration is fatal: the
    /// session must not start in an undefined state.
    pub fn new(format: &ChartFormat, options: SessionOptions) -> Result<Self, SessionError> {
        let difficulty = options
            .difficulty
            .or_else(|| format.judge_rank.map(JudgeDifficulty::from_bms_rank))
            .ok_or(SessionError::UnresolvedJudgeConfig)?;
        if !options.rate_modifier.is_finite() || options.rate_modifier <= 0.0 {
            return Err(SessionError::InvalidPlaybackRate {
                rate: options.rate_modifier,
            });
        }

        let windows = WindowTable::for_difficulty(difficulty);
        let mut timeline = ChartTimeline::from_format(format)?;
        timeline.set_miss_window(windows.miss_window());

        let gauge = Gauge::new(
            options.gauge,
            format.total_value.unwrap_or(DEFAULT_TOTAL),
            timeline.note_count_total(),
        );
        let engine = JudgeEngine::new(windows, gauge, &timeline);
        let driver = options
            .replay
            .as_ref()
            .map(|log| ReplayDriver::new(log, options.rate_modifier));

        Ok(Self {
            inner: Mutex::new(SessionInner {
                timeline,
                engine,
                driver,
                recorder: ReplayRecorder::new(),
                start_ms: None,
            }),
        })
    }

    /// Begin the session at the given wall-clock time.
    pub fn start(&self, now_ms: f64) {
        let mut inner = self.inner.lock();
        if inner.start_ms.is_none() {
            inner.start_ms = Some(now_ms);
        }
        inner.engine.start();
    }

    /// The fixed-rate timing tick: advances replay, cursors, automatic
    /// misses, and the end-of-chart decision. No-op before `start` and
    /// after a terminal state.
    pub fn tick(&self, now_ms: f64) {
        let mut inner = self.inner.lock();
        let Some(start) = inner.start_ms else {
            return;
        };
        if Self::terminal(inner.engine.state()) {
            return;
        }
        let rel = now_ms - start;
        inner.engine.set_play_time(rel);

        let SessionInner {
            timeline,
            engine,
            driver,
            ..
        } = &mut *inner;
        if let Some(driver) = driver {
            driver.step(rel, timeline, engine);
        }
        timeline.update(rel);
        engine.consume_expired(timeline);
        engine.finish(timeline);
    }

    /// A press transition from the input layer. Out-of-range keys are
    /// ignored; replay-driven sessions ignore live input entirely.
    pub fn on_press(&self, key: usize, now_ms: f64) {
        self.live_input(key, now_ms, true);
    }

    /// A release transition from the input layer.
    pub fn on_release(&self, key: usize, now_ms: f64) {
        self.live_input(key, now_ms, false);
    }

    /// A hold keep-alive from the input layer.
    pub fn on_hold(&self, key: usize, now_ms: f64) {
        let mut inner = self.inner.lock();
        let Some(start) = inner.start_ms else {
            return;
        };
        if inner.driver.is_some() {
            return;
        }
        inner.engine.on_hold(key, now_ms - start);
    }

    fn live_input(&self, key: usize, now_ms: f64, pressed: bool) {
        if key >= LANE_INDEX_COUNT {
            return;
        }
        let mut inner = self.inner.lock();
        let Some(start) = inner.start_ms else {
            return;
        };
        if inner.driver.is_some() {
            return;
        }
        let rel = now_ms - start;

        let offset = rel.round() as i64;
        if pressed {
            inner.recorder.record_press(key, offset);
        } else {
            inner.recorder.record_release(key, offset);
        }

        let SessionInner {
            timeline, engine, ..
        } = &mut *inner;
        if pressed {
            engine.on_press(key, rel, timeline);
        } else {
            engine.on_release(key, rel, timeline);
        }
    }

    /// Abort playback deterministically: drain the replay log, expire every
    /// remaining note, and settle the clear/fail decision.
    pub fn skip_to_end(&self, now_ms: f64) {
        let mut inner = self.inner.lock();
        let start = match inner.start_ms {
            Some(start) => start,
            None => {
                inner.start_ms = Some(now_ms);
                inner.engine.start();
                now_ms
            }
        };
        if Self::terminal(inner.engine.state()) {
            return;
        }

        let SessionInner {
            timeline,
            engine,
            driver,
            ..
        } = &mut *inner;
        let end = (now_ms - start)
            .max(timeline.total_length_ms() + timeline.miss_window() + 1.0);
        engine.set_play_time(end);
        if let Some(driver) = driver {
            driver.skip_to_end(end, timeline, engine);
        }
        timeline.update(end);
        engine.consume_expired(timeline);
        engine.finish(timeline);
    }

    /// Judgment record snapshot for HUD display and score recording.
    pub fn snapshot(&self) -> BasicData {
        self.inner.lock().engine.basic()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().engine.state()
    }

    pub fn is_cleared(&self) -> bool {
        self.inner.lock().engine.is_cleared()
    }

    pub fn is_failed(&self) -> bool {
        self.inner.lock().engine.is_failed()
    }

    /// Expired Bgm/Special/Bpm notes for the audio/visual collaborators.
    pub fn take_auto_events(&self) -> Vec<(Lane, ChartNote)> {
        self.inner.lock().timeline.take_expired_auto()
    }

    pub fn tempo_stats(&self) -> TempoStats {
        self.inner.lock().timeline.stats()
    }

    pub fn notes_expired(&self) -> u32 {
        self.inner.lock().timeline.notes_expired()
    }

    /// Finalize the live-input capture into a storable log.
    pub fn recorded_log(&self, header: ReplayHeader) -> ReplayLog {
        self.inner.lock().recorder.clone().into_log(header)
    }

    fn terminal(state: SessionState) -> bool {
        matches!(state, SessionState::Cleared | SessionState::Failed)
    }
}
