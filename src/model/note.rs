/// Kind flags distinguishing note variants within a lane list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteFlags(u32);

impl NoteFlags {
    pub const NONE: NoteFlags = NoteFlags(0);
    /// Tail of a hold note.
    pub const HOLD_TAIL: NoteFlags = NoteFlags(1);
    /// Mine note.
    pub const MINE: NoteFlags = NoteFlags(1 << 1);
    /// Invisible note (keysound only).
    pub const INVISIBLE: NoteFlags = NoteFlags(1 << 2);
    /// Note on a scratch lane.
    pub const SCRATCH: NoteFlags = NoteFlags(1 << 3);
    /// Note belonging to the alternate key group (5K charts on 7K layouts).
    pub const ALT_KEY_GROUP: NoteFlags = NoteFlags(1 << 4);

    pub fn contains(self, other: NoteFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: NoteFlags) -> NoteFlags {
        NoteFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for NoteFlags {
    type Output = NoteFlags;

    fn bitor(self, rhs: NoteFlags) -> NoteFlags {
        self.with(rhs)
    }
}

/// Channel-dependent note payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    /// Key sample id to trigger on hit.
    Sample(u32),
    /// New tempo in beats per minute.
    Tempo(f64),
    /// Pause duration in milliseconds.
    PauseMs(f64),
    /// Mine damage as a fraction of the full gauge.
    MineDamage(f64),
}

/// An immutable fact from the chart: one note, positioned by measure and
/// fractional offset, stamped with its absolute time during timeline build.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartNote {
    /// Measure the note is placed in.
    pub measure: u32,
    /// Fractional offset within the measure, normalized to `[0, 1)`.
    pub pos: f64,
    /// Absolute timestamp in milliseconds from chart start.
    pub time_ms: f64,
    pub flags: NoteFlags,
    pub payload: Payload,
}

impl ChartNote {
    /// Create a regular note.
    pub fn normal(measure: u32, pos: f64, sample: u32) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::NONE,
            payload: Payload::Sample(sample),
        }
    }

    /// Create a hold note head.
    pub fn hold_head(measure: u32, pos: f64, sample: u32) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::NONE,
            payload: Payload::Sample(sample),
        }
    }

    /// Create a hold note tail.
    pub fn hold_tail(measure: u32, pos: f64, sample: u32) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::HOLD_TAIL,
            payload: Payload::Sample(sample),
        }
    }

    /// Create a mine note.
    pub fn mine(measure: u32, pos: f64, damage: f64) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::MINE,
            payload: Payload::MineDamage(damage),
        }
    }

    /// Create an invisible note.
    pub fn invisible(measure: u32, pos: f64, sample: u32) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::INVISIBLE,
            payload: Payload::Sample(sample),
        }
    }

    /// Create a background music note.
    pub fn bgm(measure: u32, pos: f64, sample: u32) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::NONE,
            payload: Payload::Sample(sample),
        }
    }

    /// Create a tempo change marker.
    pub fn tempo(measure: u32, pos: f64, bpm: f64) -> Self {
        Self {
            measure,
            pos,
            time_ms: 0.0,
            flags: NoteFlags::NONE,
            payload: Payload::Tempo(bpm),
        }
    }

    /// Returns true if this is a hold tail.
    pub fn is_hold_tail(&self) -> bool {
        self.flags.contains(NoteFlags::HOLD_TAIL)
    }

    /// Returns true if this is a mine.
    pub fn is_mine(&self) -> bool {
        self.flags.contains(NoteFlags::MINE)
    }

    /// Returns true if this note is invisible.
    pub fn is_invisible(&self) -> bool {
        self.flags.contains(NoteFlags::INVISIBLE)
    }

    /// Key sample id, if the payload carries one.
    pub fn sample(&self) -> Option<u32> {
        match self.payload {
            Payload::Sample(id) => Some(id),
            _ => None,
        }
    }
}
