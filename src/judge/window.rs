use serde::{Deserialize, Serialize};

use super::area::JudgeTier;

/// Judge strictness declared by the chart, keying the timing-window table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeDifficulty {
    VeryHard,
    Hard,
    Normal,
    #[default]
    Easy,
    VeryEasy,
}

impl JudgeDifficulty {
    /// Convert from a BMS #RANK value.
    pub fn from_bms_rank(rank: u32) -> Self {
        match rank {
            0 => JudgeDifficulty::VeryHard,
            1 => JudgeDifficulty::Hard,
            2 => JudgeDifficulty::Normal,
            3 => JudgeDifficulty::Easy,
            _ => JudgeDifficulty::Easy,
        }
    }

    fn scale(self) -> f64 {
        match self {
            JudgeDifficulty::VeryHard => 0.25,
            JudgeDifficulty::Hard => 0.50,
            JudgeDifficulty::Normal => 0.75,
            JudgeDifficulty::Easy => 1.0,
            JudgeDifficulty::VeryEasy => 1.25,
        }
    }
}

/// Per-tier timing tolerances in milliseconds. The widest window doubles as
/// the timeline's expiry tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Windows {
    pub perfect: f64,
    pub great: f64,
    pub good: f64,
    pub bad: f64,
}

impl Windows {
    /// Select the tightest tier containing the offset, if any.
    pub fn judge(&self, diff_abs_ms: f64) -> Option<JudgeTier> {
        if diff_abs_ms <= self.perfect {
            Some(JudgeTier::Perfect)
        } else if diff_abs_ms <= self.great {
            Some(JudgeTier::Great)
        } else if diff_abs_ms <= self.good {
            Some(JudgeTier::Good)
        } else if diff_abs_ms <= self.bad {
            Some(JudgeTier::Bad)
        } else {
            None
        }
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            perfect: self.perfect * factor,
            great: self.great * factor,
            good: self.good * factor,
            bad: self.bad * factor,
        }
    }
}

/// The full window configuration for one session: press windows plus the
/// wider release windows used for hold tails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTable {
    pub press: Windows,
    pub release: Windows,
}

impl WindowTable {
    /// Reference windows at the Easy baseline.
    fn base() -> Self {
        Self {
            press: Windows {
                perfect: 20.0,
                great: 60.0,
                good: 150.0,
                bad: 280.0,
            },
            release: Windows {
                perfect: 120.0,
                great: 160.0,
                good: 200.0,
                bad: 280.0,
            },
        }
    }

    /// Build the window table for a declared difficulty. Declared once per
    /// session and applied uniformly.
    pub fn for_difficulty(difficulty: JudgeDifficulty) -> Self {
        let base = Self::base();
        let factor = difficulty.scale();
        Self {
            press: base.press.scaled(factor),
            release: base.release.scaled(factor),
        }
    }

    /// Widest press tolerance; inputs beyond it are not judged and notes
    /// past it expire.
    pub fn miss_window(&self) -> f64 {
        self.press.bad
    }
}

impl Default for WindowTable {
    fn default() -> Self {
        Self::for_difficulty(JudgeDifficulty::Easy)
    }
}
