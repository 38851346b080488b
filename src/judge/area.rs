use serde::{Deserialize, Serialize};

/// Presses landing within this distance of the note count as exact.
pub const EXACT_THRESHOLD_MS: f64 = 1.0;

/// Accuracy tier of a judgment, without timing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgeTier {
    Perfect,
    Great,
    Good,
    Bad,
    Miss,
    Mine,
}

impl JudgeTier {
    /// Returns true if this tier continues combo.
    pub fn continues_combo(self) -> bool {
        matches!(self, Self::Perfect | Self::Great | Self::Good)
    }

    /// EX score contribution of one judgment in this tier.
    pub fn ex_score(self) -> u32 {
        match self {
            Self::Perfect => 2,
            Self::Great => 1,
            Self::Good | Self::Bad | Self::Miss | Self::Mine => 0,
        }
    }
}

/// Timing direction of a judgment relative to the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Early,
    Exact,
    Late,
}

/// A complete judgment outcome. Exact-on-time exists only at the top tier
/// and outranks early/late of the same tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeArea {
    ExactPerfect,
    EarlyPerfect,
    LatePerfect,
    EarlyGreat,
    LateGreat,
    EarlyGood,
    LateGood,
    EarlyBad,
    LateBad,
    Miss,
    MineHit,
}

impl JudgeArea {
    pub const COUNT: usize = 11;

    /// Returns all areas in counter order.
    pub fn all() -> &'static [JudgeArea] {
        &[
            JudgeArea::ExactPerfect,
            JudgeArea::EarlyPerfect,
            JudgeArea::LatePerfect,
            JudgeArea::EarlyGreat,
            JudgeArea::LateGreat,
            JudgeArea::EarlyGood,
            JudgeArea::LateGood,
            JudgeArea::EarlyBad,
            JudgeArea::LateBad,
            JudgeArea::Miss,
            JudgeArea::MineHit,
        ]
    }

    /// Counter index for this area.
    pub fn index(self) -> usize {
        match self {
            JudgeArea::ExactPerfect => 0,
            JudgeArea::EarlyPerfect => 1,
            JudgeArea::LatePerfect => 2,
            JudgeArea::EarlyGreat => 3,
            JudgeArea::LateGreat => 4,
            JudgeArea::EarlyGood => 5,
            JudgeArea::LateGood => 6,
            JudgeArea::EarlyBad => 7,
            JudgeArea::LateBad => 8,
            JudgeArea::Miss => 9,
            JudgeArea::MineHit => 10,
        }
    }

    pub fn tier(self) -> JudgeTier {
        match self {
            JudgeArea::ExactPerfect | JudgeArea::EarlyPerfect | JudgeArea::LatePerfect => {
                JudgeTier::Perfect
            }
            JudgeArea::EarlyGreat | JudgeArea::LateGreat => JudgeTier::Great,
            JudgeArea::EarlyGood | JudgeArea::LateGood => JudgeTier::Good,
            JudgeArea::EarlyBad | JudgeArea::LateBad => JudgeTier::Bad,
            JudgeArea::Miss => JudgeTier::Miss,
            JudgeArea::MineHit => JudgeTier::Mine,
        }
    }

    pub fn timing(self) -> Timing {
        match self {
            JudgeArea::EarlyPerfect
            | JudgeArea::EarlyGreat
            | JudgeArea::EarlyGood
            | JudgeArea::EarlyBad => Timing::Early,
            JudgeArea::LatePerfect
            | JudgeArea::LateGreat
            | JudgeArea::LateGood
            | JudgeArea::LateBad => Timing::Late,
            JudgeArea::ExactPerfect | JudgeArea::Miss | JudgeArea::MineHit => Timing::Exact,
        }
    }

    /// Tag a tier with the press direction. `delta_ms` is press time minus
    /// note time (positive = late).
    pub fn classify(delta_ms: f64, tier: JudgeTier) -> JudgeArea {
        match tier {
            JudgeTier::Perfect => {
                if delta_ms.abs() <= EXACT_THRESHOLD_MS {
                    JudgeArea::ExactPerfect
                } else if delta_ms < 0.0 {
                    JudgeArea::EarlyPerfect
                } else {
                    JudgeArea::LatePerfect
                }
            }
            JudgeTier::Great => {
                if delta_ms < 0.0 {
                    JudgeArea::EarlyGreat
                } else {
                    JudgeArea::LateGreat
                }
            }
            JudgeTier::Good => {
                if delta_ms < 0.0 {
                    JudgeArea::EarlyGood
                } else {
                    JudgeArea::LateGood
                }
            }
            JudgeTier::Bad => {
                if delta_ms < 0.0 {
                    JudgeArea::EarlyBad
                } else {
                    JudgeArea::LateBad
                }
            }
            JudgeTier::Miss => JudgeArea::Miss,
            JudgeTier::Mine => JudgeArea::MineHit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, area) in JudgeArea::all().iter().enumerate() {
            assert_eq!(area.index(), i);
        }
        assert_eq!(JudgeArea::all().len(), JudgeArea::COUNT);
    }

    #[test]
    fn exact_beats_early_and_late_at_perfect() {
        assert_eq!(
            JudgeArea::classify(0.0, JudgeTier::Perfect),
            JudgeArea::ExactPerfect
        );
        assert_eq!(
            JudgeArea::classify(-0.5, JudgeTier::Perfect),
            JudgeArea::ExactPerfect
        );
        assert_eq!(
            JudgeArea::classify(-5.0, JudgeTier::Perfect),
            JudgeArea::EarlyPerfect
        );
        assert_eq!(
            JudgeArea::classify(5.0, JudgeTier::Perfect),
            JudgeArea::LatePerfect
        );
    }

    #[test]
    fn lower_tiers_only_split_by_direction() {
        assert_eq!(
            JudgeArea::classify(-0.5, JudgeTier::Great),
            JudgeArea::EarlyGreat
        );
        assert_eq!(
            JudgeArea::classify(30.0, JudgeTier::Good),
            JudgeArea::LateGood
        );
        assert_eq!(
            JudgeArea::classify(-200.0, JudgeTier::Bad),
            JudgeArea::EarlyBad
        );
    }

    #[test]
    fn combo_and_score_by_tier() {
        assert!(JudgeTier::Perfect.continues_combo());
        assert!(JudgeTier::Good.continues_combo());
        assert!(!JudgeTier::Bad.continues_combo());
        assert!(!JudgeTier::Mine.continues_combo());
        assert_eq!(JudgeTier::Perfect.ex_score(), 2);
        assert_eq!(JudgeTier::Great.ex_score(), 1);
        assert_eq!(JudgeTier::Good.ex_score(), 0);
    }
}
