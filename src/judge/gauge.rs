use serde::{Deserialize, Serialize};

use super::area::JudgeTier;

/// Fallback gauge total when the chart declares none.
pub const DEFAULT_TOTAL: f64 = 300.0;

/// Health model governing pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeType {
    AssistEasy,
    Easy,
    #[default]
    Normal,
    Hard,
    ExHard,
    Hazard,
}

impl GaugeType {
    /// Returns all gauge types in order of difficulty.
    pub fn all() -> &'static [GaugeType] {
        &[
            GaugeType::AssistEasy,
            GaugeType::Easy,
            GaugeType::Normal,
            GaugeType::Hard,
            GaugeType::ExHard,
            GaugeType::Hazard,
        ]
    }

    /// Survival-class gauges fail the session the moment health hits the
    /// floor; groove-class gauges are only checked at chart end.
    pub fn is_survival(self) -> bool {
        matches!(self, GaugeType::Hard | GaugeType::ExHard | GaugeType::Hazard)
    }
}

/// How positive deltas are derived for a gauge type.
#[derive(Debug, Clone, Copy)]
enum RecoveryRule {
    /// Per-note recovery scales with the chart's TOTAL over its note count,
    /// so a full run of top judgments lands exactly on TOTAL percent gained.
    TotalScaled { perfect: f64, great: f64, good: f64 },
    /// Fixed recovery fractions regardless of chart size.
    Fixed { perfect: f64, great: f64, good: f64 },
}

/// Declared-once delta table for one gauge type. Health is `[0, 1]`.
#[derive(Debug, Clone, Copy)]
struct GaugeProperty {
    initial: f64,
    border: f64,
    min: f64,
    fail_at_floor: bool,
    recovery: RecoveryRule,
    bad: f64,
    miss: f64,
}

impl GaugeProperty {
    fn get(gauge_type: GaugeType) -> Self {
        match gauge_type {
            GaugeType::AssistEasy => Self {
                initial: 0.2,
                border: 0.6,
                min: 0.02,
                fail_at_floor: false,
                recovery: RecoveryRule::TotalScaled {
                    perfect: 1.0,
                    great: 1.0,
                    good: 0.5,
                },
                bad: -0.015,
                miss: -0.03,
            },
            GaugeType::Easy => Self {
                initial: 0.2,
                border: 0.8,
                min: 0.02,
                fail_at_floor: false,
                recovery: RecoveryRule::TotalScaled {
                    perfect: 1.0,
                    great: 1.0,
                    good: 0.5,
                },
                bad: -0.015,
                miss: -0.045,
            },
            GaugeType::Normal => Self {
                initial: 0.2,
                border: 0.8,
                min: 0.02,
                fail_at_floor: false,
                recovery: RecoveryRule::TotalScaled {
                    perfect: 1.0,
                    great: 1.0,
                    good: 0.5,
                },
                bad: -0.03,
                miss: -0.06,
            },
            GaugeType::Hard => Self {
                initial: 1.0,
                border: 0.0,
                min: 0.0,
                fail_at_floor: true,
                recovery: RecoveryRule::Fixed {
                    perfect: 0.0015,
                    great: 0.0012,
                    good: 0.0003,
                },
                bad: -0.05,
                miss: -0.10,
            },
            GaugeType::ExHard => Self {
                initial: 1.0,
                border: 0.0,
                min: 0.0,
                fail_at_floor: true,
                recovery: RecoveryRule::Fixed {
                    perfect: 0.0015,
                    great: 0.0006,
                    good: 0.0,
                },
                bad: -0.08,
                miss: -0.16,
            },
            GaugeType::Hazard => Self {
                initial: 1.0,
                border: 0.0,
                min: 0.0,
                fail_at_floor: true,
                recovery: RecoveryRule::Fixed {
                    perfect: 0.0,
                    great: 0.0,
                    good: 0.0,
                },
                bad: -1.0,
                miss: -1.0,
            },
        }
    }
}

/// Live health state for one session.
#[derive(Debug, Clone)]
pub struct Gauge {
    gauge_type: GaugeType,
    property: GaugeProperty,
    health: f64,
    failed: bool,
    /// Health gained per full-credit note under a TotalScaled rule.
    recover_unit: f64,
}

impl Gauge {
    pub fn new(gauge_type: GaugeType, total_value: f64, total_notes: u32) -> Self {
        let property = GaugeProperty::get(gauge_type);
        let recover_unit = if total_notes > 0 {
            total_value / total_notes as f64 / 100.0
        } else {
            0.0
        };
        Self {
            gauge_type,
            property,
            health: property.initial,
            failed: false,
            recover_unit,
        }
    }

    /// Apply one judgment. `mine_damage` is the gauge fraction a mine hit
    /// costs and is ignored for every other tier.
    pub fn apply(&mut self, tier: JudgeTier, mine_damage: f64) {
        if self.failed {
            return;
        }
        let mut delta = self.delta_for(tier, mine_damage);

        // Groove gauges soften damage as health falls below half.
        if delta < 0.0 && self.health < 0.5 && !self.gauge_type.is_survival() {
            delta *= (self.health / 0.5).max(0.1);
        }

        self.health = (self.health + delta).clamp(self.property.min, 1.0);

        if self.property.fail_at_floor && self.health <= self.property.min {
            self.failed = true;
        }
    }

    fn delta_for(&self, tier: JudgeTier, mine_damage: f64) -> f64 {
        match tier {
            JudgeTier::Perfect | JudgeTier::Great | JudgeTier::Good => match self.property.recovery
            {
                RecoveryRule::TotalScaled {
                    perfect,
                    great,
                    good,
                } => {
                    let weight = match tier {
                        JudgeTier::Perfect => perfect,
                        JudgeTier::Great => great,
                        _ => good,
                    };
                    weight * self.recover_unit
                }
                RecoveryRule::Fixed {
                    perfect,
                    great,
                    good,
                } => match tier {
                    JudgeTier::Perfect => perfect,
                    JudgeTier::Great => great,
                    _ => good,
                },
            },
            JudgeTier::Bad => self.property.bad,
            JudgeTier::Miss => self.property.miss,
            JudgeTier::Mine => -mine_damage.abs(),
        }
    }

    pub fn gauge_type(&self) -> GaugeType {
        self.gauge_type
    }

    /// Current health, `[0, 1]`.
    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn clear_border(&self) -> f64 {
        self.property.border
    }

    pub fn min_floor(&self) -> f64 {
        self.property.min
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Clear condition: survival-class gauges clear by surviving, groove
    /// gauges by ending at or above the border.
    pub fn is_cleared(&self) -> bool {
        if self.gauge_type.is_survival() {
            !self.failed
        } else {
            self.health >= self.property.border
        }
    }
}
