use serde::Serialize;

use super::area::{JudgeArea, JudgeTier, Timing};

/// Per-session judgment record: the snapshot collaborators read for HUD
/// display and score recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasicData {
    /// Elapsed play time in milliseconds.
    pub play_time_ms: f64,
    /// Current health, `[0, 1]`.
    pub health: f64,
    /// Accuracy over judged notes so far, `0.0 - 100.0`.
    pub acc: f64,
    /// Accuracy over the whole chart, `0.0 - 100.0`.
    pub total_acc: f64,
    pub combo: u32,
    pub max_combo: u32,
    /// Judgment counters indexed by `JudgeArea::index`.
    pub judge: [u32; JudgeArea::COUNT],
    pub fast: u32,
    pub slow: u32,
}

impl Default for BasicData {
    fn default() -> Self {
        Self {
            play_time_ms: 0.0,
            health: 0.0,
            acc: 0.0,
            total_acc: 0.0,
            combo: 0,
            max_combo: 0,
            judge: [0; JudgeArea::COUNT],
            fast: 0,
            slow: 0,
        }
    }
}

impl BasicData {
    pub fn area_count(&self, area: JudgeArea) -> u32 {
        self.judge[area.index()]
    }

    /// Total judgments in a tier across early/exact/late.
    pub fn tier_count(&self, tier: JudgeTier) -> u32 {
        JudgeArea::all()
            .iter()
            .filter(|a| a.tier() == tier)
            .map(|a| self.judge[a.index()])
            .sum()
    }

    /// EX score: top tier worth 2, second tier worth 1.
    pub fn ex_score(&self) -> u32 {
        self.tier_count(JudgeTier::Perfect) * 2 + self.tier_count(JudgeTier::Great)
    }

    /// Notes judged so far. Mine hits are not notes and do not count.
    pub fn judged_notes(&self) -> u32 {
        JudgeArea::all()
            .iter()
            .filter(|a| a.tier() != JudgeTier::Mine)
            .map(|a| self.judge[a.index()])
            .sum()
    }

    /// Bad + miss count.
    pub fn bp(&self) -> u32 {
        self.tier_count(JudgeTier::Bad) + self.tier_count(JudgeTier::Miss)
    }

    /// Fold one judgment into the record. Health is tracked by the gauge
    /// and written back by the engine.
    pub(crate) fn record(&mut self, area: JudgeArea, total_notes: u32) {
        self.judge[area.index()] += 1;

        let tier = area.tier();
        if tier.continues_combo() {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else {
            self.combo = 0;
        }

        if area != JudgeArea::ExactPerfect {
            match area.timing() {
                Timing::Early => self.fast += 1,
                Timing::Late => self.slow += 1,
                Timing::Exact => {}
            }
        }

        let judged = self.judged_notes();
        let ex = self.ex_score();
        self.acc = if judged > 0 {
            ex as f64 / (judged as f64 * 2.0) * 100.0
        } else {
            0.0
        };
        self.total_acc = if total_notes > 0 {
            ex as f64 / (total_notes as f64 * 2.0) * 100.0
        } else {
            0.0
        };
    }
}
