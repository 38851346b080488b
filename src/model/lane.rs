/// Number of lane indices per category (two sides of scratch + 9 keys each).
pub const LANE_INDEX_COUNT: usize = 20;

/// Total number of linear lane ids across all categories.
pub const LANE_ID_COUNT: usize = LaneCategory::COUNT * LANE_INDEX_COUNT;

/// Sentinel id for any `(category, index)` pair outside the valid range.
pub const LANE_ID_INVALID: usize = LANE_ID_COUNT;

/// Which kind of channel a lane carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LaneCategory {
    /// Regular judgeable notes.
    Note,
    /// Mine notes (damage on press).
    Mine,
    /// Invisible notes (keysound only, never judged).
    Invisible,
    /// Hold notes (head + tail pairs).
    Long,
    /// Background music channels.
    Bgm,
    /// Format-specific channels (e.g. visual effects).
    Special,
    /// Tempo change channel.
    Bpm,
}

impl LaneCategory {
    pub const COUNT: usize = 7;

    /// Returns all categories in id order.
    pub fn all() -> &'static [LaneCategory] {
        &[
            LaneCategory::Note,
            LaneCategory::Mine,
            LaneCategory::Invisible,
            LaneCategory::Long,
            LaneCategory::Bgm,
            LaneCategory::Special,
            LaneCategory::Bpm,
        ]
    }

    /// Returns the category index (0-based).
    pub fn index(self) -> usize {
        match self {
            LaneCategory::Note => 0,
            LaneCategory::Mine => 1,
            LaneCategory::Invisible => 2,
            LaneCategory::Long => 3,
            LaneCategory::Bgm => 4,
            LaneCategory::Special => 5,
            LaneCategory::Bpm => 6,
        }
    }

    /// Create a category from a 0-based index.
    pub fn from_index(index: usize) -> Option<LaneCategory> {
        Self::all().get(index).copied()
    }

    /// Returns true if notes in this category interact with the judge engine.
    pub fn is_judgeable(self) -> bool {
        matches!(
            self,
            LaneCategory::Note | LaneCategory::Mine | LaneCategory::Invisible | LaneCategory::Long
        )
    }
}

/// A single input position: scratch or key, per player side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LaneIndex {
    // 1P side
    Scratch,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    // 2P side
    Scratch2,
    Key10,
    Key11,
    Key12,
    Key13,
    Key14,
    Key15,
    Key16,
    Key17,
    Key18,
}

impl LaneIndex {
    /// Returns all lane indices in order.
    pub fn all() -> &'static [LaneIndex] {
        &[
            LaneIndex::Scratch,
            LaneIndex::Key1,
            LaneIndex::Key2,
            LaneIndex::Key3,
            LaneIndex::Key4,
            LaneIndex::Key5,
            LaneIndex::Key6,
            LaneIndex::Key7,
            LaneIndex::Key8,
            LaneIndex::Key9,
            LaneIndex::Scratch2,
            LaneIndex::Key10,
            LaneIndex::Key11,
            LaneIndex::Key12,
            LaneIndex::Key13,
            LaneIndex::Key14,
            LaneIndex::Key15,
            LaneIndex::Key16,
            LaneIndex::Key17,
            LaneIndex::Key18,
        ]
    }

    /// Returns the lane index (0-based).
    pub fn index(self) -> usize {
        match self {
            LaneIndex::Scratch => 0,
            LaneIndex::Key1 => 1,
            LaneIndex::Key2 => 2,
            LaneIndex::Key3 => 3,
            LaneIndex::Key4 => 4,
            LaneIndex::Key5 => 5,
            LaneIndex::Key6 => 6,
            LaneIndex::Key7 => 7,
            LaneIndex::Key8 => 8,
            LaneIndex::Key9 => 9,
            LaneIndex::Scratch2 => 10,
            LaneIndex::Key10 => 11,
            LaneIndex::Key11 => 12,
            LaneIndex::Key12 => 13,
            LaneIndex::Key13 => 14,
            LaneIndex::Key14 => 15,
            LaneIndex::Key15 => 16,
            LaneIndex::Key16 => 17,
            LaneIndex::Key17 => 18,
            LaneIndex::Key18 => 19,
        }
    }

    /// Create a lane index from a 0-based value.
    pub fn from_index(index: usize) -> Option<LaneIndex> {
        Self::all().get(index).copied()
    }

    /// Returns true if this is a scratch position.
    pub fn is_scratch(self) -> bool {
        matches!(self, LaneIndex::Scratch | LaneIndex::Scratch2)
    }

    /// Returns true if this position is on the 1P side.
    pub fn is_1p(self) -> bool {
        self.index() < LANE_INDEX_COUNT / 2
    }
}

/// A lane identified by `(category, index)`, stored as a linear id.
///
/// The mapping is total: every valid pair maps to a unique id below
/// [`LANE_ID_COUNT`], and every out-of-range pair maps to [`Lane::INVALID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lane(usize);

impl Lane {
    pub const INVALID: Lane = Lane(LANE_ID_INVALID);

    pub fn new(category: LaneCategory, index: LaneIndex) -> Lane {
        Lane(category.index() * LANE_INDEX_COUNT + index.index())
    }

    /// Total mapping from raw `(category, index)` values.
    pub fn from_raw(category: usize, index: usize) -> Lane {
        if category >= LaneCategory::COUNT || index >= LANE_INDEX_COUNT {
            return Lane::INVALID;
        }
        Lane(category * LANE_INDEX_COUNT + index)
    }

    pub fn from_id(id: usize) -> Lane {
        if id >= LANE_ID_COUNT { Lane::INVALID } else { Lane(id) }
    }

    pub fn id(self) -> usize {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 < LANE_ID_COUNT
    }

    pub fn category(self) -> Option<LaneCategory> {
        if !self.is_valid() {
            return None;
        }
        LaneCategory::from_index(self.0 / LANE_INDEX_COUNT)
    }

    pub fn lane_index(self) -> Option<LaneIndex> {
        if !self.is_valid() {
            return None;
        }
        LaneIndex::from_index(self.0 % LANE_INDEX_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_mapping_is_total_and_collision_free() {
        let mut seen = vec![false; LANE_ID_COUNT];
        for cat in LaneCategory::all() {
            for idx in LaneIndex::all() {
                let lane = Lane::new(*cat, *idx);
                assert!(lane.is_valid());
                assert!(!seen[lane.id()], "duplicate id {}", lane.id());
                seen[lane.id()] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn lane_roundtrip() {
        let lane = Lane::new(LaneCategory::Long, LaneIndex::Key7);
        assert_eq!(lane.category(), Some(LaneCategory::Long));
        assert_eq!(lane.lane_index(), Some(LaneIndex::Key7));
        assert_eq!(Lane::from_id(lane.id()), lane);
    }

    #[test]
    fn invalid_pairs_map_to_sentinel() {
        assert_eq!(Lane::from_raw(LaneCategory::COUNT, 0), Lane::INVALID);
        assert_eq!(Lane::from_raw(0, LANE_INDEX_COUNT), Lane::INVALID);
        assert_eq!(Lane::from_id(LANE_ID_COUNT + 5), Lane::INVALID);
        assert_eq!(Lane::INVALID.category(), None);
        assert_eq!(Lane::INVALID.lane_index(), None);
    }

    #[test]
    fn scratch_detection() {
        assert!(LaneIndex::Scratch.is_scratch());
        assert!(LaneIndex::Scratch2.is_scratch());
        assert!(!LaneIndex::Key3.is_scratch());
        assert!(LaneIndex::Key9.is_1p());
        assert!(!LaneIndex::Key10.is_1p());
    }
}
