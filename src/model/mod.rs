pub mod chart;
pub mod lane;
pub mod note;

pub use chart::{ChartFormat, ChartFormatKind, MeasureLength, PauseEvent, TempoEvent};
pub use lane::{LANE_ID_COUNT, LANE_ID_INVALID, LANE_INDEX_COUNT, Lane, LaneCategory, LaneIndex};
pub use note::{ChartNote, NoteFlags, Payload};
