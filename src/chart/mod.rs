pub mod mapper;
pub mod timeline;

pub use mapper::{MAX_MEASURES, MIN_MEASURE_LENGTH, PositionTimeMapper};
pub use timeline::{ChartTimeline, DEFAULT_MISS_WINDOW_MS, HitableNote, TempoStats};
