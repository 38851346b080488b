pub mod area;
pub mod engine;
pub mod gauge;
pub mod score;
pub mod window;

pub use area::{JudgeArea, JudgeTier, Timing};
pub use engine::{JudgeEngine, SessionState};
pub use gauge::{DEFAULT_TOTAL, Gauge, GaugeType};
pub use score::BasicData;
pub use window::{JudgeDifficulty, WindowTable, Windows};
