//! Chart timing and judgment core for BMS-style rhythm games.
//!
//! Converts symbolically-timed charts (measure + fractional beat, modulated
//! by tempo changes and pauses) into absolute millisecond timelines, judges
//! live or replayed input against them, and maintains score, combo, and a
//! pass/fail health gauge. Chart-text parsing, rendering, audio, and
//! persistence are collaborators, not residents.

pub mod chart;
pub mod error;
pub mod judge;
pub mod model;
pub mod replay;
pub mod session;

pub use error::{ChartError, ReplayError, SessionError};
pub use session::{PlaySession, SessionOptions};
