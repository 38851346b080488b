pub mod command;
pub mod driver;
pub mod recorder;

pub use command::{ReplayCommand, ReplayHeader, ReplayLog, TimedCommand};
pub use driver::ReplayDriver;
pub use recorder::ReplayRecorder;
