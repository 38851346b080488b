use super::command::{ReplayCommand, ReplayHeader, ReplayLog, TimedCommand};
use crate::judge::area::JudgeArea;

/// Append-only capture of a live session's input transitions (and, for the
/// non-interactive side, its judgment outcomes) for later storage.
#[derive(Debug, Clone, Default)]
pub struct ReplayRecorder {
    commands: Vec<TimedCommand>,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_press(&mut self, key: usize, offset_ms: i64) {
        self.commands.push(TimedCommand {
            ms: offset_ms,
            command: ReplayCommand::Press { key },
        });
    }

    pub fn record_release(&mut self, key: usize, offset_ms: i64) {
        self.commands.push(TimedCommand {
            ms: offset_ms,
            command: ReplayCommand::Release { key },
        });
    }

    pub fn record_judge(&mut self, area: JudgeArea, offset_ms: i64) {
        self.commands.push(TimedCommand {
            ms: offset_ms,
            command: ReplayCommand::Judge { area },
        });
    }

    pub fn commands(&self) -> &[TimedCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finalize the capture into a storable log.
    pub fn into_log(self, header: ReplayHeader) -> ReplayLog {
        ReplayLog::new(header, self.commands)
    }
}
