use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::judge::area::JudgeArea;
use crate::judge::gauge::GaugeType;
use crate::judge::window::JudgeDifficulty;

/// One replayable command: a raw input transition, or a pre-computed
/// judgment outcome for the non-interactive side of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReplayCommand {
    Press { key: usize },
    Release { key: usize },
    Judge { area: JudgeArea },
}

/// A command with its offset from session start in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedCommand {
    pub ms: i64,
    #[serde(flatten)]
    pub command: ReplayCommand,
}

/// Session metadata, stored separately from the command stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayHeader {
    #[serde(default)]
    pub player: String,
    /// Chart SHA-256 hash.
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub gauge: GaugeType,
    #[serde(default)]
    pub difficulty: JudgeDifficulty,
    /// Pitch shift in semitones; playback speed is derived from it.
    #[serde(default)]
    pub pitch_semitones: i32,
    /// Play date (unix timestamp).
    #[serde(default)]
    pub date: i64,
}

/// Serialized envelope: header fields inline, command stream compressed.
#[derive(Debug, Serialize, Deserialize)]
struct ReplayFile {
    #[serde(flatten)]
    header: ReplayHeader,
    /// Base64 + gzip command stream.
    #[serde(default)]
    commands: Option<String>,
}

/// An ordered, append-only command log. Immutable once loaded; a single
/// forward cursor walks it during playback.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayLog {
    header: ReplayHeader,
    commands: Vec<TimedCommand>,
}

impl ReplayLog {
    /// Wrap a recorded command sequence. Offsets must be non-decreasing;
    /// out-of-order input is stably sorted with a warning.
    pub fn new(header: ReplayHeader, mut commands: Vec<TimedCommand>) -> Self {
        let sorted = commands.windows(2).all(|w| w[0].ms <= w[1].ms);
        if !sorted {
            log::warn!("replay command offsets are not monotonic, sorting");
            commands.sort_by_key(|c| c.ms);
        }
        Self { header, commands }
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
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

    /// Serialize to JSON, compressing the command stream (gzip + base64).
    pub fn to_json(&self) -> Result<String, ReplayError> {
        let commands = if self.commands.is_empty() {
            None
        } else {
            let raw = serde_json::to_vec(&self.commands)?;
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw)?;
            let compressed = encoder.finish()?;
            Some(URL_SAFE.encode(compressed))
        };
        let file = ReplayFile {
            header: self.header.clone(),
            commands,
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Deserialize from JSON. A corrupt command stream degrades to an empty
    /// log (the header survives) so playback can complete in skip-to-end
    /// mode instead of aborting.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let file: ReplayFile = serde_json::from_str(json)?;
        let commands = match &file.commands {
            Some(encoded) if !encoded.is_empty() => match Self::decode_commands(encoded) {
                Ok(commands) => commands,
                Err(err) => {
                    log::warn!("replay command stream is unreadable ({err}), playing header only");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };
        Ok(Self::new(file.header, commands))
    }

    fn decode_commands(encoded: &str) -> Result<Vec<TimedCommand>, ReplayError> {
        let compressed = URL_SAFE.decode(encoded.as_bytes())?;
        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
