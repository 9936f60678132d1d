//! Detected-event export for host tooling
//!
//! Hosts that surface detections externally get two shapes: a JSON payload
//! with buffer metadata, and a flat CSV. Both carry the event index, frame
//! position, wall-clock position and pre-repair strength.

use serde::{Deserialize, Serialize};

use crate::buffer::AudioBuffer;
use crate::declick::DetectedEvent;
use crate::error::{RestoreError, RestoreResult};

/// CSV header row.
pub const CSV_HEADER: &str = "Index,Timecode,Seconds,Frame,Type,Strength,SampleRate,Channels";

/// Buffer metadata attached to an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Sample rate of the analyzed buffer
    pub sample_rate: u32,
    /// Channel count of the analyzed buffer
    pub channels: usize,
    /// Frame count of the analyzed buffer
    pub frame_count: usize,
}

/// One exported event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedEvent {
    /// Position in the export list
    pub index: usize,
    /// Frame position in the buffer
    pub frame: usize,
    /// Frame position in seconds
    pub time_seconds: f64,
    /// Severity tier
    pub kind: crate::EventKind,
    /// Pre-repair magnitude
    pub strength: f32,
}

/// Full export payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventExport {
    /// Source buffer description
    pub metadata: ExportMetadata,
    /// Events in detection order
    pub events: Vec<ExportedEvent>,
}

impl EventExport {
    /// Build an export payload from a buffer and its detections.
    pub fn new(buffer: &AudioBuffer, events: &[DetectedEvent]) -> Self {
        let sample_rate = buffer.sample_rate();

        Self {
            metadata: ExportMetadata {
                sample_rate,
                channels: buffer.channels(),
                frame_count: buffer.frame_count(),
            },
            events: events
                .iter()
                .enumerate()
                .map(|(index, event)| ExportedEvent {
                    index,
                    frame: event.frame,
                    time_seconds: event.frame as f64 / sample_rate as f64,
                    kind: event.kind,
                    strength: event.strength,
                })
                .collect(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> RestoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RestoreError::Serialization(e.to_string()))
    }

    /// Serialize to CSV with the standard header.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');

        for event in &self.events {
            out.push_str(&format!(
                "{},{},{:.6},{},{},{:.6},{},{}\n",
                event.index,
                format_timecode(event.time_seconds),
                event.time_seconds,
                event.frame,
                event.kind.name(),
                event.strength,
                self.metadata.sample_rate,
                self.metadata.channels
            ));
        }

        out
    }
}

/// `HH:MM:SS.mmm` timecode for a position in seconds.
fn format_timecode(seconds: f64) -> String {
    let total_ms = (seconds * 1_000.0).round() as u64;
    let ms = total_ms % 1_000;
    let total_secs = total_ms / 1_000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3_600;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
}
