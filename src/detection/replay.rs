/// Replay detector
///
/// Serves detections recorded from a real detector run, keyed by frame
/// sequence number. Used by the demo binary and by pipeline tests.
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::detector::{Detection, Detector, Frame};
use crate::error::DetectorError;

/// Detections recorded for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub sequence: u64,
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// Set when the detector failed on this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordedFrame {
    pub fn new(sequence: u64, detections: Vec<Detection>) -> Self {
        Self {
            sequence,
            detections,
            error: None,
        }
    }

    /// A frame on which inference failed
    pub fn failed(sequence: u64, message: impl Into<String>) -> Self {
        Self {
            sequence,
            detections: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// A recording file: frames in capture order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    /// Load a recording from a JSON file
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        let content = fs::read_to_string(path).map_err(|e| DetectorError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            DetectorError::Invalid(msg) => DetectorError::LoadFailed {
                path: path.display().to_string(),
                source: msg.into(),
            },
            other => other,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DetectorError> {
        serde_json::from_str(json).map_err(|e| DetectorError::Invalid(e.to_string()))
    }

    /// Sequence numbers in recording order
    pub fn sequences(&self) -> Vec<u64> {
        self.frames.iter().map(|frame| frame.sequence).collect()
    }
}

/// Detector answering from a recording
pub struct ReplayDetector {
    frames: HashMap<u64, RecordedFrame>,
    latency: Duration,
}

impl ReplayDetector {
    pub fn new(recording: Recording) -> Self {
        let frames = recording
            .frames
            .into_iter()
            .map(|frame| (frame.sequence, frame))
            .collect();

        Self {
            frames,
            latency: Duration::ZERO,
        }
    }

    /// Simulate model inference time
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Detector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        // Frames missing from the recording had nothing in view
        let Some(recorded) = self.frames.get(&frame.sequence) else {
            return Ok(Vec::new());
        };
        match &recorded.error {
            Some(message) => Err(DetectorError::InferenceFailed(message.clone().into())),
            None => Ok(recorded.detections.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "ReplayDetector"
    }
}
