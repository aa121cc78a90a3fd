/// Detector trait and common types
///
/// The object detector itself is an external collaborator. It receives a
/// camera frame and returns labeled bounding boxes in output order.
use std::time::Instant;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// A frame handed over by the camera source
#[derive(Debug, Clone)]
pub struct Frame {
    /// Camera-side sequence number
    pub sequence: u64,
    pub image: RgbaImage,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(sequence: u64, image: RgbaImage) -> Self {
        Self {
            sequence,
            image,
            captured_at: Instant::now(),
        }
    }

    /// A 1x1 frame, for sources whose detector ignores pixels
    pub fn blank(sequence: u64) -> Self {
        Self::new(sequence, RgbaImage::new(1, 1))
    }
}

/// Spatial region of a detection, in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Detector confidence (0.0-1.0)
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One labeled box from the detector
///
/// Its only identity is its position in the detector's output for a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }
}

/// Detector trait
///
/// Implement this to plug an inference backend into the pipeline. Calls may
/// block for the duration of model inference.
pub trait Detector: Send {
    /// Detect cards in a frame, in detector output order
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError>;

    /// Get detector name (for logging)
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::blank(7);
        assert_eq!(frame.sequence, 7);
        assert_eq!(frame.image.dimensions(), (1, 1));
    }

    #[test]
    fn test_bounding_box_dimensions() {
        let bbox = BoundingBox::new(0.1, 0.2, 0.4, 0.8).with_confidence(0.9);
        assert!((bbox.width() - 0.3).abs() < f32::EPSILON);
        assert!((bbox.height() - 0.6).abs() < 1e-6);
        assert_eq!(bbox.confidence, 0.9);
    }

    #[test]
    fn test_detection_deserialize_default_confidence() {
        let json = r#"{"label":"clg1","bbox":{"x1":0.0,"y1":0.0,"x2":0.5,"y2":0.5}}"#;
        let detection: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(detection.label, "clg1");
        assert_eq!(detection.bbox.confidence, 1.0);
    }
}
