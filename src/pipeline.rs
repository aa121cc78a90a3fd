/// Frame pipeline
///
/// Runs one full cycle for a frame: detect, decode, match, project.

use crate::cards::{self, CardAttributes};
use crate::config::Config;
use crate::detection::{Detection, Detector, Frame};
use crate::matcher::{self, MatchResult};
use crate::projector::{self, ViewModel};
use crate::stats::{CycleTiming, Timer};

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Detections below this confidence are dropped before decoding
    pub confidence_threshold: f32,
    /// Maximum number of decoded cards handed to the matcher
    pub max_cards: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            max_cards: config.max_cards,
        }
    }
}

/// Cards decoded from one frame's detections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    /// Decoded cards, in detection order
    pub cards: Vec<CardAttributes>,
    /// `origin[i]` is the detection index of `cards[i]`
    pub origin: Vec<usize>,
    /// Labels that did not decode
    pub rejected: Vec<String>,
}

/// Decode every detection, skipping unrecognized labels
pub fn decode_detections(detections: &[Detection]) -> DecodedFrame {
    let mut decoded = DecodedFrame {
        cards: Vec::with_capacity(detections.len()),
        origin: Vec::with_capacity(detections.len()),
        rejected: Vec::new(),
    };

    for (index, detection) in detections.iter().enumerate() {
        match cards::decode(&detection.label) {
            Ok(card) => {
                decoded.cards.push(card);
                decoded.origin.push(index);
            }
            Err(err) => {
                tracing::warn!("Skipping detection #{}: {}", index, err);
                decoded.rejected.push(detection.label.clone());
            }
        }
    }

    decoded
}

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub view: ViewModel,
    pub timing: CycleTiming,
    /// Number of labels that failed to decode
    pub rejected: usize,
    /// The detector call failed; the frame was treated as empty
    pub detector_failed: bool,
}

/// Detection-to-decision pipeline for a single frame at a time
pub struct FramePipeline {
    detector: Box<dyn Detector>,
    config: PipelineConfig,
}

impl FramePipeline {
    /// Create a new pipeline with default configuration
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Self::with_config(detector, PipelineConfig::default())
    }

    pub fn with_config(detector: Box<dyn Detector>, config: PipelineConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Get detector name
    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Run the full cycle for a frame
    pub fn run(&mut self, frame: &Frame) -> CycleOutput {
        let total_timer = Timer::start();
        let mut timing = CycleTiming::new();

        // 1. Detect
        let detect_timer = Timer::start();
        let (mut detections, detector_failed) = match self.detector.detect(frame) {
            Ok(detections) => (detections, false),
            Err(err) => {
                tracing::warn!(
                    "{} failed on frame {}: {}",
                    self.detector.name(),
                    frame.sequence,
                    err
                );
                (Vec::new(), true)
            }
        };
        timing.detect_us = detect_timer.elapsed_us();

        let threshold = self.config.confidence_threshold;
        detections.retain(|d| d.bbox.confidence >= threshold);

        // 2. Decode
        let decode_timer = Timer::start();
        let mut decoded = decode_detections(&detections);
        if decoded.cards.len() > self.config.max_cards {
            tracing::warn!(
                "Frame {}: {} cards in view, searching the first {}",
                frame.sequence,
                decoded.cards.len(),
                self.config.max_cards
            );
            decoded.cards.truncate(self.config.max_cards);
            decoded.origin.truncate(self.config.max_cards);
        }
        timing.decode_us = decode_timer.elapsed_us();

        // 3. Match
        let match_timer = Timer::start();
        let result: MatchResult = matcher::find_match(&decoded.cards).remap(&decoded.origin);
        timing.match_us = match_timer.elapsed_us();

        // 4. Project
        let project_timer = Timer::start();
        tracing::trace!(
            "Frame {}: selection {:?}",
            frame.sequence,
            result.membership(detections.len())
        );
        let mut view = projector::project(&detections, &result);
        view.inference_ms = timing.detect_us / 1000.0;
        timing.project_us = project_timer.elapsed_us();

        timing.total_us = total_timer.elapsed_us();

        tracing::debug!(
            "Frame {}: {} detections, {} decoded, {} rejected -> {}",
            frame.sequence,
            detections.len(),
            decoded.cards.len(),
            decoded.rejected.len(),
            view.status.description()
        );

        CycleOutput {
            view,
            timing,
            rejected: decoded.rejected.len(),
            detector_failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, RecordedFrame, Recording, ReplayDetector};
    use crate::error::DetectorError;
    use crate::projector::Diagnostic;

    fn detection(label: &str, x: f32) -> Detection {
        Detection::new(label, BoundingBox::new(x, 0.0, x + 0.1, 0.2))
    }

    fn pipeline(frames: Vec<(u64, Vec<Detection>)>) -> FramePipeline {
        let recording = Recording {
            frames: frames
                .into_iter()
                .map(|(sequence, detections)| RecordedFrame::new(sequence, detections))
                .collect(),
        };
        FramePipeline::new(Box::new(ReplayDetector::new(recording)))
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
            Err(DetectorError::Invalid("camera unplugged".to_string()))
        }

        fn name(&self) -> &'static str {
            "FailingDetector"
        }
    }

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.max_cards, 21);
    }

    #[test]
    fn test_decode_detections_skips_bad_labels() {
        let detections = vec![
            detection("clg1", 0.0),
            detection("??", 0.1),
            detection(" RDV3 ", 0.2),
        ];
        let decoded = decode_detections(&detections);
        assert_eq!(decoded.cards.len(), 2);
        assert_eq!(decoded.origin, vec![0, 2]);
        assert_eq!(decoded.rejected, vec!["??".to_string()]);
    }

    #[test]
    fn test_empty_frame_is_no_cards() {
        let mut pipeline = pipeline(vec![(0, Vec::new())]);
        let output = pipeline.run(&Frame::blank(0));
        assert_eq!(output.view.status, Diagnostic::NoCards);
        assert!(output.view.slots.is_empty());
        assert!(!output.detector_failed);
    }

    #[test]
    fn test_match_maps_back_to_detection_indices() {
        let mut pipeline = pipeline(vec![(
            3,
            vec![
                detection("nope", 0.0),
                detection("clg1", 0.1),
                detection("clg2", 0.2),
                detection("junk", 0.3),
                detection("clg3", 0.4),
            ],
        )]);

        let output = pipeline.run(&Frame::blank(3));
        assert_eq!(output.view.status, Diagnostic::Matched);
        assert_eq!(output.rejected, 2);
        let indices: Vec<usize> = output.view.slots.iter().map(|s| s.detection_index).collect();
        assert_eq!(indices, vec![1, 2, 4]);
        assert_eq!(output.view.slot_assets(), ["card_clg1", "card_clg2", "card_clg3"]);
    }

    #[test]
    fn test_five_cards_without_set_is_no_match() {
        let labels = ["clg1", "clg2", "clr1", "cdg1", "rlg1"];
        let detections = labels
            .iter()
            .enumerate()
            .map(|(i, label)| detection(label, i as f32 * 0.1))
            .collect();
        let mut pipeline = pipeline(vec![(1, detections)]);

        let output = pipeline.run(&Frame::blank(1));
        assert_eq!(output.view.status, Diagnostic::NoMatch);
        assert_eq!(output.view.detections.len(), 5);
    }

    #[test]
    fn test_all_labels_rejected_is_no_match() {
        let mut pipeline = pipeline(vec![(1, vec![detection("a", 0.0), detection("b", 0.1)])]);
        let output = pipeline.run(&Frame::blank(1));
        assert_eq!(output.view.status, Diagnostic::NoMatch);
        assert_eq!(output.rejected, 2);
    }

    #[test]
    fn test_low_confidence_detections_are_dropped() {
        let weak = |label: &str, x: f32| {
            Detection::new(label, BoundingBox::new(x, 0.0, x + 0.1, 0.2).with_confidence(0.2))
        };
        let mut pipeline = pipeline(vec![(
            1,
            vec![weak("clg1", 0.0), weak("clg2", 0.1), weak("clg3", 0.2)],
        )]);

        let output = pipeline.run(&Frame::blank(1));
        assert_eq!(output.view.status, Diagnostic::NoCards);
    }

    #[test]
    fn test_recorded_inference_failure_is_no_cards() {
        let recording = Recording {
            frames: vec![RecordedFrame::failed(4, "model timed out")],
        };
        let mut pipeline = FramePipeline::new(Box::new(ReplayDetector::new(recording)));

        let output = pipeline.run(&Frame::blank(4));
        assert!(output.detector_failed);
        assert_eq!(output.view.status, Diagnostic::NoCards);
    }

    #[test]
    fn test_detector_failure_is_absorbed() {
        let mut pipeline = FramePipeline::new(Box::new(FailingDetector));
        let output = pipeline.run(&Frame::blank(0));
        assert!(output.detector_failed);
        assert_eq!(output.view.status, Diagnostic::NoCards);
        assert_eq!(pipeline.detector_name(), "FailingDetector");
    }

    #[test]
    fn test_max_cards_limits_search() {
        // The only set sits beyond the card limit
        let detections = vec![
            detection("clg1", 0.0),
            detection("clg2", 0.1),
            detection("rdv1", 0.2),
            detection("clg3", 0.3),
        ];
        let recording = Recording {
            frames: vec![RecordedFrame::new(0, detections)],
        };
        let config = PipelineConfig {
            confidence_threshold: 0.0,
            max_cards: 3,
        };
        let mut pipeline = FramePipeline::with_config(Box::new(ReplayDetector::new(recording)), config);

        let output = pipeline.run(&Frame::blank(0));
        assert_eq!(output.view.status, Diagnostic::NoMatch);
    }
}
