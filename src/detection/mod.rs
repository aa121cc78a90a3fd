/// Detection module
///
/// Boundary to the external object detector.
///
/// ## Architecture
///
/// ```text
/// Camera source
///   └── Frame
///       └── Detector (external inference, black box)
///           ├── <model backend>
///           └── ReplayDetector (recorded detections)
///               └── Vec<Detection> (label + bounding box, output order)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use set_solver::detection::{Detector, Frame, Recording, ReplayDetector};
///
/// let mut detector = ReplayDetector::new(Recording::load(path)?);
/// for detection in detector.detect(&Frame::blank(0))? {
///     println!("{} at {:?}", detection.label, detection.bbox);
/// }
/// ```

pub mod detector;
pub mod replay;

// Re-export commonly used types
pub use detector::{BoundingBox, Detection, Detector, Frame};
pub use replay::{RecordedFrame, Recording, ReplayDetector};
