//! Real-time SET solver core.
//!
//! Frames from a camera source go through an external card detector; the
//! detected labels are decoded into card attributes, searched for a set and
//! projected onto a view model for an overlay renderer.
//!
//! ```text
//! Frame ─> Detector ─> decode ─> find_match ─> project ─> ViewModel
//!          └──────────── FrameThrottler (one cycle in flight) ──────┘
//! ```

pub mod cards;
pub mod config;
pub mod detection;
pub mod error;
pub mod matcher;
pub mod overlay;
pub mod pipeline;
pub mod projector;
pub mod stats;
pub mod throttle;

// Re-export commonly used types
pub use cards::{decode, CardAttributes};
pub use config::Config;
pub use detection::{BoundingBox, Detection, Detector, Frame};
pub use error::{DecodeError, MatcherInputError};
pub use matcher::{find_match, MatchResult};
pub use overlay::Overlay;
pub use pipeline::FramePipeline;
pub use projector::{project, Diagnostic, ViewModel};
pub use throttle::{FrameThrottler, RenderQueue, ThrottleConfig};
