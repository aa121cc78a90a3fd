/// Result projection
///
/// Maps a frame's match result back onto the detections it came from and
/// builds the view model handed to the overlay renderer.
use crate::cards::{self, assets::PLACEHOLDER_ASSET, CardAttributes};
use crate::detection::{BoundingBox, Detection};
use crate::matcher::MatchResult;

/// Number of result slots shown next to the camera preview
pub const SLOT_COUNT: usize = 3;

/// What the overlay should tell the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The detector found nothing in this frame
    NoCards,
    /// Cards are in view but none of their triples is a set
    NoMatch,
    /// A set was found
    Matched,
}

impl Diagnostic {
    pub fn description(&self) -> &'static str {
        match self {
            Diagnostic::NoCards => "No cards",
            Diagnostic::NoMatch => "No match",
            Diagnostic::Matched => "Set found",
        }
    }
}

/// One matched card, assigned to a display slot
#[derive(Debug, Clone, PartialEq)]
pub struct CardSlot {
    /// Position of the card in the detector output
    pub detection_index: usize,
    pub bbox: BoundingBox,
    pub label: String,
    /// Present when the label decoded
    pub attributes: Option<CardAttributes>,
    pub asset_key: &'static str,
}

/// View model consumed by the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    /// Generation of the frame this view was computed from (set by the throttler)
    pub generation: u64,
    pub status: Diagnostic,
    /// Exactly `SLOT_COUNT` entries when matched, empty otherwise
    pub slots: Vec<CardSlot>,
    /// Every detection box, for transient visualization
    pub detections: Vec<BoundingBox>,
    pub text: Option<String>,
    /// Detector latency for this frame
    pub inference_ms: f64,
}

impl ViewModel {
    pub fn is_match(&self) -> bool {
        self.status == Diagnostic::Matched
    }

    /// Boxes of the matched cards, in detection order
    pub fn matched_boxes(&self) -> Vec<BoundingBox> {
        self.slots.iter().map(|slot| slot.bbox).collect()
    }

    /// Asset key for each display slot, placeholders when nothing matched
    pub fn slot_assets(&self) -> [&'static str; SLOT_COUNT] {
        let mut assets = [PLACEHOLDER_ASSET; SLOT_COUNT];
        for (asset, slot) in assets.iter_mut().zip(&self.slots) {
            *asset = slot.asset_key;
        }
        assets
    }
}

/// Build the view model for a frame
///
/// `result` indices refer to positions in `detections`.
pub fn project(detections: &[Detection], result: &MatchResult) -> ViewModel {
    let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();

    if detections.is_empty() {
        return ViewModel {
            generation: 0,
            status: Diagnostic::NoCards,
            slots: Vec::new(),
            detections: boxes,
            text: None,
            inference_ms: 0.0,
        };
    }

    let indices = match result.indices() {
        Some(indices) if indices.iter().all(|&i| i < detections.len()) => indices,
        Some(indices) => {
            tracing::error!(
                "Match indices {:?} out of range for {} detections",
                indices,
                detections.len()
            );
            return no_match(boxes);
        }
        None => return no_match(boxes),
    };

    // Ascending indices keep the original detection order
    let mut ordered = indices;
    ordered.sort_unstable();

    let slots = ordered
        .iter()
        .map(|&index| {
            let detection = &detections[index];
            let attributes = cards::decode(&detection.label).ok();
            CardSlot {
                detection_index: index,
                bbox: detection.bbox,
                label: detection.label.clone(),
                attributes,
                asset_key: attributes
                    .as_ref()
                    .map(cards::asset_key)
                    .unwrap_or(PLACEHOLDER_ASSET),
            }
        })
        .collect();

    ViewModel {
        generation: 0,
        status: Diagnostic::Matched,
        slots,
        detections: boxes,
        text: None,
        inference_ms: 0.0,
    }
}

fn no_match(boxes: Vec<BoundingBox>) -> ViewModel {
    ViewModel {
        generation: 0,
        status: Diagnostic::NoMatch,
        slots: Vec::new(),
        detections: boxes,
        text: Some(Diagnostic::NoMatch.description().to_string()),
        inference_ms: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str, x: f32) -> Detection {
        Detection::new(label, BoundingBox::new(x, 0.0, x + 0.1, 0.2))
    }

    #[test]
    fn test_empty_detections_is_no_cards() {
        let view = project(&[], &MatchResult::NoMatch);
        assert_eq!(view.status, Diagnostic::NoCards);
        assert!(view.slots.is_empty());
        assert!(view.detections.is_empty());
        assert_eq!(view.slot_assets(), [PLACEHOLDER_ASSET; 3]);
    }

    #[test]
    fn test_no_match_is_distinct_from_no_cards() {
        let detections = vec![detection("clg1", 0.0), detection("rdv2", 0.2)];
        let view = project(&detections, &MatchResult::NoMatch);
        assert_eq!(view.status, Diagnostic::NoMatch);
        assert_ne!(view.status, Diagnostic::NoCards);
        assert_eq!(view.text.as_deref(), Some("No match"));
        assert_eq!(view.detections.len(), 2);
        assert!(view.slots.is_empty());
    }

    #[test]
    fn test_match_projects_three_boxes_in_detection_order() {
        let detections = vec![
            detection("clg1", 0.0),
            detection("xxxx", 0.1),
            detection("clg2", 0.2),
            detection("rdv1", 0.3),
            detection("clg3", 0.4),
        ];
        let view = project(&detections, &MatchResult::Match { indices: [0, 2, 4] });

        assert!(view.is_match());
        assert_eq!(view.slots.len(), SLOT_COUNT);
        assert_eq!(
            view.matched_boxes(),
            vec![detections[0].bbox, detections[2].bbox, detections[4].bbox]
        );
        assert_eq!(view.slot_assets(), ["card_clg1", "card_clg2", "card_clg3"]);
        assert_eq!(view.slots[1].detection_index, 2);
        assert_eq!(view.detections.len(), 5);
    }

    #[test]
    fn test_out_of_range_indices_are_not_projected() {
        let detections = vec![detection("clg1", 0.0)];
        let view = project(&detections, &MatchResult::Match { indices: [0, 1, 2] });
        assert_eq!(view.status, Diagnostic::NoMatch);
        assert!(view.slots.is_empty());
    }
}
