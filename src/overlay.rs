/// Overlay renderer boundary
///
/// The on-screen renderer is external; it receives view models on the
/// rendering context through `RenderQueue::pump`.
use crate::projector::{Diagnostic, ViewModel};

/// Consumer of view models
///
/// Only ever called from the rendering context.
pub trait Overlay {
    fn apply(&mut self, view: &ViewModel);
}

/// Overlay that logs each view, for headless runs
#[derive(Debug, Default)]
pub struct ConsoleOverlay {
    applied: usize,
    last_status: Option<Diagnostic>,
}

impl ConsoleOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of views applied so far
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn last_status(&self) -> Option<Diagnostic> {
        self.last_status
    }
}

impl Overlay for ConsoleOverlay {
    fn apply(&mut self, view: &ViewModel) {
        self.applied += 1;
        self.last_status = Some(view.status);

        match view.status {
            Diagnostic::Matched => {
                let labels: Vec<&str> = view.slots.iter().map(|slot| slot.label.as_str()).collect();
                tracing::info!(
                    "[gen {}] SET: {} ({} cards in view, {:.1}ms inference)",
                    view.generation,
                    labels.join(" "),
                    view.detections.len(),
                    view.inference_ms
                );
            }
            status => {
                tracing::info!(
                    "[gen {}] {} ({} cards in view) slots: {:?}",
                    view.generation,
                    status.description(),
                    view.detections.len(),
                    view.slot_assets()
                );
            }
        }
    }
}
