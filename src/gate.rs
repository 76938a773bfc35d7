// src/gate.rs - Emits a gesture only when it differs from the last one
use crate::gesture::GestureLabel;

/// Remembers the last emitted label so a held pose does not restart the
/// scene animation every frame.
#[derive(Debug, Clone, Default)]
pub struct GestureGate {
    last: Option<GestureLabel>,
}

impl GestureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(label)` when the label changed. The first label after
    /// construction always counts as a change.
    pub fn on_new_gesture(&mut self, label: GestureLabel) -> Option<GestureLabel> {
        if self.last == Some(label) {
            return None;
        }

        tracing::debug!(from = ?self.last, to = %label, "gesture changed");
        self.last = Some(label);
        Some(label)
    }

    pub fn current(&self) -> Option<GestureLabel> {
        self.last
    }
}
