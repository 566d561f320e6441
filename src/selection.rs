use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::model::{self, NormalizedPoint, Selection};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SelectionError {
    #[error("Selection has no area ({width} × {height})")]
    Degenerate { width: f32, height: f32 },

    #[error("{slot} is not a slot of the {workflow} workflow")]
    SlotNotInWorkflow { slot: Slot, workflow: Workflow },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Front,
    Back,
    Photo,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Back => 1,
            Self::Photo => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Back => "Back",
            Self::Photo => "Photo",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workflow {
    #[default]
    Card,
    Photo,
}

impl Workflow {
    pub const ALL: [Self; 2] = [Self::Card, Self::Photo];

    pub fn slots(self) -> &'static [Slot] {
        match self {
            Self::Card => &[Slot::Front, Slot::Back],
            Self::Photo => &[Slot::Photo],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::Photo => "Photo",
        }
    }
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    Dragging {
        start: NormalizedPoint,
    },
}

/// Press/move/release tracking for a rectangle drawn over the displayed image.
///
/// Every move recomputes the pending selection from the start point, so no state
/// accumulates between events. The release may happen anywhere; callers forward the
/// global pointer release, not only releases over the image.
#[derive(Clone, Debug, Default)]
pub struct DragSelection {
    state: DragState,
    pending: Option<Selection>,
}

impl DragSelection {
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Latest selection, committed or not.
    pub fn pending(&self) -> Option<Selection> {
        self.pending
    }

    /// Starts a drag. Without a loaded image this does nothing and returns `None`.
    pub fn press(
        &mut self,
        pointer: egui::Pos2,
        displayed: egui::Rect,
        image_loaded: bool,
    ) -> Option<Selection> {
        if !image_loaded {
            return None;
        }
        let start = model::normalize(pointer, displayed);
        self.state = DragState::Dragging { start };
        let marker = Selection::at(start);
        self.pending = Some(marker);
        log::debug!("drag started at ({:.3}, {:.3})", start.x, start.y);
        Some(marker)
    }

    /// Recomputes the pending selection while dragging; returns it for observers.
    pub fn drag_to(&mut self, pointer: egui::Pos2, displayed: egui::Rect) -> Option<Selection> {
        let DragState::Dragging { start } = self.state else {
            return None;
        };
        let current = model::normalize(pointer, displayed);
        let selection = Selection::from_corners(start, current);
        self.pending = Some(selection);
        Some(selection)
    }

    /// Ends the drag, leaving the last selection pending.
    pub fn release(&mut self) {
        if self.is_dragging() {
            self.state = DragState::Idle;
            if let Some(sel) = self.pending {
                log::debug!(
                    "drag released: {:.3}×{:.3} at ({:.3}, {:.3})",
                    sel.width,
                    sel.height,
                    sel.x,
                    sel.y
                );
            }
        }
    }

    /// Aborts the drag and drops the pending selection.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
        self.pending = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Committed selections of one source image, keyed by the workflow's slots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionStore {
    workflow: Workflow,
    slots: [Option<Selection>; 3],
}

impl SelectionStore {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            slots: [None; 3],
        }
    }

    /// Replaces the selection at `slot`. Degenerate selections leave the store untouched.
    pub fn commit(&mut self, slot: Slot, selection: Selection) -> Result<(), SelectionError> {
        if !self.workflow.slots().contains(&slot) {
            return Err(SelectionError::SlotNotInWorkflow {
                slot,
                workflow: self.workflow,
            });
        }
        if selection.is_degenerate() {
            return Err(SelectionError::Degenerate {
                width: selection.width,
                height: selection.height,
            });
        }
        self.slots[slot.index()] = Some(selection);
        Ok(())
    }

    pub fn get(&self, slot: Slot) -> Option<Selection> {
        self.slots[slot.index()]
    }

    pub fn clear_all(&mut self) {
        self.slots = [None; 3];
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Committed slots in workflow order.
    pub fn committed(&self) -> impl Iterator<Item = (Slot, Selection)> + '_ {
        self.workflow
            .slots()
            .iter()
            .filter_map(|&slot| self.get(slot).map(|sel| (slot, sel)))
    }
}
