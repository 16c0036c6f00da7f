//! Drag Tracker
//!
//! Drag-and-drop position tracking without any UI toolkit attached.
//! Uses a movement threshold to distinguish a click from a drag, and keeps
//! the drop target the pointer last hovered.
//!
//! The tracker is an explicit value owned by the interaction layer; nothing
//! here is global.

use serde::{Deserialize, Serialize};

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Fraction of a row's height that counts as "drop before"
const BEFORE_FRACTION: f64 = 0.3;
/// Fraction of a row's height past which the drop lands "after"
const AFTER_FRACTION: f64 = 0.7;

/// Insertion slot: a container and an index inside it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropTarget<C> {
    pub container: C,
    pub index: usize,
}

/// What a completed drag asks the engine to do
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRequest<I, C> {
    pub dragged: I,
    pub target: DropTarget<C>,
}

/// Where the pointer sits relative to the hovered row
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropIndicator {
    #[default]
    None,
    Before,
    After,
}

impl DropIndicator {
    /// Classify a vertical offset inside a row of `row_height`
    pub fn from_offset(offset_y: f64, row_height: f64) -> Self {
        if row_height <= 0.0 {
            return DropIndicator::None;
        }
        if offset_y < row_height * BEFORE_FRACTION {
            DropIndicator::Before
        } else if offset_y > row_height * AFTER_FRACTION {
            DropIndicator::After
        } else {
            DropIndicator::None
        }
    }

    /// Insertion index implied by hovering row `row_index`
    pub fn insertion_index(&self, row_index: usize) -> Option<usize> {
        match self {
            DropIndicator::Before => Some(row_index),
            DropIndicator::After => Some(row_index + 1),
            DropIndicator::None => None,
        }
    }
}

/// Drag lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DragPhase<I> {
    #[default]
    Idle,
    /// Pressed but not yet moved past the threshold
    Pending { id: I, origin: (f64, f64) },
    Dragging { id: I },
}

/// DnD state for one interaction surface
#[derive(Clone, Debug)]
pub struct DragTracker<I, C> {
    phase: DragPhase<I>,
    drop_target: Option<DropTarget<C>>,
    indicator: DropIndicator,
}

impl<I, C> Default for DragTracker<I, C>
where
    I: Copy + PartialEq + std::fmt::Debug,
    C: Copy + PartialEq + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, C> DragTracker<I, C>
where
    I: Copy + PartialEq + std::fmt::Debug,
    C: Copy + PartialEq + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
            drop_target: None,
            indicator: DropIndicator::None,
        }
    }

    pub fn phase(&self) -> DragPhase<I> {
        self.phase
    }

    /// Entity being dragged, once past the threshold
    pub fn dragged(&self) -> Option<I> {
        match self.phase {
            DragPhase::Dragging { id } => Some(id),
            _ => None,
        }
    }

    pub fn drop_target(&self) -> Option<DropTarget<C>> {
        self.drop_target
    }

    pub fn indicator(&self) -> DropIndicator {
        self.indicator
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Record a pending drag with its start position
    pub fn press(&mut self, id: I, x: f64, y: f64) {
        self.phase = DragPhase::Pending { id, origin: (x, y) };
        self.drop_target = None;
        self.indicator = DropIndicator::None;
    }

    /// Starts the drag once the pointer moved far enough from the press.
    /// Returns true when this call started the drag.
    pub fn pointer_moved(&mut self, x: f64, y: f64) -> bool {
        if let DragPhase::Pending { id, origin } = self.phase {
            let dx = (x - origin.0).abs();
            let dy = (y - origin.1).abs();
            if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
                log::trace!("drag started for {:?}", id);
                self.phase = DragPhase::Dragging { id };
                return true;
            }
        }
        false
    }

    /// Start dragging immediately (platform drag sources skip the threshold)
    pub fn begin_drag(&mut self, id: I) {
        self.phase = DragPhase::Dragging { id };
        self.drop_target = None;
        self.indicator = DropIndicator::None;
    }

    /// Pointer is over an insertion slot; the last call before release wins
    pub fn update_drop_target(&mut self, container: C, index: usize) {
        if self.is_dragging() {
            self.drop_target = Some(DropTarget { container, index });
        }
    }

    /// Pointer is over row `row_index` of `container` at `offset_y`
    pub fn hover_row(&mut self, container: C, row_index: usize, offset_y: f64, row_height: f64) {
        if !self.is_dragging() {
            return;
        }
        self.indicator = DropIndicator::from_offset(offset_y, row_height);
        // the middle band of a row is not a drop slot
        self.drop_target = self
            .indicator
            .insertion_index(row_index)
            .map(|index| DropTarget { container, index });
    }

    /// Pointer left every drop zone
    pub fn clear_drop_target(&mut self) {
        if self.is_dragging() {
            self.drop_target = None;
            self.indicator = DropIndicator::None;
        }
    }

    /// Whether the insertion line at `(container, index)` should be lit
    pub fn is_gap_active(&self, container: C, index: usize) -> bool {
        self.is_dragging() && self.drop_target == Some(DropTarget { container, index })
    }

    /// Whether the current target is one of the two gaps around the dragged
    /// entity's own row
    pub fn is_self_drop(&self, current_container: C, current_index: usize) -> bool {
        match self.drop_target {
            Some(target) if self.is_dragging() => {
                target.container == current_container
                    && (target.index == current_index || target.index == current_index + 1)
            }
            _ => false,
        }
    }

    /// Cancel or finish: back to idle
    pub fn end_drag(&mut self) {
        self.phase = DragPhase::Idle;
        self.drop_target = None;
        self.indicator = DropIndicator::None;
    }

    /// Pointer released. Returns the drop request when a drag was active and
    /// a target was hovered; the tracker is idle afterwards either way.
    pub fn release(&mut self) -> Option<DropRequest<I, C>> {
        let request = match (self.dragged(), self.drop_target) {
            (Some(dragged), Some(target)) => Some(DropRequest { dragged, target }),
            _ => None,
        };
        self.end_drag();
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Tracker = DragTracker<u32, Option<u32>>;

    #[test]
    fn test_click_does_not_start_drag() {
        let mut dnd = Tracker::new();
        dnd.press(1, 100.0, 100.0);
        assert!(!dnd.pointer_moved(103.0, 98.0));
        assert!(!dnd.is_dragging());
        assert_eq!(dnd.release(), None);
        assert_eq!(dnd.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_threshold_starts_drag() {
        let mut dnd = Tracker::new();
        dnd.press(1, 100.0, 100.0);
        assert!(dnd.pointer_moved(100.0, 110.0));
        assert_eq!(dnd.dragged(), Some(1));
        assert!(!dnd.pointer_moved(100.0, 130.0));
    }

    #[test]
    fn test_last_target_wins() {
        let mut dnd = Tracker::new();
        dnd.begin_drag(7);
        dnd.update_drop_target(None, 0);
        dnd.update_drop_target(Some(2), 3);

        let request = dnd.release().expect("should drop");
        assert_eq!(request.dragged, 7);
        assert_eq!(request.target, DropTarget { container: Some(2), index: 3 });
        assert!(dnd.drop_target().is_none());
        assert!(!dnd.is_dragging());
    }

    #[test]
    fn test_release_outside_targets_is_cancelled() {
        let mut dnd = Tracker::new();
        dnd.begin_drag(7);
        dnd.update_drop_target(None, 0);
        dnd.clear_drop_target();
        assert_eq!(dnd.release(), None);
        assert_eq!(dnd.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_targets_ignored_when_idle() {
        let mut dnd = Tracker::new();
        dnd.update_drop_target(None, 2);
        assert!(dnd.drop_target().is_none());
        assert!(!dnd.is_gap_active(None, 2));
    }

    #[test]
    fn test_indicator_from_offset() {
        assert_eq!(DropIndicator::from_offset(10.0, 60.0), DropIndicator::Before);
        assert_eq!(DropIndicator::from_offset(30.0, 60.0), DropIndicator::None);
        assert_eq!(DropIndicator::from_offset(50.0, 60.0), DropIndicator::After);
        assert_eq!(DropIndicator::from_offset(5.0, 0.0), DropIndicator::None);
    }

    #[test]
    fn test_hover_row_sets_insertion_slot() {
        let mut dnd = Tracker::new();
        dnd.begin_drag(1);
        dnd.hover_row(Some(4), 2, 55.0, 60.0);
        assert_eq!(dnd.indicator(), DropIndicator::After);
        assert!(dnd.is_gap_active(Some(4), 3));

        // the middle band of a row clears the slot
        dnd.hover_row(Some(4), 2, 30.0, 60.0);
        assert_eq!(dnd.indicator(), DropIndicator::None);
        assert!(dnd.drop_target().is_none());
        assert_eq!(dnd.release(), None);
    }

    #[test]
    fn test_self_drop() {
        let mut dnd = Tracker::new();
        dnd.begin_drag(1);
        dnd.update_drop_target(None, 0);
        assert!(dnd.is_self_drop(None, 0));
        assert!(!dnd.is_self_drop(Some(1), 0));

        // gap 2 is just below row 1 and just above row 2
        dnd.update_drop_target(None, 2);
        assert!(dnd.is_self_drop(None, 1));
        assert!(dnd.is_self_drop(None, 2));
        assert!(!dnd.is_self_drop(None, 0));
        assert!(!dnd.is_self_drop(None, 3));
    }

    #[test]
    fn test_end_drag_clears_everything() {
        let mut dnd = Tracker::new();
        dnd.begin_drag(1);
        dnd.hover_row(None, 0, 1.0, 60.0);
        dnd.end_drag();
        assert_eq!(dnd.phase(), DragPhase::Idle);
        assert!(dnd.drop_target().is_none());
        assert_eq!(dnd.indicator(), DropIndicator::None);
    }
}
