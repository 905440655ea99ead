//! Annotation tool interaction state machine
//!
//! Translates low-level pointer events into annotation-store mutations.
//! At most one gesture is in flight at a time; committing or discarding a
//! gesture always passes through `Idle` before another tool can arm.

use log::debug;

use crate::annotations::{AnnotationId, AnnotationStore, NoteStyle};
use crate::geometry::Rect;

/// Default sticky note size in viewport pixels
pub const STICKY_NOTE_SIZE: (f32, f32) = (180.0, 100.0);
/// Default inline text box size in viewport pixels
pub const TEXT_BOX_SIZE: (f32, f32) = (150.0, 28.0);
/// Minimum committed highlight size, per axis
pub const MIN_DRAG_SIZE: f32 = 10.0;
/// Default highlight fill
pub const HIGHLIGHT_COLOR: &str = "#FFEB3B";

/// Annotation tools a user can arm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Highlight,
    StickyNote,
    TextBox,
}

/// Controller state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureState {
    Idle,
    ToolArmed(Tool),
    Dragging {
        page: usize,
        origin: (f32, f32),
        current: (f32, f32),
    },
}

/// What a pointer event did, for the embedding application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    /// An annotation was committed to the store
    AnnotationCreated(AnnotationId),
    /// A highlight was clicked; delete it only after user confirmation
    ConfirmDelete(AnnotationId),
    /// An annotation was removed from the store
    AnnotationDeleted(AnnotationId),
}

#[derive(Debug, Default)]
pub struct InteractionController {
    state: GestureState,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState::Idle
    }
}

impl InteractionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[must_use]
    pub fn armed_tool(&self) -> Option<Tool> {
        match self.state {
            GestureState::ToolArmed(tool) => Some(tool),
            _ => None,
        }
    }

    /// Arm a tool; re-selecting the armed tool toggles back to idle.
    /// An in-flight drag is discarded first, so the machine passes
    /// through `Idle` before the new tool arms.
    pub fn toggle_tool(&mut self, tool: Tool) {
        self.state = match self.state {
            GestureState::ToolArmed(current) if current == tool => GestureState::Idle,
            _ => GestureState::ToolArmed(tool),
        };
        debug!("controller state: {:?}", self.state);
    }

    /// Pointer pressed on a page at viewport coordinates.
    ///
    /// With no tool armed, a press on an existing highlight asks for
    /// delete confirmation. Note tools commit immediately; the highlight
    /// tool starts a drag.
    pub fn pointer_down(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        store: &mut AnnotationStore,
    ) -> Option<ControllerEvent> {
        match self.state {
            GestureState::Idle => {
                let hit = store.annotation_at(page, x, y)?;
                if hit.is_note() {
                    return None;
                }
                Some(ControllerEvent::ConfirmDelete(hit.id))
            }

            GestureState::ToolArmed(Tool::StickyNote) => {
                let (w, h) = STICKY_NOTE_SIZE;
                let id = store.create_note(NoteStyle::Sticky, page, Rect::new(x, y, w, h));
                self.state = GestureState::Idle;
                Some(ControllerEvent::AnnotationCreated(id))
            }

            GestureState::ToolArmed(Tool::TextBox) => {
                let (w, h) = TEXT_BOX_SIZE;
                let id = store.create_note(NoteStyle::TextBox, page, Rect::new(x, y, w, h));
                self.state = GestureState::Idle;
                Some(ControllerEvent::AnnotationCreated(id))
            }

            GestureState::ToolArmed(Tool::Highlight) => {
                self.state = GestureState::Dragging {
                    page,
                    origin: (x, y),
                    current: (x, y),
                };
                None
            }

            // A second press mid-drag has nowhere to go; ignore it.
            GestureState::Dragging { .. } => None,
        }
    }

    /// Pointer moved; extends the live preview while dragging
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let GestureState::Dragging { current, .. } = &mut self.state {
            *current = (x, y);
        }
    }

    /// The uncommitted preview rectangle, while a drag is in progress
    #[must_use]
    pub fn preview(&self) -> Option<Rect> {
        match self.state {
            GestureState::Dragging {
                origin, current, ..
            } => Some(Rect::from_corners(origin.0, origin.1, current.0, current.1)),
            _ => None,
        }
    }

    /// Pointer released: commit the highlight if the drag exceeds the
    /// minimum size on both axes, otherwise discard it. Either way the
    /// controller returns to `Idle`.
    pub fn pointer_up(&mut self, store: &mut AnnotationStore) -> Option<ControllerEvent> {
        let GestureState::Dragging {
            page,
            origin,
            current,
        } = self.state
        else {
            return None;
        };
        self.state = GestureState::Idle;

        let rect = Rect::from_corners(origin.0, origin.1, current.0, current.1);
        if rect.width < MIN_DRAG_SIZE || rect.height < MIN_DRAG_SIZE {
            debug!("discarding sub-threshold drag: {rect:?}");
            return None;
        }

        let id = store.create_highlight(page, rect, Some(HIGHLIGHT_COLOR.to_string()));
        Some(ControllerEvent::AnnotationCreated(id))
    }

    /// Escape: discard any in-progress preview and return to `Idle`.
    /// Valid from every state; the store is never touched.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Delete a highlight after the user confirmed the prompt
    pub fn confirm_delete(
        &mut self,
        id: AnnotationId,
        store: &mut AnnotationStore,
    ) -> Option<ControllerEvent> {
        store.delete(id).map(|_| ControllerEvent::AnnotationDeleted(id))
    }

    /// Delete a note through its delete affordance; no confirmation
    pub fn delete_note(
        &mut self,
        id: AnnotationId,
        store: &mut AnnotationStore,
    ) -> Option<ControllerEvent> {
        store.delete(id).map(|_| ControllerEvent::AnnotationDeleted(id))
    }
}
