//! Host editor capability surface
//!
//! The recorder and player never own an editor implementation; they talk to
//! it through [`EditorHost`]. [`MemoryEditor`] is the in-process
//! implementation used for headless playback and tests.

use super::document::Document;
use super::types::{CursorState, EditOperation, EditorViewState, Position};

/// Operations the recorder and player need from the host editor
pub trait EditorHost {
    /// Full document text
    fn get_value(&self) -> String;

    /// Replace the document text
    fn set_value(&mut self, text: &str);

    /// Current cursors and viewport
    fn save_view_state(&self) -> EditorViewState;

    fn restore_view_state(&mut self, state: &EditorViewState);

    /// Apply edits in order. Only called when [`has_model`](Self::has_model) is true.
    fn push_edit_operations(&mut self, operations: &[EditOperation]);

    fn set_read_only(&mut self, read_only: bool);

    fn focus(&mut self) {}

    /// Whether a text model is attached. Without one, apply steps are skipped.
    fn has_model(&self) -> bool {
        true
    }
}

/// One change notification from the host: all edits of a model revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub revision: u64,
    pub changes: Vec<EditOperation>,
}

/// In-memory editor backed by [`Document`].
///
/// Every edit bumps the revision. User edits, and programmatic edits while
/// writable, queue a [`ContentChange`] for the embedding code to forward to
/// the recorder. Playback edits arrive while read-only and are not queued.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    document: Document,
    view_state: EditorViewState,
    read_only: bool,
    focused: bool,
    revision: u64,
    pending: Vec<ContentChange>,
}

impl MemoryEditor {
    pub fn new(text: &str) -> Self {
        Self {
            document: Document::new(text),
            view_state: EditorViewState {
                cursor_state: vec![CursorState::at(Position::new(1, 1))],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// User edit. Rejected while read-only; moves the primary cursor to the end of the insertion.
    pub fn type_edits(&mut self, operations: Vec<EditOperation>) -> bool {
        if self.read_only {
            return false;
        }

        let mut caret = None;
        for operation in &operations {
            caret = Some(self.document.apply(operation).end());
        }
        if let Some(caret) = caret {
            self.set_cursor(caret);
        }
        self.notify(operations);
        true
    }

    /// Collapse to a single cursor
    pub fn set_cursor(&mut self, position: Position) {
        let position = self.document.validate_position(position);
        self.view_state.cursor_state = vec![CursorState::at(position)];
    }

    pub fn scroll_to(&mut self, scroll_top: i32, scroll_left: i32) {
        let view = &mut self.view_state.view_state;
        view.scroll_top = Some(scroll_top);
        view.scroll_top_without_view_zones = Some(scroll_top);
        view.scroll_left = scroll_left;
    }

    /// Drain queued change notifications
    pub fn take_changes(&mut self) -> Vec<ContentChange> {
        std::mem::take(&mut self.pending)
    }

    fn notify(&mut self, changes: Vec<EditOperation>) {
        self.revision += 1;
        if !changes.is_empty() {
            self.pending.push(ContentChange {
                revision: self.revision,
                changes,
            });
        }
    }
}

impl EditorHost for MemoryEditor {
    fn get_value(&self) -> String {
        self.document.text()
    }

    fn set_value(&mut self, text: &str) {
        self.document.set_text(text);
        self.revision += 1;
        self.set_cursor(Position::new(1, 1));
    }

    fn save_view_state(&self) -> EditorViewState {
        self.view_state.clone()
    }

    fn restore_view_state(&mut self, state: &EditorViewState) {
        self.view_state = state.clone();
    }

    fn push_edit_operations(&mut self, operations: &[EditOperation]) {
        self.document.apply_all(operations);
        if self.read_only {
            self.revision += 1;
        } else {
            self.notify(operations.to_vec());
        }
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}
