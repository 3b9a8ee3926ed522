use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub contact_id: String,
    pub column_id: String,
}

impl CellRef {
    pub fn new(contact_id: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            column_id: column_id.into(),
        }
    }
}

/// What a single cell is doing right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    Viewing,
    Editing,
    Saving,
    Error(String),
}

/// Text handed back when an edit finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedEdit {
    pub target: CellRef,
    pub original: String,
    pub value: String,
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Viewing,
    Editing {
        target: CellRef,
        original: String,
        input: Input,
        invalid: Option<String>,
    },
}

/// Inline editor for one table cell at a time, plus the save/error marks
/// left on cells after editing finished.
#[derive(Debug, Default)]
pub struct CellEditor {
    phase: Phase,
    saving: Vec<CellRef>,
    errors: Vec<(CellRef, String)>,
}

impl CellEditor {
    pub fn start(&mut self, target: CellRef, current: &str) {
        self.errors.retain(|(cell, _)| *cell != target);
        self.phase = Phase::Editing {
            target,
            original: current.to_string(),
            input: Input::new(current.to_string()),
            invalid: None,
        };
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.phase, Phase::Editing { .. })
    }

    pub fn target(&self) -> Option<&CellRef> {
        match &self.phase {
            Phase::Editing { target, .. } => Some(target),
            Phase::Viewing => None,
        }
    }

    pub fn value(&self) -> &str {
        match &self.phase {
            Phase::Editing { input, .. } => input.value(),
            Phase::Viewing => "",
        }
    }

    pub fn visual_cursor(&self) -> usize {
        match &self.phase {
            Phase::Editing { input, .. } => input.visual_cursor(),
            Phase::Viewing => 0,
        }
    }

    /// Validation message for the text currently in the editor.
    pub fn invalid(&self) -> Option<&str> {
        match &self.phase {
            Phase::Editing { invalid, .. } => invalid.as_deref(),
            Phase::Viewing => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        match &mut self.phase {
            Phase::Editing { input, invalid, .. } => {
                let changed = input.handle_event(&Event::Key(key)).is_some();
                if changed {
                    *invalid = None;
                }
                changed
            }
            Phase::Viewing => false,
        }
    }

    /// Leave edit mode without touching anything.
    pub fn cancel(&mut self) -> Option<CellRef> {
        match std::mem::take(&mut self.phase) {
            Phase::Editing { target, .. } => Some(target),
            Phase::Viewing => None,
        }
    }

    /// Leave edit mode, handing back what was typed.
    pub fn finish(&mut self) -> Option<FinishedEdit> {
        match std::mem::take(&mut self.phase) {
            Phase::Editing {
                target,
                original,
                input,
                ..
            } => Some(FinishedEdit {
                target,
                original,
                value: input.value().to_string(),
            }),
            Phase::Viewing => None,
        }
    }

    /// Keep editing with a validation message on the cell.
    pub fn reject(&mut self, message: String) {
        if let Phase::Editing { invalid, .. } = &mut self.phase {
            *invalid = Some(message);
        }
    }

    pub fn mark_saving(&mut self, target: CellRef) {
        self.errors.retain(|(cell, _)| *cell != target);
        self.saving.push(target);
    }

    /// Drop one saving mark for the cell.
    pub fn mark_saved(&mut self, target: &CellRef) {
        if let Some(position) = self.saving.iter().position(|cell| cell == target) {
            self.saving.remove(position);
        }
    }

    pub fn mark_failed(&mut self, target: CellRef, message: String) {
        self.mark_saved(&target);
        self.errors.retain(|(cell, _)| *cell != target);
        self.errors.push((target, message));
    }

    pub fn clear_error(&mut self, target: &CellRef) {
        self.errors.retain(|(cell, _)| cell != target);
    }

    pub fn forget_contact(&mut self, contact_id: &str) {
        self.saving.retain(|cell| cell.contact_id != contact_id);
        self.errors.retain(|(cell, _)| cell.contact_id != contact_id);
        if self
            .target()
            .is_some_and(|target| target.contact_id == contact_id)
        {
            self.phase = Phase::Viewing;
        }
    }

    pub fn state(&self, cell: &CellRef) -> CellState {
        if self.target() == Some(cell) {
            return CellState::Editing;
        }
        if self.saving.contains(cell) {
            return CellState::Saving;
        }
        match self.errors.iter().find(|(c, _)| c == cell) {
            Some((_, message)) => CellState::Error(message.clone()),
            None => CellState::Viewing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cancel_discards_input() {
        let mut editor = CellEditor::default();
        let cell = CellRef::new("c1", "phone");
        editor.start(cell.clone(), "555");
        editor.handle_key_event(key(KeyCode::Char('9')));
        assert_eq!(editor.value(), "5559");
        assert_eq!(editor.state(&cell), CellState::Editing);

        assert_eq!(editor.cancel(), Some(cell.clone()));
        assert_eq!(editor.state(&cell), CellState::Viewing);
        assert!(editor.finish().is_none());
    }

    #[test]
    fn test_finish_reports_original_and_value() {
        let mut editor = CellEditor::default();
        editor.start(CellRef::new("c1", "name"), "Ad");
        editor.handle_key_event(key(KeyCode::Char('a')));
        let done = editor.finish().unwrap();
        assert_eq!(done.original, "Ad");
        assert_eq!(done.value, "Ada");
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_saving_then_error_marks() {
        let mut editor = CellEditor::default();
        let cell = CellRef::new("c1", "email");
        editor.mark_saving(cell.clone());
        assert_eq!(editor.state(&cell), CellState::Saving);
        editor.mark_failed(cell.clone(), "Request failed".into());
        assert_eq!(editor.state(&cell), CellState::Error("Request failed".into()));
        editor.start(cell.clone(), "x");
        editor.cancel();
        assert_eq!(editor.state(&cell), CellState::Viewing);
    }

    #[test]
    fn test_typing_clears_rejection() {
        let mut editor = CellEditor::default();
        editor.start(CellRef::new("c1", "email"), "bad");
        editor.reject("invalid email".into());
        assert_eq!(editor.invalid(), Some("invalid email"));
        editor.handle_key_event(key(KeyCode::Backspace));
        assert_eq!(editor.invalid(), None);
    }
}
