//! The contact table: virtualized rows, a configurable column layout,
//! row selection and inline cell editing.
//!
//! The table never talks to the backend. User actions come back as
//! [`TableEvent`]s and the caller reports how requests went through
//! [`ContactTable::save_succeeded`], [`ContactTable::save_failed`] and the
//! bulk delete counterparts.

pub mod cell_edit;
pub mod columns;
pub mod layout;
pub mod selection;
pub mod viewport;

use std::collections::HashMap;
use std::ops::Range;

use crossterm::event::KeyEvent;
use tracing::debug;

use crate::api::dispatch::RequestId;
use crate::model::{Contact, ContactPatch, CustomPropertyDefinition};

pub use cell_edit::{CellRef, CellState};
pub use columns::{ColumnDescriptor, ColumnKind, ColumnSet, NAME_COLUMN, SELECT_COLUMN};
pub use layout::{ColumnLayout, LayoutState};
pub use selection::HeaderCheck;

use cell_edit::CellEditor;
use selection::Selection;
use viewport::Viewport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    UpdateContact { id: String, patch: ContactPatch },
    BulkDelete(Vec<String>),
    ViewContact(String),
    SelectionChanged(Vec<String>),
    /// Order, widths or visibility changed and should be persisted.
    LayoutChanged(LayoutState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    NotEditing,
    /// Value unchanged; nothing sent.
    Unchanged,
    /// Still editing; the message is shown on the cell.
    Invalid(String),
    Submitted(TableEvent),
}

#[derive(Debug, Clone)]
struct PendingSave {
    /// Set once the update has been handed to the dispatcher.
    request: Option<RequestId>,
    contact_id: String,
    patch: ContactPatch,
}

pub struct ContactTable {
    rows: Vec<Contact>,
    /// Last server-confirmed copy of every row, used for rollbacks.
    confirmed: HashMap<String, Contact>,
    columns: ColumnSet,
    layout: ColumnLayout,
    selection: Selection,
    viewport: Viewport,
    cursor_row: usize,
    cursor_col: usize,
    editor: CellEditor,
    pending: Vec<PendingSave>,
    deleting: Option<Vec<String>>,
    min_column_width: u16,
}

impl ContactTable {
    pub fn new(
        definitions: &[CustomPropertyDefinition],
        saved_layout: Option<LayoutState>,
        overscan: usize,
        min_column_width: u16,
    ) -> Self {
        let columns = ColumnSet::build(definitions, min_column_width);
        let layout = ColumnLayout::new(saved_layout, &columns);
        Self {
            rows: Vec::new(),
            confirmed: HashMap::new(),
            columns,
            layout,
            selection: Selection::default(),
            viewport: Viewport::new(overscan),
            cursor_row: 0,
            cursor_col: 1,
            editor: CellEditor::default(),
            pending: Vec::new(),
            deleting: None,
            min_column_width,
        }
    }

    // ---------------------------------------------------------------------
    // Data
    // ---------------------------------------------------------------------

    /// Replace the rows with a freshly fetched page. Saves still in flight
    /// are re-applied so their optimistic values are not lost.
    pub fn set_rows(&mut self, contacts: Vec<Contact>) {
        self.confirmed = contacts
            .iter()
            .map(|contact| (contact.id.clone(), contact.clone()))
            .collect();
        self.rows = contacts;
        for pending in &self.pending {
            if let Some(row) = self.rows.iter_mut().find(|r| r.id == pending.contact_id) {
                pending.patch.apply(row);
            }
        }
        if let Some(target) = self.editor.target() {
            let still_here = self.rows.iter().any(|r| r.id == target.contact_id);
            if !still_here {
                self.editor.cancel();
            }
        }
        self.cursor_row = self.cursor_row.min(self.rows.len().saturating_sub(1));
        self.viewport.set_height(self.viewport.height(), self.rows.len());
        self.viewport.scroll_to(self.cursor_row, self.rows.len());
    }

    pub fn set_definitions(&mut self, definitions: &[CustomPropertyDefinition]) {
        self.columns = ColumnSet::build(definitions, self.min_column_width);
        self.layout.sync_columns(&self.columns);
        if let Some(target) = self.editor.target() {
            if !self.columns.contains(&target.column_id) {
                self.editor.cancel();
            }
        }
        self.clamp_cursor_col();
    }

    /// Re-apply a saved layout against the current columns, for layouts
    /// that name custom columns which were not known yet.
    pub fn restore_layout(&mut self, state: LayoutState) {
        self.layout = ColumnLayout::new(Some(state), &self.columns);
        self.clamp_cursor_col();
    }

    pub fn rows(&self) -> &[Contact] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor> {
        self.layout
            .visible()
            .iter()
            .filter_map(|id| self.columns.get(id))
            .collect()
    }

    pub fn column_width(&self, id: &str) -> u16 {
        self.layout.width(id, &self.columns)
    }

    pub fn cell_text(&self, row: usize, column: &ColumnDescriptor) -> String {
        match self.rows.get(row) {
            Some(contact) => self.columns.display(column, contact),
            None => String::new(),
        }
    }

    pub fn cell_state(&self, row: usize, column_id: &str) -> CellState {
        match self.rows.get(row) {
            Some(contact) => self.editor.state(&CellRef::new(&contact.id, column_id)),
            None => CellState::Viewing,
        }
    }

    pub fn has_pending_saves(&self) -> bool {
        !self.pending.is_empty()
    }

    // ---------------------------------------------------------------------
    // Cursor and viewport
    // ---------------------------------------------------------------------

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn current_contact(&self) -> Option<&Contact> {
        self.rows.get(self.cursor_row)
    }

    pub fn current_column(&self) -> Option<&ColumnDescriptor> {
        let visible = self.layout.visible();
        visible
            .get(self.cursor_col)
            .and_then(|id| self.columns.get(id))
    }

    fn clamp_cursor_col(&mut self) {
        let count = self.layout.visible().len();
        self.cursor_col = self.cursor_col.min(count.saturating_sub(1));
    }

    pub fn move_row(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        self.cursor_row = self.cursor_row.saturating_add_signed(delta).min(last);
        self.viewport.scroll_to(self.cursor_row, self.rows.len());
    }

    pub fn move_col(&mut self, delta: isize) {
        let count = self.layout.visible().len();
        if count == 0 {
            return;
        }
        self.cursor_col = self.cursor_col.saturating_add_signed(delta).min(count - 1);
    }

    pub fn page_rows(&mut self, pages: isize) {
        let height = self.viewport.height().max(1) as isize;
        self.move_row(pages * height);
    }

    pub fn first_row(&mut self) {
        self.cursor_row = 0;
        self.viewport.scroll_to(0, self.rows.len());
    }

    pub fn last_row(&mut self) {
        self.move_row(isize::MAX);
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport.set_height(height, self.rows.len());
        self.viewport.scroll_to(self.cursor_row, self.rows.len());
    }

    /// Row indices to render.
    pub fn mounted_rows(&self) -> Range<usize> {
        self.viewport.mounted(self.rows.len())
    }

    pub fn visible_rows(&self) -> Range<usize> {
        self.viewport.visible(self.rows.len())
    }

    // ---------------------------------------------------------------------
    // Inline editing
    // ---------------------------------------------------------------------

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing()
    }

    pub fn editor_value(&self) -> &str {
        self.editor.value()
    }

    pub fn editor_cursor(&self) -> usize {
        self.editor.visual_cursor()
    }

    pub fn editor_message(&self) -> Option<&str> {
        self.editor.invalid()
    }

    /// Start editing the cell under the cursor.
    pub fn begin_edit(&mut self) -> Result<(), String> {
        let Some(contact) = self.current_contact() else {
            return Err("no contact selected".to_string());
        };
        let Some(column) = self.current_column() else {
            return Err("no column selected".to_string());
        };
        if !column.is_editable() {
            return Err(format!("{} cannot be edited", column.title));
        }
        let target = CellRef::new(&contact.id, &column.id);
        let current = self.columns.display(column, contact);
        self.editor.start(target, &current);
        Ok(())
    }

    pub fn edit_key(&mut self, key: KeyEvent) -> bool {
        self.editor.handle_key_event(key)
    }

    /// Escape: drop the edit, nothing is sent.
    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    /// Enter or blur.
    pub fn commit_edit(&mut self) -> CommitOutcome {
        let Some(target) = self.editor.target().cloned() else {
            return CommitOutcome::NotEditing;
        };
        let Some(column) = self.columns.get(&target.column_id).cloned() else {
            self.editor.cancel();
            return CommitOutcome::NotEditing;
        };

        let value = self.editor.value().to_string();
        let patch = match self.columns.parse(&column, &value) {
            Ok(patch) => patch,
            Err(message) => {
                self.editor.reject(message.clone());
                return CommitOutcome::Invalid(message);
            }
        };

        let Some(done) = self.editor.finish() else {
            return CommitOutcome::NotEditing;
        };
        if done.value == done.original && !column.always_round_trip() {
            return CommitOutcome::Unchanged;
        }

        let Some(row) = self.rows.iter_mut().find(|r| r.id == target.contact_id) else {
            return CommitOutcome::NotEditing;
        };
        patch.apply(row);
        debug!(contact = %target.contact_id, column = %target.column_id, "cell update submitted");
        self.pending.push(PendingSave {
            request: None,
            contact_id: target.contact_id.clone(),
            patch: patch.clone(),
        });
        self.editor.mark_saving(target.clone());
        CommitOutcome::Submitted(TableEvent::UpdateContact {
            id: target.contact_id,
            patch,
        })
    }

    /// Tie the most recent untracked save to the request carrying it.
    pub fn track_save(&mut self, request: RequestId) {
        if let Some(pending) = self.pending.iter_mut().rev().find(|p| p.request.is_none()) {
            pending.request = Some(request);
        }
    }

    fn take_pending(&mut self, request: RequestId) -> Option<PendingSave> {
        let position = self
            .pending
            .iter()
            .position(|p| p.request == Some(request))?;
        Some(self.pending.remove(position))
    }

    /// The server accepted a cell update and returned the stored contact.
    pub fn save_succeeded(&mut self, request: RequestId, contact: Contact, column_id: &str) {
        self.take_pending(request);
        self.editor
            .mark_saved(&CellRef::new(&contact.id, column_id));

        let id = contact.id.clone();
        self.confirmed.insert(id.clone(), contact.clone());
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == id) {
            *row = contact;
            for pending in self.pending.iter().filter(|p| p.contact_id == id) {
                pending.patch.apply(row);
            }
        }
    }

    /// The update was refused or never arrived: put the field back to its
    /// last confirmed value and flag the cell.
    pub fn save_failed(
        &mut self,
        request: RequestId,
        contact_id: &str,
        column_id: &str,
        message: String,
    ) {
        if self.take_pending(request).is_none() {
            return;
        }
        let target = CellRef::new(contact_id, column_id);
        self.editor.mark_failed(target, message);

        let Some(column) = self.columns.get(column_id) else {
            return;
        };
        let restore = self
            .confirmed
            .get(contact_id)
            .and_then(|confirmed| self.columns.snapshot(column, confirmed));
        let Some(row) = self.rows.iter_mut().find(|r| r.id == contact_id) else {
            return;
        };
        if let Some(restore) = restore {
            restore.apply(row);
        }
        for pending in self
            .pending
            .iter()
            .filter(|p| p.contact_id == contact_id && p.patch.column_id() == column_id)
        {
            pending.patch.apply(row);
        }
    }

    pub fn clear_cell_error(&mut self) {
        if let (Some(contact), Some(column)) = (self.current_contact(), self.current_column()) {
            let cell = CellRef::new(&contact.id, &column.id);
            self.editor.clear_error(&cell);
        }
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn header_check(&self) -> HeaderCheck {
        self.selection.header(&self.row_ids())
    }

    pub fn toggle_current(&mut self) -> Option<TableEvent> {
        let id = self.current_contact()?.id.clone();
        self.selection.toggle(&id);
        Some(TableEvent::SelectionChanged(self.selection.ids()))
    }

    pub fn toggle_all(&mut self) -> TableEvent {
        let ids: Vec<String> = self.rows.iter().map(|r| r.id.clone()).collect();
        let visible: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.selection.toggle_all(&visible);
        TableEvent::SelectionChanged(self.selection.ids())
    }

    pub fn clear_selection(&mut self) -> TableEvent {
        self.selection.clear();
        TableEvent::SelectionChanged(Vec::new())
    }

    // ---------------------------------------------------------------------
    // Detail and bulk delete
    // ---------------------------------------------------------------------

    pub fn view_current(&self) -> Option<TableEvent> {
        self.current_contact()
            .map(|contact| TableEvent::ViewContact(contact.id.clone()))
    }

    /// Number of rows the confirm prompt should mention, or None when there
    /// is nothing to delete.
    pub fn request_bulk_delete(&self) -> Option<usize> {
        if self.deleting.is_some() || self.selection.is_empty() {
            return None;
        }
        Some(self.selection.len())
    }

    pub fn confirm_bulk_delete(&mut self) -> Option<TableEvent> {
        if self.deleting.is_some() || self.selection.is_empty() {
            return None;
        }
        let ids = self.selection.ids();
        self.deleting = Some(ids.clone());
        Some(TableEvent::BulkDelete(ids))
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_some()
    }

    /// Remove the deleted rows and clear the selection.
    pub fn bulk_delete_succeeded(&mut self, ids: &[String]) -> TableEvent {
        self.deleting = None;
        self.remove_rows(ids);
        self.selection.clear();
        TableEvent::SelectionChanged(Vec::new())
    }

    /// Rows and selection stay as they were.
    pub fn bulk_delete_failed(&mut self) {
        self.deleting = None;
    }

    pub fn remove_rows(&mut self, ids: &[String]) {
        self.rows.retain(|row| !ids.contains(&row.id));
        for id in ids {
            self.confirmed.remove(id);
            self.editor.forget_contact(id);
        }
        self.pending.retain(|p| !ids.contains(&p.contact_id));
        self.selection.remove_many(ids);
        self.cursor_row = self.cursor_row.min(self.rows.len().saturating_sub(1));
        self.viewport.set_height(self.viewport.height(), self.rows.len());
    }

    // ---------------------------------------------------------------------
    // Layout gestures
    // ---------------------------------------------------------------------

    fn layout_changed(&self) -> TableEvent {
        TableEvent::LayoutChanged(self.layout.to_state())
    }

    pub fn is_resizing(&self) -> bool {
        self.layout.resizing().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.layout.dragging().is_some()
    }

    pub fn begin_resize(&mut self) -> bool {
        let Some(id) = self.current_column().map(|c| c.id.clone()) else {
            return false;
        };
        self.layout.begin_resize(&id, &self.columns)
    }

    pub fn adjust_resize(&mut self, delta: i32) {
        self.layout.adjust_resize(delta, &self.columns);
    }

    pub fn commit_resize(&mut self) -> Option<TableEvent> {
        self.layout.commit_resize().then(|| self.layout_changed())
    }

    pub fn cancel_resize(&mut self) {
        self.layout.cancel_resize();
    }

    pub fn begin_drag(&mut self) -> bool {
        let Some(id) = self.current_column().map(|c| c.id.clone()) else {
            return false;
        };
        self.layout.begin_drag(&id, &self.columns)
    }

    /// Move the dragged header; the cursor follows it.
    pub fn drag_by(&mut self, delta: isize) {
        self.layout.drag_by(delta);
        if let Some(id) = self.layout.dragging() {
            if let Some(position) = self.layout.visible().iter().position(|c| c == id) {
                self.cursor_col = position;
            }
        }
    }

    pub fn drop_drag(&mut self) -> Option<TableEvent> {
        self.layout.drop_drag().then(|| self.layout_changed())
    }

    pub fn cancel_drag(&mut self) {
        let dragged = self.layout.dragging().map(str::to_string);
        self.layout.cancel_drag();
        if let Some(id) = dragged {
            if let Some(position) = self.layout.visible().iter().position(|c| *c == id) {
                self.cursor_col = position;
            }
        }
    }

    pub fn toggle_column(&mut self, id: &str) -> Option<TableEvent> {
        if !self.layout.toggle_hidden(id, &self.columns) {
            return None;
        }
        self.clamp_cursor_col();
        Some(self.layout_changed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crate::model::{ContactStatus, CustomFieldType, CustomValue, FixedPatch};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(table: &mut ContactTable, text: &str) {
        for c in text.chars() {
            table.edit_key(key(KeyCode::Char(c)));
        }
    }

    fn clear_input(table: &mut ContactTable) {
        let len = table.editor_value().chars().count();
        for _ in 0..len {
            table.edit_key(key(KeyCode::Backspace));
        }
    }

    fn table_with(n: usize) -> ContactTable {
        let mut table = ContactTable::new(&[], None, 3, 8);
        table.set_rows(
            (0..n)
                .map(|i| fixtures::contact(&format!("c{}", i), &format!("Contact {}", i)))
                .collect(),
        );
        table.set_viewport_height(10);
        table
    }

    fn focus_column(table: &mut ContactTable, id: &str) {
        let position = table.layout().visible().iter().position(|c| c == id).unwrap();
        table.cursor_col = position;
    }

    #[test]
    fn test_escape_restores_and_sends_nothing() {
        let mut table = table_with(3);
        focus_column(&mut table, "phone");
        table.begin_edit().unwrap();
        type_text(&mut table, "0400");
        table.cancel_edit();

        assert!(!table.is_editing());
        assert_eq!(table.rows()[0].phone, None);
        assert!(!table.has_pending_saves());
        assert_eq!(table.cell_state(0, "phone"), CellState::Viewing);
    }

    #[test]
    fn test_commit_emits_single_field_update() {
        let mut table = table_with(3);
        focus_column(&mut table, "email");
        table.begin_edit().unwrap();
        type_text(&mut table, "c0@example.com");

        let outcome = table.commit_edit();
        let expected = ContactPatch::Fixed(FixedPatch::Email(Some("c0@example.com".into())));
        assert_eq!(
            outcome,
            CommitOutcome::Submitted(TableEvent::UpdateContact {
                id: "c0".into(),
                patch: expected.clone(),
            })
        );
        assert_eq!(
            serde_json::to_value(&expected).unwrap(),
            serde_json::json!({ "email": "c0@example.com" })
        );
        assert_eq!(table.rows()[0].email.as_deref(), Some("c0@example.com"));
        assert_eq!(table.cell_state(0, "email"), CellState::Saving);
    }

    #[test]
    fn test_unchanged_value_skips_request() {
        let mut table = table_with(1);
        table.begin_edit().unwrap();
        assert_eq!(table.commit_edit(), CommitOutcome::Unchanged);
        assert!(!table.has_pending_saves());
    }

    #[test]
    fn test_text_custom_column_always_round_trips() {
        let definition = CustomPropertyDefinition {
            id: "d1".into(),
            name: "Budget".into(),
            field_key: "budget".into(),
            field_type: CustomFieldType::Text,
            options: Vec::new(),
            is_active: true,
        };
        let mut table = ContactTable::new(&[definition], None, 3, 8);
        table.set_rows(vec![fixtures::contact("c0", "Ada")]);
        focus_column(&mut table, "custom:budget");
        table.begin_edit().unwrap();
        match table.commit_edit() {
            CommitOutcome::Submitted(TableEvent::UpdateContact { patch, .. }) => {
                assert_eq!(
                    patch,
                    ContactPatch::Custom {
                        field_key: "budget".into(),
                        value: CustomValue::Text(String::new()),
                    }
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_value_keeps_editing() {
        let mut table = table_with(1);
        focus_column(&mut table, "name");
        table.begin_edit().unwrap();
        clear_input(&mut table);
        assert_eq!(
            table.commit_edit(),
            CommitOutcome::Invalid("name is required".into())
        );
        assert!(table.is_editing());
        assert_eq!(table.editor_message(), Some("name is required"));
        assert!(!table.has_pending_saves());
    }

    #[test]
    fn test_reserved_cells_refuse_edit() {
        let mut table = table_with(1);
        focus_column(&mut table, "createdAt");
        assert!(table.begin_edit().is_err());
        focus_column(&mut table, SELECT_COLUMN);
        assert!(table.begin_edit().is_err());
        assert!(!table.is_editing());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let mut table = table_with(2);
        focus_column(&mut table, "status");
        table.begin_edit().unwrap();
        clear_input(&mut table);
        type_text(&mut table, "closed won");
        assert!(matches!(table.commit_edit(), CommitOutcome::Submitted(_)));
        table.track_save(RequestId(1));
        assert_eq!(table.rows()[0].status, ContactStatus::ClosedWon);

        table.save_failed(
            RequestId(1),
            "c0",
            "status",
            "Request failed, please try again".into(),
        );
        assert_eq!(table.rows()[0].status, ContactStatus::New);
        assert_eq!(
            table.cell_state(0, "status"),
            CellState::Error("Request failed, please try again".into())
        );
    }

    #[test]
    fn test_successful_save_takes_server_copy() {
        let mut table = table_with(1);
        focus_column(&mut table, "phone");
        table.begin_edit().unwrap();
        type_text(&mut table, "555");
        table.commit_edit();
        table.track_save(RequestId(7));

        let mut stored = fixtures::contact("c0", "Contact 0");
        stored.phone = Some("555".into());
        stored.lead_source = Some("server".into());
        table.save_succeeded(RequestId(7), stored, "phone");
        assert_eq!(table.rows()[0].lead_source.as_deref(), Some("server"));
        assert_eq!(table.cell_state(0, "phone"), CellState::Viewing);
        assert!(!table.has_pending_saves());
    }

    #[test]
    fn test_later_save_failing_first_keeps_earlier_save() {
        let mut table = table_with(1);
        focus_column(&mut table, "status");
        for (request, value) in [(1, "qualified"), (2, "closed won")] {
            table.begin_edit().unwrap();
            clear_input(&mut table);
            type_text(&mut table, value);
            assert!(matches!(table.commit_edit(), CommitOutcome::Submitted(_)));
            table.track_save(RequestId(request));
        }
        assert_eq!(table.rows()[0].status, ContactStatus::ClosedWon);

        table.save_failed(RequestId(2), "c0", "status", "Request failed".into());
        assert_eq!(table.rows()[0].status, ContactStatus::Qualified);
        assert!(table.has_pending_saves());

        let mut stored = fixtures::contact("c0", "Contact 0");
        stored.status = ContactStatus::Qualified;
        table.save_succeeded(RequestId(1), stored, "status");
        assert_eq!(table.rows()[0].status, ContactStatus::Qualified);
        assert!(!table.has_pending_saves());
    }

    #[test]
    fn test_select_all_then_deselect_one() {
        let mut table = table_with(4);
        table.toggle_all();
        assert_eq!(table.header_check(), HeaderCheck::All);
        table.move_row(2);
        assert_eq!(
            table.toggle_current(),
            Some(TableEvent::SelectionChanged(vec![
                "c0".into(),
                "c1".into(),
                "c3".into()
            ]))
        );
        assert_eq!(table.header_check(), HeaderCheck::Some);
    }

    #[test]
    fn test_bulk_delete_removes_exactly_selected() {
        let mut table = table_with(6);
        table.toggle_current();
        table.move_row(3);
        table.toggle_current();
        assert_eq!(table.request_bulk_delete(), Some(2));

        let Some(TableEvent::BulkDelete(ids)) = table.confirm_bulk_delete() else {
            panic!("expected bulk delete");
        };
        assert_eq!(ids, vec!["c0".to_string(), "c3".to_string()]);
        assert!(table.request_bulk_delete().is_none());

        table.bulk_delete_succeeded(&ids);
        assert_eq!(table.row_count(), 4);
        assert!(table.rows().iter().all(|r| r.id != "c0" && r.id != "c3"));
        assert_eq!(table.selected_count(), 0);
    }

    #[test]
    fn test_bulk_delete_failure_keeps_rows() {
        let mut table = table_with(3);
        table.toggle_all();
        table.confirm_bulk_delete();
        table.bulk_delete_failed();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.selected_count(), 3);
        assert!(table.request_bulk_delete().is_some());
    }

    #[test]
    fn test_mounted_rows_follow_cursor() {
        let mut table = table_with(500);
        table.move_row(250);
        let mounted = table.mounted_rows();
        assert!(mounted.contains(&250));
        assert!(mounted.len() <= 10 + 2 * 3);
        assert!(table.visible_rows().contains(&250));
    }

    #[test]
    fn test_drag_emits_layout_change() {
        let mut table = table_with(1);
        focus_column(&mut table, "suburb");
        assert!(table.begin_drag());
        table.drag_by(-10);
        let Some(TableEvent::LayoutChanged(state)) = table.drop_drag() else {
            panic!("expected layout change");
        };
        assert_eq!(&state.order[..3], &["select", "name", "suburb"]);
        assert_eq!(table.current_column().unwrap().id, "suburb");
    }

    #[test]
    fn test_new_page_drops_edit_of_missing_row() {
        let mut table = table_with(2);
        table.begin_edit().unwrap();
        table.set_rows(vec![fixtures::contact("other", "Other")]);
        assert!(!table.is_editing());
    }
}
