//! Single-contact view: the contact's fields plus its tasks, notes and
//! activities, with a popup form for creating and editing them.

pub mod form;

use time::OffsetDateTime;

use crate::api::Request;
use crate::model::{
    format_date, Activity, Contact, ContactDetail, ContactField, Note, RelatedKind, Task,
    TaskDraft, TaskPriority, TaskStatus,
};
use crate::table::cell_edit::{CellEditor, CellRef, CellState};
use crate::table::CommitOutcome;
use crate::table::TableEvent;

pub use form::{FormField, ItemForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailTab {
    All,
    Tasks,
    Notes,
    Activities,
}

impl DetailTab {
    pub const ALL: [DetailTab; 4] = [
        DetailTab::All,
        DetailTab::Tasks,
        DetailTab::Notes,
        DetailTab::Activities,
    ];

    pub fn title(self) -> &'static str {
        match self {
            DetailTab::All => "ALL",
            DetailTab::Tasks => "TASKS",
            DetailTab::Notes => "NOTES",
            DetailTab::Activities => "ACTIVITIES",
        }
    }

    pub fn digit(self) -> char {
        match self {
            DetailTab::All => '1',
            DetailTab::Tasks => '2',
            DetailTab::Notes => '3',
            DetailTab::Activities => '4',
        }
    }

    pub fn index(self) -> usize {
        match self {
            DetailTab::All => 0,
            DetailTab::Tasks => 1,
            DetailTab::Notes => 2,
            DetailTab::Activities => 3,
        }
    }

    pub fn from_digit(digit: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|tab| tab.digit() == digit)
    }

    /// Next tab, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// The kind of record created from this tab.
    pub fn default_kind(self) -> RelatedKind {
        match self {
            DetailTab::All | DetailTab::Notes => RelatedKind::Note,
            DetailTab::Tasks => RelatedKind::Task,
            DetailTab::Activities => RelatedKind::Activity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatusFilter {
    #[default]
    All,
    /// Pending or in progress
    Pending,
    Completed,
}

impl TaskStatusFilter {
    pub fn title(self) -> &'static str {
        match self {
            TaskStatusFilter::All => "all",
            TaskStatusFilter::Pending => "pending",
            TaskStatusFilter::Completed => "completed",
        }
    }

    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            TaskStatusFilter::All => true,
            TaskStatusFilter::Pending => {
                matches!(status, TaskStatus::Pending | TaskStatus::InProgress)
            }
            TaskStatusFilter::Completed => status == TaskStatus::Completed,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            TaskStatusFilter::All => TaskStatusFilter::Pending,
            TaskStatusFilter::Pending => TaskStatusFilter::Completed,
            TaskStatusFilter::Completed => TaskStatusFilter::All,
        }
    }
}

/// `None` shows every priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriorityFilter(pub Option<TaskPriority>);

impl PriorityFilter {
    pub fn title(self) -> &'static str {
        match self.0 {
            Some(priority) => priority.label(),
            None => "all",
        }
    }

    pub fn matches(self, priority: TaskPriority) -> bool {
        self.0.map_or(true, |p| p == priority)
    }

    pub fn cycle(self) -> Self {
        let all = TaskPriority::ALL;
        match self.0 {
            None => PriorityFilter(all.first().copied()),
            Some(current) => {
                let index = all.iter().position(|p| *p == current).unwrap_or(0);
                PriorityFilter(all.get(index + 1).copied())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailItem {
    Task(Task),
    Note(Note),
    Activity(Activity),
}

impl DetailItem {
    pub fn kind(&self) -> RelatedKind {
        match self {
            DetailItem::Task(_) => RelatedKind::Task,
            DetailItem::Note(_) => RelatedKind::Note,
            DetailItem::Activity(_) => RelatedKind::Activity,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DetailItem::Task(t) => &t.id,
            DetailItem::Note(n) => &n.id,
            DetailItem::Activity(a) => &a.id,
        }
    }

    pub fn created_at(&self) -> OffsetDateTime {
        match self {
            DetailItem::Task(t) => t.created_at,
            DetailItem::Note(n) => n.created_at,
            DetailItem::Activity(a) => a.created_at,
        }
    }

    /// One-line summary for the list.
    pub fn summary(&self) -> String {
        match self {
            DetailItem::Task(t) => {
                let check = if t.status == TaskStatus::Completed { "[x]" } else { "[ ]" };
                let due = t
                    .due_date
                    .map(|d| format!("  due {}", format_date(d)))
                    .unwrap_or_default();
                format!("{} {} ({}){}", check, t.title, t.priority.label(), due)
            }
            DetailItem::Note(n) => n.content.lines().next().unwrap_or_default().to_string(),
            DetailItem::Activity(a) => match &a.description {
                Some(description) => format!("{}: {}", a.activity_type.label(), description),
                None => a.activity_type.label().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFocus {
    Fields,
    Items,
}

pub struct DetailView {
    detail: ContactDetail,
    loaded: bool,
    tab: DetailTab,
    status_filter: TaskStatusFilter,
    priority_filter: PriorityFilter,
    items: Vec<DetailItem>,
    cursor: usize,
    focus: DetailFocus,
    field_cursor: usize,
    field_editor: CellEditor,
    pub form: Option<ItemForm>,
    /// Optimistically removed items, kept until the delete is confirmed.
    pending_deletes: Vec<DetailItem>,
    /// Tasks as they were before an optimistic completion toggle.
    pending_toggles: Vec<Task>,
}

impl DetailView {
    /// Open with the row already on screen while the full record loads.
    pub fn open(contact: Contact) -> Self {
        let mut view = Self {
            detail: ContactDetail {
                contact,
                tasks: Vec::new(),
                notes: Vec::new(),
                activities: Vec::new(),
            },
            loaded: false,
            tab: DetailTab::All,
            status_filter: TaskStatusFilter::All,
            priority_filter: PriorityFilter::default(),
            items: Vec::new(),
            cursor: 0,
            focus: DetailFocus::Items,
            field_cursor: 0,
            field_editor: CellEditor::default(),
            form: None,
            pending_deletes: Vec::new(),
            pending_toggles: Vec::new(),
        };
        view.recompute();
        view
    }

    pub fn contact_id(&self) -> &str {
        &self.detail.contact.id
    }

    pub fn contact(&self) -> &Contact {
        &self.detail.contact
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Take a freshly fetched record. Deletes and toggles still in flight
    /// stay applied.
    pub fn set_detail(&mut self, detail: ContactDetail) {
        self.detail = detail;
        self.loaded = true;
        for removed in &self.pending_deletes {
            remove_item(&mut self.detail, removed.kind(), removed.id());
        }
        for previous in &self.pending_toggles {
            if let Some(task) = self.detail.tasks.iter_mut().find(|t| t.id == previous.id) {
                task.status = toggled(previous.status);
            }
        }
        self.recompute();
    }

    // ---------------------------------------------------------------------
    // Tabs, filters and the item list
    // ---------------------------------------------------------------------

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn status_filter(&self) -> TaskStatusFilter {
        self.status_filter
    }

    pub fn priority_filter(&self) -> PriorityFilter {
        self.priority_filter
    }

    pub fn items(&self) -> &[DetailItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&DetailItem> {
        self.items.get(self.cursor)
    }

    pub fn select_tab(&mut self, tab: DetailTab) {
        if self.tab != tab {
            self.tab = tab;
            self.cursor = 0;
            self.recompute();
        }
    }

    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.cycle();
        self.recompute();
    }

    pub fn cycle_priority_filter(&mut self) {
        self.priority_filter = self.priority_filter.cycle();
        self.recompute();
    }

    /// Rebuild the list for the current tab, newest first. Task filters
    /// only apply on the Tasks tab.
    fn recompute(&mut self) {
        let mut items = Vec::new();
        let tasks_only = self.tab == DetailTab::Tasks;
        if matches!(self.tab, DetailTab::All | DetailTab::Tasks) {
            items.extend(
                self.detail
                    .tasks
                    .iter()
                    .filter(|t| {
                        !tasks_only
                            || (self.status_filter.matches(t.status)
                                && self.priority_filter.matches(t.priority))
                    })
                    .cloned()
                    .map(DetailItem::Task),
            );
        }
        if matches!(self.tab, DetailTab::All | DetailTab::Notes) {
            items.extend(self.detail.notes.iter().cloned().map(DetailItem::Note));
        }
        if matches!(self.tab, DetailTab::All | DetailTab::Activities) {
            items.extend(self.detail.activities.iter().cloned().map(DetailItem::Activity));
        }
        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        self.items = items;
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }

    pub fn focus(&self) -> DetailFocus {
        self.focus
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            DetailFocus::Fields => DetailFocus::Items,
            DetailFocus::Items => DetailFocus::Fields,
        };
    }

    pub fn move_cursor(&mut self, delta: isize) {
        match self.focus {
            DetailFocus::Items => {
                let last = self.items.len().saturating_sub(1);
                self.cursor = self.cursor.saturating_add_signed(delta).min(last);
            }
            DetailFocus::Fields => {
                let last = ContactField::ALL.len() - 1;
                self.field_cursor = self.field_cursor.saturating_add_signed(delta).min(last);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Popup form
    // ---------------------------------------------------------------------

    pub fn open_selected(&mut self) -> bool {
        let form = match self.selected() {
            Some(DetailItem::Task(t)) => ItemForm::task(Some(t)),
            Some(DetailItem::Note(n)) => ItemForm::note(Some(n)),
            Some(DetailItem::Activity(a)) => ItemForm::activity(Some(a)),
            None => return false,
        };
        self.form = Some(form);
        true
    }

    pub fn new_item(&mut self, kind: RelatedKind) {
        self.form = Some(ItemForm::new(kind));
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    pub fn submit_form(&mut self) -> Option<Request> {
        let contact_id = self.detail.contact.id.clone();
        self.form.as_mut()?.submit(&contact_id)
    }

    /// A create or update came back. Toggle confirmations are matched by
    /// id; anything else closes the form.
    pub fn item_saved(&mut self, item: DetailItem) {
        let id = item.id().to_string();
        let kind = item.kind();
        let was_toggle = kind == RelatedKind::Task && self.take_toggle(&id).is_some();
        match item {
            DetailItem::Task(task) => upsert(&mut self.detail.tasks, task, |t| &t.id),
            DetailItem::Note(note) => upsert(&mut self.detail.notes, note, |n| &n.id),
            DetailItem::Activity(activity) => {
                upsert(&mut self.detail.activities, activity, |a| &a.id)
            }
        }
        if !was_toggle {
            self.form = None;
        }
        self.recompute();
    }

    pub fn item_save_failed(&mut self, kind: RelatedKind, item_id: Option<&str>, message: String) {
        if kind == RelatedKind::Task {
            if let Some(previous) = item_id.and_then(|id| self.take_toggle(id)) {
                if let Some(task) = self.detail.tasks.iter_mut().find(|t| t.id == previous.id) {
                    *task = previous;
                }
                self.recompute();
                return;
            }
        }
        if let Some(form) = self.form.as_mut() {
            form.save_failed(message);
        }
    }

    // ---------------------------------------------------------------------
    // Optimistic delete and completion toggle
    // ---------------------------------------------------------------------

    pub fn delete_selected(&mut self) -> Option<Request> {
        let item = self.selected()?.clone();
        remove_item(&mut self.detail, item.kind(), item.id());
        let request = Request::DeleteRelated {
            contact_id: self.detail.contact.id.clone(),
            kind: item.kind(),
            item_id: item.id().to_string(),
        };
        self.pending_deletes.push(item);
        self.recompute();
        Some(request)
    }

    pub fn delete_succeeded(&mut self, kind: RelatedKind, item_id: &str) {
        self.pending_deletes
            .retain(|item| !(item.kind() == kind && item.id() == item_id));
    }

    /// Put the item back.
    pub fn delete_failed(&mut self, kind: RelatedKind, item_id: &str) {
        let Some(position) = self
            .pending_deletes
            .iter()
            .position(|item| item.kind() == kind && item.id() == item_id)
        else {
            return;
        };
        match self.pending_deletes.remove(position) {
            DetailItem::Task(task) => self.detail.tasks.push(task),
            DetailItem::Note(note) => self.detail.notes.push(note),
            DetailItem::Activity(activity) => self.detail.activities.push(activity),
        }
        self.recompute();
    }

    /// Flip the selected task between pending and completed. The request
    /// carries the whole task with only its status changed.
    pub fn toggle_selected_task(&mut self) -> Option<Request> {
        let Some(DetailItem::Task(selected)) = self.selected() else {
            return None;
        };
        let id = selected.id.clone();
        if self.pending_toggles.iter().any(|t| t.id == id) {
            return None;
        }
        let task = self.detail.tasks.iter_mut().find(|t| t.id == id)?;
        let previous = task.clone();
        task.status = toggled(previous.status);
        let draft = TaskDraft::from(&*task);
        self.pending_toggles.push(previous);
        self.recompute();
        Some(Request::SaveTask {
            contact_id: self.detail.contact.id.clone(),
            task_id: Some(id),
            draft,
        })
    }

    fn take_toggle(&mut self, task_id: &str) -> Option<Task> {
        let position = self.pending_toggles.iter().position(|t| t.id == task_id)?;
        Some(self.pending_toggles.remove(position))
    }

    // ---------------------------------------------------------------------
    // Contact field editing
    // ---------------------------------------------------------------------

    pub fn field_cursor(&self) -> usize {
        self.field_cursor
    }

    pub fn current_field(&self) -> ContactField {
        ContactField::ALL[self.field_cursor.min(ContactField::ALL.len() - 1)]
    }

    pub fn field_state(&self, field: ContactField) -> CellState {
        self.field_editor
            .state(&CellRef::new(&self.detail.contact.id, field.key()))
    }

    pub fn is_editing_field(&self) -> bool {
        self.field_editor.is_editing()
    }

    pub fn field_editor_value(&self) -> &str {
        self.field_editor.value()
    }

    pub fn field_editor_cursor(&self) -> usize {
        self.field_editor.visual_cursor()
    }

    pub fn field_editor_message(&self) -> Option<&str> {
        self.field_editor.invalid()
    }

    pub fn begin_field_edit(&mut self) -> Result<(), String> {
        let field = self.current_field();
        if field.is_read_only() {
            return Err(format!("{} cannot be edited", field.title()));
        }
        let current = field.display(&self.detail.contact);
        self.field_editor
            .start(CellRef::new(&self.detail.contact.id, field.key()), &current);
        Ok(())
    }

    pub fn field_edit_key(&mut self, key: crossterm::event::KeyEvent) -> bool {
        self.field_editor.handle_key_event(key)
    }

    pub fn cancel_field_edit(&mut self) {
        self.field_editor.cancel();
    }

    /// Same contract as a table cell commit. The contact is not patched
    /// locally; it is refetched once the update lands.
    pub fn commit_field_edit(&mut self) -> CommitOutcome {
        let Some(target) = self.field_editor.target().cloned() else {
            return CommitOutcome::NotEditing;
        };
        let Some(field) = ContactField::from_key(&target.column_id) else {
            self.field_editor.cancel();
            return CommitOutcome::NotEditing;
        };
        let patch = match field.parse_patch(self.field_editor.value()) {
            Ok(patch) => patch,
            Err(message) => {
                self.field_editor.reject(message.clone());
                return CommitOutcome::Invalid(message);
            }
        };
        let Some(done) = self.field_editor.finish() else {
            return CommitOutcome::NotEditing;
        };
        if done.value == done.original {
            return CommitOutcome::Unchanged;
        }
        self.field_editor.mark_saving(target.clone());
        CommitOutcome::Submitted(TableEvent::UpdateContact {
            id: target.contact_id,
            patch: crate::model::ContactPatch::Fixed(patch),
        })
    }

    pub fn field_saved(&mut self, column_id: &str) {
        let cell = CellRef::new(&self.detail.contact.id, column_id);
        self.field_editor.mark_saved(&cell);
    }

    pub fn field_save_failed(&mut self, column_id: &str, message: String) {
        let cell = CellRef::new(&self.detail.contact.id, column_id);
        self.field_editor.mark_failed(cell, message);
    }
}

fn toggled(status: TaskStatus) -> TaskStatus {
    if status == TaskStatus::Completed {
        TaskStatus::Pending
    } else {
        TaskStatus::Completed
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(position) => items[position] = item,
        None => items.push(item),
    }
}

fn remove_item(detail: &mut ContactDetail, kind: RelatedKind, item_id: &str) {
    match kind {
        RelatedKind::Task => detail.tasks.retain(|t| t.id != item_id),
        RelatedKind::Note => detail.notes.retain(|n| n.id != item_id),
        RelatedKind::Activity => detail.activities.retain(|a| a.id != item_id),
    }
}
