//! The task / note / activity popup form.

use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::api::Request;
use crate::model::{
    format_plain_date, parse_day_start, Activity, ActivityDraft, ActivityType, Note, NoteDraft,
    RelatedKind, Task, TaskDraft, TaskPriority, TaskStatus,
};

/// Cells moved per arrow press while the popup is in move mode.
const MOVE_STEP: u16 = 2;

#[derive(Debug, Clone)]
pub enum FormField {
    Text {
        label: &'static str,
        input: Input,
        required: bool,
    },
    Choice {
        label: &'static str,
        options: Vec<&'static str>,
        index: usize,
    },
}

impl FormField {
    fn text(label: &'static str, value: &str, required: bool) -> Self {
        FormField::Text {
            label,
            input: Input::new(value.to_string()),
            required,
        }
    }

    fn choice(label: &'static str, options: Vec<&'static str>, index: usize) -> Self {
        FormField::Choice {
            label,
            options,
            index,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Text { label, .. } | FormField::Choice { label, .. } => label,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            FormField::Text { input, .. } => input.value(),
            FormField::Choice { options, index, .. } => options.get(*index).copied().unwrap_or(""),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, FormField::Choice { .. })
    }

    pub fn visual_cursor(&self) -> usize {
        match self {
            FormField::Text { input, .. } => input.visual_cursor(),
            FormField::Choice { .. } => 0,
        }
    }
}

fn labels<T: Copy>(all: &[T], label: fn(T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(|v| label(*v)).collect()
}

fn position<T: PartialEq>(all: &[T], value: &T) -> usize {
    all.iter().position(|v| v == value).unwrap_or(0)
}

#[derive(Debug)]
pub struct ItemForm {
    kind: RelatedKind,
    item_id: Option<String>,
    fields: Vec<FormField>,
    focus: usize,
    moving: bool,
    saving: bool,
    error: Option<String>,
    pub popup: PopupState,
}

impl ItemForm {
    fn build(kind: RelatedKind, item_id: Option<String>, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            item_id,
            fields,
            focus: 0,
            moving: false,
            saving: false,
            error: None,
            popup: PopupState::default(),
        }
    }

    pub fn new(kind: RelatedKind) -> Self {
        match kind {
            RelatedKind::Task => Self::task(None),
            RelatedKind::Note => Self::note(None),
            RelatedKind::Activity => Self::activity(None),
        }
    }

    pub fn task(task: Option<&Task>) -> Self {
        let draft = task.map(TaskDraft::from).unwrap_or_default();
        let due = draft
            .due_date
            .map(|ts| format_plain_date(ts.date()))
            .unwrap_or_default();
        Self::build(
            RelatedKind::Task,
            task.map(|t| t.id.clone()),
            vec![
                FormField::text("Title", &draft.title, true),
                FormField::text(
                    "Description",
                    draft.description.as_deref().unwrap_or(""),
                    false,
                ),
                FormField::choice(
                    "Priority",
                    labels(TaskPriority::ALL, TaskPriority::label),
                    position(TaskPriority::ALL, &draft.priority),
                ),
                FormField::choice(
                    "Status",
                    labels(TaskStatus::ALL, TaskStatus::label),
                    position(TaskStatus::ALL, &draft.status),
                ),
                FormField::text("Due (YYYY-MM-DD)", &due, false),
            ],
        )
    }

    pub fn note(note: Option<&Note>) -> Self {
        Self::build(
            RelatedKind::Note,
            note.map(|n| n.id.clone()),
            vec![FormField::text(
                "Content",
                note.map(|n| n.content.as_str()).unwrap_or(""),
                true,
            )],
        )
    }

    pub fn activity(activity: Option<&Activity>) -> Self {
        let kind = activity.map(|a| a.activity_type).unwrap_or_default();
        Self::build(
            RelatedKind::Activity,
            activity.map(|a| a.id.clone()),
            vec![
                FormField::choice(
                    "Type",
                    labels(ActivityType::ALL, ActivityType::label),
                    position(ActivityType::ALL, &kind),
                ),
                FormField::text(
                    "Description",
                    activity
                        .and_then(|a| a.description.as_deref())
                        .unwrap_or(""),
                    false,
                ),
            ],
        )
    }

    pub fn kind(&self) -> RelatedKind {
        self.kind
    }

    pub fn is_new(&self) -> bool {
        self.item_id.is_none()
    }

    pub fn title(&self) -> String {
        let verb = if self.is_new() { "NEW" } else { "EDIT" };
        format!("{} {}", verb, self.kind.title().to_uppercase())
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn toggle_moving(&mut self) {
        self.moving = !self.moving;
    }

    /// Arrow keys in move mode nudge the popup instead of the focus.
    pub fn nudge(&mut self, dx: i32, dy: i32) {
        let step = i32::from(MOVE_STEP);
        self.popup.move_by(dx.signum() * step, dy.signum() * step);
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Step the focused choice field. Returns false for text fields.
    pub fn cycle_choice(&mut self, delta: isize) -> bool {
        match self.fields.get_mut(self.focus) {
            Some(FormField::Choice { options, index, .. }) if !options.is_empty() => {
                let len = options.len() as isize;
                *index = ((*index as isize + delta) % len + len) as usize % options.len();
                true
            }
            _ => false,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if self.saving {
            return false;
        }
        match self.fields.get_mut(self.focus) {
            Some(FormField::Text { input, .. }) => {
                let changed = input.handle_event(&Event::Key(key)).is_some();
                if changed {
                    self.error = None;
                }
                changed
            }
            _ => false,
        }
    }

    fn text(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value().trim()).unwrap_or("")
    }

    fn choice(&self, index: usize) -> usize {
        match self.fields.get(index) {
            Some(FormField::Choice { index, .. }) => *index,
            _ => 0,
        }
    }

    fn optional(&self, index: usize) -> Option<String> {
        let value = self.text(index);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn check_required(&self) -> Result<(), String> {
        for field in &self.fields {
            if let FormField::Text {
                label,
                input,
                required: true,
            } = field
            {
                if input.value().trim().is_empty() {
                    return Err(format!("{} is required", label));
                }
            }
        }
        Ok(())
    }

    /// Validate and build the create/update request.
    pub fn to_request(&self, contact_id: &str) -> Result<Request, String> {
        self.check_required()?;
        let contact_id = contact_id.to_string();
        let item_id = self.item_id.clone();
        match self.kind {
            RelatedKind::Task => {
                let due = self.text(4);
                let due_date = if due.is_empty() {
                    None
                } else {
                    Some(
                        parse_day_start(due)
                            .ok_or_else(|| format!("\"{}\" is not a date (use YYYY-MM-DD)", due))?,
                    )
                };
                let draft = TaskDraft {
                    title: self.text(0).to_string(),
                    description: self.optional(1),
                    priority: TaskPriority::ALL[self.choice(2)],
                    status: TaskStatus::ALL[self.choice(3)],
                    due_date,
                };
                Ok(Request::SaveTask {
                    contact_id,
                    task_id: item_id,
                    draft,
                })
            }
            RelatedKind::Note => Ok(Request::SaveNote {
                contact_id,
                note_id: item_id,
                draft: NoteDraft {
                    content: self.text(0).to_string(),
                },
            }),
            RelatedKind::Activity => Ok(Request::SaveActivity {
                contact_id,
                activity_id: item_id,
                draft: ActivityDraft {
                    activity_type: ActivityType::ALL[self.choice(0)],
                    description: self.optional(1),
                },
            }),
        }
    }

    /// Validate and enter the pending state.
    pub fn submit(&mut self, contact_id: &str) -> Option<Request> {
        if self.saving {
            return None;
        }
        match self.to_request(contact_id) {
            Ok(request) => {
                self.saving = true;
                self.error = None;
                Some(request)
            }
            Err(message) => {
                self.error = Some(message);
                None
            }
        }
    }

    pub fn save_failed(&mut self, message: String) {
        self.saving = false;
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crossterm::event::{KeyCode, KeyModifiers};
    use time::macros::datetime;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_new_task_requires_title() {
        let mut form = ItemForm::new(RelatedKind::Task);
        assert!(form.submit("c1").is_none());
        assert_eq!(form.error(), Some("Title is required"));
        assert!(!form.is_saving());

        for c in "Call back".chars() {
            form.handle_key_event(key(KeyCode::Char(c)));
        }
        match form.submit("c1") {
            Some(Request::SaveTask {
                contact_id,
                task_id,
                draft,
            }) => {
                assert_eq!(contact_id, "c1");
                assert_eq!(task_id, None);
                assert_eq!(draft.title, "Call back");
                assert_eq!(draft.priority, TaskPriority::Medium);
                assert_eq!(draft.status, TaskStatus::Pending);
            }
            other => panic!("unexpected request: {:?}", other),
        }
        assert!(form.is_saving());
        assert!(form.submit("c1").is_none());
    }

    #[test]
    fn test_edit_task_prefills_fields() {
        let mut task = fixtures::task("t1", "c1", "Send docs", datetime!(2024-05-01 10:00 UTC));
        task.priority = TaskPriority::Urgent;
        task.due_date = Some(datetime!(2024-06-02 00:00 UTC));
        let form = ItemForm::task(Some(&task));
        assert!(!form.is_new());
        assert_eq!(form.title(), "EDIT TASK");
        assert_eq!(form.fields()[0].value(), "Send docs");
        assert_eq!(form.fields()[2].value(), "Urgent");
        assert_eq!(form.fields()[4].value(), "2024-06-02");
    }

    #[test]
    fn test_bad_due_date_is_rejected() {
        let task = fixtures::task("t1", "c1", "Send docs", datetime!(2024-05-01 10:00 UTC));
        let mut form = ItemForm::task(Some(&task));
        form.focus = 4;
        for c in "soon".chars() {
            form.handle_key_event(key(KeyCode::Char(c)));
        }
        assert!(form.submit("c1").is_none());
        assert!(form.error().unwrap().contains("not a date"));
    }

    #[test]
    fn test_activity_choice_cycles() {
        let mut form = ItemForm::new(RelatedKind::Activity);
        assert!(form.cycle_choice(1));
        assert!(form.cycle_choice(-2));
        match form.to_request("c1").unwrap() {
            Request::SaveActivity { draft, .. } => {
                assert_eq!(draft.activity_type, ActivityType::Note);
            }
            other => panic!("unexpected request: {:?}", other),
        }
        form.focus_next();
        assert!(!form.cycle_choice(1));
    }

    #[test]
    fn test_move_mode_nudges_popup() {
        use ratatui::backend::TestBackend;
        use ratatui::text::Text;
        use ratatui::Terminal;
        use tui_widgets::popup::Popup;

        let mut form = ItemForm::new(RelatedKind::Note);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| {
                let popup = Popup::new(Text::from("Content: call back"));
                frame.render_stateful_widget_ref(popup, frame.area(), &mut form.popup);
            })
            .unwrap();
        let before = form.popup.area().unwrap();

        form.toggle_moving();
        assert!(form.is_moving());
        form.nudge(1, -1);
        let after = form.popup.area().unwrap();
        assert_eq!(after.x, before.x + MOVE_STEP);
        assert_eq!(after.y, before.y - MOVE_STEP);
        assert_eq!((after.width, after.height), (before.width, before.height));

        form.nudge(-1, 1);
        assert_eq!(form.popup.area().unwrap(), before);
    }
}
