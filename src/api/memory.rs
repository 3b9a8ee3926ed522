//! In-memory backend used by tests.

use std::sync::Mutex;

use time::OffsetDateTime;

use crate::api::Backend;
use crate::error::ApiError;
use crate::model::{
    fixtures, Activity, ActivityDraft, Contact, ContactDetail, ContactDraft, ContactPage,
    ContactPatch, CustomPropertyDefinition, CustomPropertyDraft, ImportSummary, Note, NoteDraft,
    Pagination, RelatedKind, Task, TaskDraft,
};
use crate::query::ContactQuery;

#[derive(Default)]
struct State {
    contacts: Vec<Contact>,
    tasks: Vec<Task>,
    notes: Vec<Note>,
    activities: Vec<Activity>,
    properties: Vec<CustomPropertyDefinition>,
    next_id: u64,
    fail_next: Option<ApiError>,
    calls: Vec<String>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn begin(&mut self, call: String) -> Result<(), ApiError> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

fn not_found(what: &str) -> ApiError {
    ApiError::Rejected {
        status: 404,
        message: format!("{} not found", what),
    }
}

impl MemoryBackend {
    /// Contacts `c0..c{n-1}` named "Contact 000", "Contact 001", …
    pub fn with_contacts(n: usize) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.contacts = (0..n)
                .map(|i| fixtures::contact(&format!("c{}", i), &format!("Contact {:03}", i)))
                .collect();
        }
        backend
    }

    pub fn fail_next(&self, err: ApiError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    pub fn contact(&self, id: &str) -> Option<Contact> {
        let state = self.state.lock().unwrap();
        state.contacts.iter().find(|c| c.id == id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn add_task(&self, task: Task) {
        self.state.lock().unwrap().tasks.push(task);
    }
}

impl Backend for MemoryBackend {
    fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("GET contacts page={} limit={}", query.page, query.limit))?;
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let matching: Vec<&Contact> = state
            .contacts
            .iter()
            .filter(|c| {
                needle.as_ref().map_or(true, |n| {
                    c.name.to_lowercase().contains(n)
                        || c.email.as_deref().unwrap_or("").to_lowercase().contains(n)
                })
            })
            .filter(|c| query.status.map_or(true, |s| c.status == s))
            .filter(|c| query.contact_type.map_or(true, |t| c.contact_type == Some(t)))
            .collect();
        let limit = query.limit.max(1) as usize;
        let total = matching.len();
        let total_pages = total.div_ceil(limit) as u32;
        let start = (query.page.max(1) as usize - 1) * limit;
        let contacts = matching.into_iter().skip(start).take(limit).cloned().collect();
        Ok(ContactPage {
            contacts,
            pagination: Pagination {
                total: total as u64,
                total_pages,
            },
        })
    }

    fn get_contact(&self, id: &str) -> Result<ContactDetail, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("GET contacts/{}", id))?;
        let contact = state
            .contacts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| not_found("contact"))?;
        Ok(ContactDetail {
            contact,
            tasks: state.tasks.iter().filter(|t| t.contact_id == id).cloned().collect(),
            notes: state.notes.iter().filter(|n| n.contact_id == id).cloned().collect(),
            activities: state
                .activities
                .iter()
                .filter(|a| a.contact_id == id)
                .cloned()
                .collect(),
        })
    }

    fn create_contact(&self, draft: &ContactDraft) -> Result<Contact, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin("POST contacts".to_string())?;
        let id = state.id("c");
        let mut contact = fixtures::contact(&id, &draft.name);
        contact.email = draft.email.clone();
        contact.phone = draft.phone.clone();
        contact.status = draft.status;
        contact.contact_type = draft.contact_type;
        state.contacts.push(contact.clone());
        Ok(contact)
    }

    fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<Contact, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("PUT contacts/{} {}", id, patch.to_json()))?;
        let contact = state
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("contact"))?;
        patch.apply(contact);
        contact.updated_at = OffsetDateTime::now_utc();
        Ok(contact.clone())
    }

    fn delete_contacts(&self, ids: &[String]) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("DELETE contacts {:?}", ids))?;
        state.contacts.retain(|c| !ids.contains(&c.id));
        state.tasks.retain(|t| !ids.contains(&t.contact_id));
        state.notes.retain(|n| !ids.contains(&n.contact_id));
        state.activities.retain(|a| !ids.contains(&a.contact_id));
        Ok(())
    }

    fn import_contacts(&self, drafts: &[ContactDraft]) -> Result<ImportSummary, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("POST contacts/bulk n={}", drafts.len()))?;
        for draft in drafts {
            let id = state.id("c");
            let mut contact = fixtures::contact(&id, &draft.name);
            contact.email = draft.email.clone();
            contact.status = draft.status;
            state.contacts.push(contact);
        }
        Ok(ImportSummary {
            created: drafts.len() as u64,
        })
    }

    fn create_task(&self, contact_id: &str, draft: &TaskDraft) -> Result<Task, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("POST contacts/{}/tasks", contact_id))?;
        let id = state.id("t");
        let mut task = fixtures::task(&id, contact_id, &draft.title, OffsetDateTime::now_utc());
        task.description = draft.description.clone();
        task.priority = draft.priority;
        task.status = draft.status;
        task.due_date = draft.due_date;
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn update_task(&self, contact_id: &str, task_id: &str, draft: &TaskDraft) -> Result<Task, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!(
            "PUT contacts/{}/tasks/{} {}",
            contact_id,
            task_id,
            serde_json::to_string(draft).unwrap_or_default()
        ))?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("task"))?;
        task.title = draft.title.clone();
        task.description = draft.description.clone();
        task.priority = draft.priority;
        task.status = draft.status;
        task.due_date = draft.due_date;
        Ok(task.clone())
    }

    fn create_note(&self, contact_id: &str, draft: &NoteDraft) -> Result<Note, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("POST contacts/{}/notes", contact_id))?;
        let id = state.id("n");
        let note = fixtures::note(&id, contact_id, &draft.content, OffsetDateTime::now_utc());
        state.notes.push(note.clone());
        Ok(note)
    }

    fn update_note(&self, contact_id: &str, note_id: &str, draft: &NoteDraft) -> Result<Note, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("PUT contacts/{}/notes/{}", contact_id, note_id))?;
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| not_found("note"))?;
        note.content = draft.content.clone();
        Ok(note.clone())
    }

    fn create_activity(&self, contact_id: &str, draft: &ActivityDraft) -> Result<Activity, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("POST contacts/{}/activities", contact_id))?;
        let id = state.id("a");
        let mut activity =
            fixtures::activity(&id, contact_id, draft.activity_type, OffsetDateTime::now_utc());
        activity.description = draft.description.clone();
        state.activities.push(activity.clone());
        Ok(activity)
    }

    fn update_activity(
        &self,
        contact_id: &str,
        activity_id: &str,
        draft: &ActivityDraft,
    ) -> Result<Activity, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("PUT contacts/{}/activities/{}", contact_id, activity_id))?;
        let activity = state
            .activities
            .iter_mut()
            .find(|a| a.id == activity_id)
            .ok_or_else(|| not_found("activity"))?;
        activity.activity_type = draft.activity_type;
        activity.description = draft.description.clone();
        Ok(activity.clone())
    }

    fn delete_related(&self, contact_id: &str, kind: RelatedKind, item_id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!(
            "DELETE contacts/{}/{}/{}",
            contact_id,
            kind.path_segment(),
            item_id
        ))?;
        match kind {
            RelatedKind::Task => state.tasks.retain(|t| t.id != item_id),
            RelatedKind::Note => state.notes.retain(|n| n.id != item_id),
            RelatedKind::Activity => state.activities.retain(|a| a.id != item_id),
        }
        Ok(())
    }

    fn list_custom_properties(&self) -> Result<Vec<CustomPropertyDefinition>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin("GET custom-properties".to_string())?;
        Ok(state.properties.clone())
    }

    fn create_custom_property(
        &self,
        draft: &CustomPropertyDraft,
    ) -> Result<CustomPropertyDefinition, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin("POST custom-properties".to_string())?;
        let id = state.id("p");
        let definition = CustomPropertyDefinition {
            id,
            name: draft.name.clone(),
            field_key: crate::custom_fields::slugify(&draft.name).replace('-', "_"),
            field_type: draft.field_type,
            options: draft.options.clone(),
            is_active: true,
        };
        state.properties.push(definition.clone());
        Ok(definition)
    }

    fn update_custom_property(
        &self,
        id: &str,
        draft: &CustomPropertyDraft,
    ) -> Result<CustomPropertyDefinition, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.begin(format!("PUT custom-properties/{}", id))?;
        let definition = state
            .properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("custom property"))?;
        definition.name = draft.name.clone();
        definition.options = draft.options.clone();
        Ok(definition.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PageController;

    #[test]
    fn test_second_page_of_120_holds_remaining_20() {
        let backend = MemoryBackend::with_contacts(120);
        let mut pager = PageController::new(100);

        let first = backend.list_contacts(&pager.query()).unwrap();
        pager.apply_counts(first.pagination.total, first.pagination.total_pages);
        assert_eq!(first.contacts.len(), 100);
        assert!(pager.has_next());

        assert!(pager.next_page());
        let second = backend.list_contacts(&pager.query()).unwrap();
        pager.apply_counts(second.pagination.total, second.pagination.total_pages);
        assert_eq!(second.contacts.len(), 20);
        assert_eq!(second.contacts[0].name, "Contact 100");
        assert!(!pager.has_next());
    }

    #[test]
    fn test_search_change_requeries_first_page() {
        let backend = MemoryBackend::with_contacts(30);
        let mut pager = PageController::new(10);
        pager.apply_counts(30, 3);
        pager.go_to(3);

        assert!(pager.set_search("contact 02"));
        let page = backend.list_contacts(&pager.query()).unwrap();
        assert_eq!(pager.page(), 1);
        assert_eq!(page.contacts.len(), 10);
        assert!(page.contacts.iter().all(|c| c.name.starts_with("Contact 02")));
        assert_eq!(
            backend.calls().last().map(String::as_str),
            Some("GET contacts page=1 limit=10")
        );
    }
}
