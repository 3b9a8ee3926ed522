//! CRM REST API access.
//!
//! This module provides:
//! - `Backend` trait, one method per endpoint
//! - `HttpBackend` talking JSON over HTTPS with a bearer token
//! - `Request`/`Response` values so the UI can hand work to the `Dispatcher`
//!   and match completions back up

pub mod dispatch;
pub mod http;
#[cfg(test)]
pub mod memory;

use crate::error::ApiError;
use crate::model::{
    Activity, ActivityDraft, Contact, ContactDetail, ContactDraft, ContactPage, ContactPatch,
    CustomPropertyDefinition, CustomPropertyDraft, ImportSummary, Note, NoteDraft, RelatedKind,
    Task, TaskDraft,
};
use crate::query::ContactQuery;

/// Trait for CRM backends
pub trait Backend: Send + Sync {
    fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, ApiError>;

    /// Fetch one contact with its tasks, notes and activities
    fn get_contact(&self, id: &str) -> Result<ContactDetail, ApiError>;

    fn create_contact(&self, draft: &ContactDraft) -> Result<Contact, ApiError>;

    /// Send a single-field update; returns the server's copy of the contact
    fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<Contact, ApiError>;

    fn delete_contacts(&self, ids: &[String]) -> Result<(), ApiError>;

    /// Create many contacts in one call (CSV import)
    fn import_contacts(&self, drafts: &[ContactDraft]) -> Result<ImportSummary, ApiError>;

    fn create_task(&self, contact_id: &str, draft: &TaskDraft) -> Result<Task, ApiError>;

    fn update_task(&self, contact_id: &str, task_id: &str, draft: &TaskDraft)
        -> Result<Task, ApiError>;

    fn create_note(&self, contact_id: &str, draft: &NoteDraft) -> Result<Note, ApiError>;

    fn update_note(&self, contact_id: &str, note_id: &str, draft: &NoteDraft)
        -> Result<Note, ApiError>;

    fn create_activity(&self, contact_id: &str, draft: &ActivityDraft)
        -> Result<Activity, ApiError>;

    fn update_activity(
        &self,
        contact_id: &str,
        activity_id: &str,
        draft: &ActivityDraft,
    ) -> Result<Activity, ApiError>;

    fn delete_related(&self, contact_id: &str, kind: RelatedKind, item_id: &str)
        -> Result<(), ApiError>;

    fn list_custom_properties(&self) -> Result<Vec<CustomPropertyDefinition>, ApiError>;

    fn create_custom_property(
        &self,
        draft: &CustomPropertyDraft,
    ) -> Result<CustomPropertyDefinition, ApiError>;

    /// Replace a definition; the options list is replaced wholesale
    fn update_custom_property(
        &self,
        id: &str,
        draft: &CustomPropertyDraft,
    ) -> Result<CustomPropertyDefinition, ApiError>;
}

/// A unit of backend work issued by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListContacts(ContactQuery),
    GetContact {
        id: String,
    },
    UpdateContact {
        id: String,
        patch: ContactPatch,
    },
    DeleteContacts {
        ids: Vec<String>,
    },
    SaveTask {
        contact_id: String,
        task_id: Option<String>,
        draft: TaskDraft,
    },
    SaveNote {
        contact_id: String,
        note_id: Option<String>,
        draft: NoteDraft,
    },
    SaveActivity {
        contact_id: String,
        activity_id: Option<String>,
        draft: ActivityDraft,
    },
    DeleteRelated {
        contact_id: String,
        kind: RelatedKind,
        item_id: String,
    },
    ListCustomProperties,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    ContactPage(ContactPage),
    ContactDetail(ContactDetail),
    Contact(Contact),
    Task(Task),
    Note(Note),
    Activity(Activity),
    CustomProperties(Vec<CustomPropertyDefinition>),
    Done,
}

impl Request {
    pub fn execute(&self, backend: &dyn Backend) -> Result<Response, ApiError> {
        match self {
            Request::ListContacts(query) => backend.list_contacts(query).map(Response::ContactPage),
            Request::GetContact { id } => backend.get_contact(id).map(Response::ContactDetail),
            Request::UpdateContact { id, patch } => {
                backend.update_contact(id, patch).map(Response::Contact)
            }
            Request::DeleteContacts { ids } => backend.delete_contacts(ids).map(|_| Response::Done),
            Request::SaveTask {
                contact_id,
                task_id,
                draft,
            } => match task_id {
                Some(task_id) => backend.update_task(contact_id, task_id, draft),
                None => backend.create_task(contact_id, draft),
            }
            .map(Response::Task),
            Request::SaveNote {
                contact_id,
                note_id,
                draft,
            } => match note_id {
                Some(note_id) => backend.update_note(contact_id, note_id, draft),
                None => backend.create_note(contact_id, draft),
            }
            .map(Response::Note),
            Request::SaveActivity {
                contact_id,
                activity_id,
                draft,
            } => match activity_id {
                Some(activity_id) => backend.update_activity(contact_id, activity_id, draft),
                None => backend.create_activity(contact_id, draft),
            }
            .map(Response::Activity),
            Request::DeleteRelated {
                contact_id,
                kind,
                item_id,
            } => backend
                .delete_related(contact_id, *kind, item_id)
                .map(|_| Response::Done),
            Request::ListCustomProperties => backend
                .list_custom_properties()
                .map(Response::CustomProperties),
        }
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Request::ListContacts(query) => format!("list contacts page {}", query.page),
            Request::GetContact { id } => format!("get contact {}", id),
            Request::UpdateContact { id, patch } => {
                format!("update contact {} ({})", id, patch.column_id())
            }
            Request::DeleteContacts { ids } => format!("delete {} contacts", ids.len()),
            Request::SaveTask { task_id, .. } => match task_id {
                Some(id) => format!("update task {}", id),
                None => "create task".to_string(),
            },
            Request::SaveNote { note_id, .. } => match note_id {
                Some(id) => format!("update note {}", id),
                None => "create note".to_string(),
            },
            Request::SaveActivity { activity_id, .. } => match activity_id {
                Some(id) => format!("update activity {}", id),
                None => "create activity".to_string(),
            },
            Request::DeleteRelated { kind, item_id, .. } => {
                format!("delete {} {}", kind.path_segment(), item_id)
            }
            Request::ListCustomProperties => "list custom properties".to_string(),
        }
    }

    /// True for requests that change contact rows and so stale cached pages.
    pub fn mutates_contacts(&self) -> bool {
        matches!(
            self,
            Request::UpdateContact { .. } | Request::DeleteContacts { .. }
        )
    }
}
