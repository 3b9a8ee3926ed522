//! Blocking HTTP client for the CRM REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::Backend;
use crate::error::ApiError;
use crate::model::{
    Activity, ActivityDraft, Contact, ContactDetail, ContactDraft, ContactPage, ContactPatch,
    CustomPropertyDefinition, CustomPropertyDraft, ImportSummary, Note, NoteDraft, RelatedKind,
    Task, TaskDraft,
};
use crate::query::ContactQuery;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Error body shapes the API uses: `{ "error": "..." }` or `{ "message": "..." }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("contactdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let response = builder
            .bearer_auth(&self.token)
            .header("X-Request-Id", &request_id)
            .send()?;

        let status = response.status();
        debug!(%request_id, status = status.as_u16(), url = %response.url(), "api response");

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if status.is_client_error() {
            let fallback = status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string();
            let message = response
                .json::<ErrorBody>()
                .ok()
                .and_then(|body| body.error.or(body.message))
                .unwrap_or(fallback);
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        warn!(%request_id, status = status.as_u16(), "api server error");
        Err(ApiError::Server {
            status: status.as_u16(),
        })
    }

    fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.dispatch(builder)?;
        response
            .json::<T>()
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.dispatch(builder).map(|_| ())
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(self.client.post(self.url(path)).json(body))
    }

    fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(self.client.put(self.url(path)).json(body))
    }
}

fn related_path(contact_id: &str, kind: RelatedKind, item_id: Option<&str>) -> String {
    match item_id {
        Some(item_id) => format!("contacts/{}/{}/{}", contact_id, kind.path_segment(), item_id),
        None => format!("contacts/{}/{}", contact_id, kind.path_segment()),
    }
}

impl Backend for HttpBackend {
    fn list_contacts(&self, query: &ContactQuery) -> Result<ContactPage, ApiError> {
        self.send(self.client.get(self.url("contacts")).query(&query.params()))
    }

    fn get_contact(&self, id: &str) -> Result<ContactDetail, ApiError> {
        self.send(self.client.get(self.url(&format!("contacts/{}", id))))
    }

    fn create_contact(&self, draft: &ContactDraft) -> Result<Contact, ApiError> {
        self.post("contacts", draft)
    }

    fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<Contact, ApiError> {
        self.put(&format!("contacts/{}", id), patch)
    }

    fn delete_contacts(&self, ids: &[String]) -> Result<(), ApiError> {
        self.send_empty(
            self.client
                .delete(self.url("contacts"))
                .json(&json!({ "ids": ids })),
        )
    }

    fn import_contacts(&self, drafts: &[ContactDraft]) -> Result<ImportSummary, ApiError> {
        self.post("contacts/bulk", &json!({ "contacts": drafts }))
    }

    fn create_task(&self, contact_id: &str, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.post(&related_path(contact_id, RelatedKind::Task, None), draft)
    }

    fn update_task(&self, contact_id: &str, task_id: &str, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.put(&related_path(contact_id, RelatedKind::Task, Some(task_id)), draft)
    }

    fn create_note(&self, contact_id: &str, draft: &NoteDraft) -> Result<Note, ApiError> {
        self.post(&related_path(contact_id, RelatedKind::Note, None), draft)
    }

    fn update_note(&self, contact_id: &str, note_id: &str, draft: &NoteDraft) -> Result<Note, ApiError> {
        self.put(&related_path(contact_id, RelatedKind::Note, Some(note_id)), draft)
    }

    fn create_activity(&self, contact_id: &str, draft: &ActivityDraft) -> Result<Activity, ApiError> {
        self.post(&related_path(contact_id, RelatedKind::Activity, None), draft)
    }

    fn update_activity(
        &self,
        contact_id: &str,
        activity_id: &str,
        draft: &ActivityDraft,
    ) -> Result<Activity, ApiError> {
        self.put(
            &related_path(contact_id, RelatedKind::Activity, Some(activity_id)),
            draft,
        )
    }

    fn delete_related(&self, contact_id: &str, kind: RelatedKind, item_id: &str) -> Result<(), ApiError> {
        self.send_empty(
            self.client
                .delete(self.url(&related_path(contact_id, kind, Some(item_id)))),
        )
    }

    fn list_custom_properties(&self) -> Result<Vec<CustomPropertyDefinition>, ApiError> {
        self.send(self.client.get(self.url("custom-properties")))
    }

    fn create_custom_property(
        &self,
        draft: &CustomPropertyDraft,
    ) -> Result<CustomPropertyDefinition, ApiError> {
        self.post("custom-properties", draft)
    }

    fn update_custom_property(
        &self,
        id: &str,
        draft: &CustomPropertyDraft,
    ) -> Result<CustomPropertyDefinition, ApiError> {
        self.put(&format!("custom-properties/{}", id), draft)
    }
}
