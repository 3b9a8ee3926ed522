//! CRM records as they travel over the wire.
//!
//! Keys are camelCase, enum values SCREAMING_SNAKE_CASE and timestamps
//! RFC 3339, matching the REST API.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Declares a wire enum with its display labels and tolerant parsing.
///
/// Parsing accepts the wire value, the label, or any spelling that matches
/// after uppercasing and folding spaces/dashes into underscores.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal, $label:literal;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn wire(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn parse(input: &str) -> Option<Self> {
                let folded = fold_enum_input(input);
                match folded.as_str() {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Next variant, wrapping around. Used by form pickers.
            pub fn cycle(self, delta: isize) -> Self {
                let all = Self::ALL;
                let index = all.iter().position(|v| *v == self).unwrap_or(0) as isize;
                let len = all.len() as isize;
                all[((index + delta) % len + len) as usize % all.len()]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

fn fold_enum_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

wire_enum!(ContactType {
    Lead => "LEAD", "Lead";
    Buyer => "BUYER", "Buyer";
    Seller => "SELLER", "Seller";
    PastClient => "PAST_CLIENT", "Past client";
});

wire_enum!(ContactStatus {
    New => "NEW", "New";
    Contacted => "CONTACTED", "Contacted";
    Qualified => "QUALIFIED", "Qualified";
    Proposal => "PROPOSAL", "Proposal";
    Negotiation => "NEGOTIATION", "Negotiation";
    ClosedWon => "CLOSED_WON", "Closed won";
    ClosedLost => "CLOSED_LOST", "Closed lost";
});

wire_enum!(TaskPriority {
    Low => "LOW", "Low";
    Medium => "MEDIUM", "Medium";
    High => "HIGH", "High";
    Urgent => "URGENT", "Urgent";
});

wire_enum!(TaskStatus {
    Pending => "PENDING", "Pending";
    InProgress => "IN_PROGRESS", "In progress";
    Completed => "COMPLETED", "Completed";
    Cancelled => "CANCELLED", "Cancelled";
});

wire_enum!(ActivityType {
    Call => "CALL", "Call";
    Email => "EMAIL", "Email";
    WhatsApp => "WHATSAPP", "WhatsApp";
    Meeting => "MEETING", "Meeting";
    Note => "NOTE", "Note";
});

wire_enum!(CustomFieldType {
    Text => "TEXT", "Text";
    Date => "DATE", "Date";
    Dropdown => "DROPDOWN", "Dropdown";
    Multiselect => "MULTISELECT", "Multi-select";
});

impl Default for ContactStatus {
    fn default() -> Self {
        ContactStatus::New
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl Default for ActivityType {
    fn default() -> Self {
        ActivityType::Call
    }
}

fn default_true() -> bool {
    true
}

/// A custom field value: free text, a date/option slug, or several slugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomValue {
    Text(String),
    Many(Vec<String>),
    Empty,
}

impl CustomValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CustomValue::Text(text) => text.is_empty(),
            CustomValue::Many(values) => values.is_empty(),
            CustomValue::Empty => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub contact_type: Option<ContactType>,
    #[serde(default)]
    pub lead_source: Option<String>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, CustomValue>,
}

/// `GET /api/contacts/:id` returns the contact with its related records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetail {
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub contact_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub contact_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub contact_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOption {
    pub label: String,
    pub value: String,
    pub sort_order: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPropertyDefinition {
    pub id: String,
    pub name: String,
    pub field_key: String,
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub options: Vec<CustomOption>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPropertyDraft {
    pub name: String,
    pub field_type: CustomFieldType,
    pub options: Vec<CustomOption>,
}

impl From<&CustomPropertyDefinition> for CustomPropertyDraft {
    fn from(definition: &CustomPropertyDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            field_type: definition.field_type,
            options: definition.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<ContactType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<String>,
    pub status: ContactStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: Option<String>,
}

/// Summary returned by the bulk import endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub created: u64,
}

/// The record collections hanging off a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelatedKind {
    Task,
    Note,
    Activity,
}

impl RelatedKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            RelatedKind::Task => "tasks",
            RelatedKind::Note => "notes",
            RelatedKind::Activity => "activities",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RelatedKind::Task => "TASK",
            RelatedKind::Note => "NOTE",
            RelatedKind::Activity => "ACTIVITY",
        }
    }
}

// =============================================================================
// Fixed contact fields and single-field patches
// =============================================================================

/// The built-in contact attributes shown as table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Address,
    Suburb,
    ContactType,
    LeadSource,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl ContactField {
    pub const ALL: [ContactField; 10] = [
        ContactField::Name,
        ContactField::Email,
        ContactField::Phone,
        ContactField::Address,
        ContactField::Suburb,
        ContactField::ContactType,
        ContactField::LeadSource,
        ContactField::Status,
        ContactField::CreatedAt,
        ContactField::UpdatedAt,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Address => "address",
            ContactField::Suburb => "suburb",
            ContactField::ContactType => "contactType",
            ContactField::LeadSource => "leadSource",
            ContactField::Status => "status",
            ContactField::CreatedAt => "createdAt",
            ContactField::UpdatedAt => "updatedAt",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }

    pub fn title(self) -> &'static str {
        match self {
            ContactField::Name => "NAME",
            ContactField::Email => "EMAIL",
            ContactField::Phone => "PHONE",
            ContactField::Address => "ADDRESS",
            ContactField::Suburb => "SUBURB",
            ContactField::ContactType => "TYPE",
            ContactField::LeadSource => "LEAD SOURCE",
            ContactField::Status => "STATUS",
            ContactField::CreatedAt => "CREATED",
            ContactField::UpdatedAt => "UPDATED",
        }
    }

    /// Server-maintained timestamps are never edited from the client.
    pub fn is_read_only(self) -> bool {
        matches!(self, ContactField::CreatedAt | ContactField::UpdatedAt)
    }

    pub fn display(self, contact: &Contact) -> String {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        match self {
            ContactField::Name => contact.name.clone(),
            ContactField::Email => text(&contact.email),
            ContactField::Phone => text(&contact.phone),
            ContactField::Address => text(&contact.address),
            ContactField::Suburb => text(&contact.suburb),
            ContactField::ContactType => contact
                .contact_type
                .map(|t| t.label().to_string())
                .unwrap_or_default(),
            ContactField::LeadSource => text(&contact.lead_source),
            ContactField::Status => contact.status.label().to_string(),
            ContactField::CreatedAt => format_timestamp(contact.created_at),
            ContactField::UpdatedAt => format_timestamp(contact.updated_at),
        }
    }

    /// Parse edited text into a patch for this field.
    pub fn parse_patch(self, input: &str) -> Result<FixedPatch, String> {
        let trimmed = input.trim();
        let optional = || {
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };
        match self {
            ContactField::Name => {
                if trimmed.is_empty() {
                    Err("name is required".to_string())
                } else {
                    Ok(FixedPatch::Name(trimmed.to_string()))
                }
            }
            ContactField::Email => {
                if !trimmed.is_empty() && !is_valid_email(trimmed) {
                    return Err(format!("\"{}\" is not a valid email address", trimmed));
                }
                Ok(FixedPatch::Email(optional()))
            }
            ContactField::Phone => Ok(FixedPatch::Phone(optional())),
            ContactField::Address => Ok(FixedPatch::Address(optional())),
            ContactField::Suburb => Ok(FixedPatch::Suburb(optional())),
            ContactField::LeadSource => Ok(FixedPatch::LeadSource(optional())),
            ContactField::ContactType => {
                if trimmed.is_empty() {
                    return Ok(FixedPatch::ContactType(None));
                }
                ContactType::parse(trimmed)
                    .map(|t| FixedPatch::ContactType(Some(t)))
                    .ok_or_else(|| enum_error("contact type", trimmed, ContactType::ALL))
            }
            ContactField::Status => ContactStatus::parse(trimmed)
                .map(FixedPatch::Status)
                .ok_or_else(|| enum_error("status", trimmed, ContactStatus::ALL)),
            ContactField::CreatedAt | ContactField::UpdatedAt => {
                Err(format!("{} is read-only", self.title()))
            }
        }
    }
}

fn enum_error<T: fmt::Display>(what: &str, input: &str, all: &[T]) -> String {
    let allowed: Vec<String> = all.iter().map(|v| v.to_string()).collect();
    format!("invalid {} \"{}\" (expected one of: {})", what, input, allowed.join(", "))
}

/// A change to one built-in contact field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedPatch {
    Name(String),
    Email(Option<String>),
    Phone(Option<String>),
    Address(Option<String>),
    Suburb(Option<String>),
    ContactType(Option<ContactType>),
    LeadSource(Option<String>),
    Status(ContactStatus),
}

impl FixedPatch {
    pub fn field(&self) -> ContactField {
        match self {
            FixedPatch::Name(_) => ContactField::Name,
            FixedPatch::Email(_) => ContactField::Email,
            FixedPatch::Phone(_) => ContactField::Phone,
            FixedPatch::Address(_) => ContactField::Address,
            FixedPatch::Suburb(_) => ContactField::Suburb,
            FixedPatch::ContactType(_) => ContactField::ContactType,
            FixedPatch::LeadSource(_) => ContactField::LeadSource,
            FixedPatch::Status(_) => ContactField::Status,
        }
    }
}

/// A partial contact update carrying exactly one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactPatch {
    Fixed(FixedPatch),
    Custom { field_key: String, value: CustomValue },
}

impl ContactPatch {
    /// Column id of the field this patch touches.
    pub fn column_id(&self) -> String {
        match self {
            ContactPatch::Fixed(patch) => patch.field().key().to_string(),
            ContactPatch::Custom { field_key, .. } => format!("custom:{}", field_key),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ContactPatch::Fixed(patch) => {
                let value = match patch {
                    FixedPatch::Name(name) => json!(name),
                    FixedPatch::Email(v)
                    | FixedPatch::Phone(v)
                    | FixedPatch::Address(v)
                    | FixedPatch::Suburb(v)
                    | FixedPatch::LeadSource(v) => json!(v),
                    FixedPatch::ContactType(t) => json!(t),
                    FixedPatch::Status(s) => json!(s),
                };
                let mut map = Map::new();
                map.insert(patch.field().key().to_string(), value);
                Value::Object(map)
            }
            ContactPatch::Custom { field_key, value } => {
                let mut inner = Map::new();
                inner.insert(field_key.clone(), json!(value));
                json!({ "customFields": Value::Object(inner) })
            }
        }
    }

    /// Apply the patch to a local copy (optimistic update).
    pub fn apply(&self, contact: &mut Contact) {
        match self {
            ContactPatch::Fixed(patch) => match patch.clone() {
                FixedPatch::Name(v) => contact.name = v,
                FixedPatch::Email(v) => contact.email = v,
                FixedPatch::Phone(v) => contact.phone = v,
                FixedPatch::Address(v) => contact.address = v,
                FixedPatch::Suburb(v) => contact.suburb = v,
                FixedPatch::ContactType(v) => contact.contact_type = v,
                FixedPatch::LeadSource(v) => contact.lead_source = v,
                FixedPatch::Status(v) => contact.status = v,
            },
            ContactPatch::Custom { field_key, value } => {
                if value.is_empty() {
                    contact.custom_fields.remove(field_key);
                } else {
                    contact
                        .custom_fields
                        .insert(field_key.clone(), value.clone());
                }
            }
        }
    }
}

impl Serialize for ContactPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// Formatting helpers
// =============================================================================

pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).unwrap_or_default()
}

pub fn format_date(ts: OffsetDateTime) -> String {
    ts.date().format(DATE_FORMAT).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input.trim(), DATE_FORMAT).ok()
}

/// Parse a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_day_start(input: &str) -> Option<OffsetDateTime> {
    parse_date(input).map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}

pub fn format_plain_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Loose structural email check: one `@`, non-empty local part, dotted
/// domain, no whitespace.
pub fn is_valid_email(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let mut labels = domain.split('.');
    let first = labels.next().unwrap_or_default();
    let rest: Vec<&str> = labels.collect();
    !first.is_empty() && !rest.is_empty() && rest.iter().all(|label| !label.is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing_is_tolerant() {
        assert_eq!(ContactType::parse("past client"), Some(ContactType::PastClient));
        assert_eq!(ContactType::parse("PAST_CLIENT"), Some(ContactType::PastClient));
        assert_eq!(ContactStatus::parse("Closed-won"), Some(ContactStatus::ClosedWon));
        assert_eq!(TaskStatus::parse("in progress"), Some(TaskStatus::InProgress));
        assert_eq!(ActivityType::parse("WhatsApp"), Some(ActivityType::WhatsApp));
        assert_eq!(ContactStatus::parse("archived"), None);
    }

    #[test]
    fn test_enum_cycle_wraps() {
        assert_eq!(TaskPriority::Urgent.cycle(1), TaskPriority::Low);
        assert_eq!(TaskPriority::Low.cycle(-1), TaskPriority::Urgent);
    }

    #[test]
    fn test_contact_deserializes_from_api_shape() {
        let raw = r#"{
            "id": "c1",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "contactType": "PAST_CLIENT",
            "status": "QUALIFIED",
            "createdAt": "2024-03-01T09:00:00Z",
            "updatedAt": "2024-03-02T10:30:00Z",
            "customFields": { "budget": "500k", "areas": ["north", "east"], "empty": null }
        }"#;
        let contact: Contact = serde_json::from_str(raw).unwrap();
        assert_eq!(contact.contact_type, Some(ContactType::PastClient));
        assert_eq!(contact.status, ContactStatus::Qualified);
        assert_eq!(
            contact.custom_fields.get("areas"),
            Some(&CustomValue::Many(vec!["north".into(), "east".into()]))
        );
        assert_eq!(contact.custom_fields.get("empty"), Some(&CustomValue::Empty));
    }

    #[test]
    fn test_missing_status_defaults_to_new() {
        let raw = r#"{"id":"c1","name":"A","createdAt":"2024-03-01T09:00:00Z","updatedAt":"2024-03-01T09:00:00Z"}"#;
        let contact: Contact = serde_json::from_str(raw).unwrap();
        assert_eq!(contact.status, ContactStatus::New);
    }

    #[test]
    fn test_patch_serializes_single_field() {
        let patch = ContactPatch::Fixed(FixedPatch::Email(Some("a@b.co".into())));
        let json = patch.to_json();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["email"], "a@b.co");

        let custom = ContactPatch::Custom {
            field_key: "budget".into(),
            value: CustomValue::Text("1m".into()),
        };
        assert_eq!(custom.to_json(), json!({ "customFields": { "budget": "1m" } }));
    }

    #[test]
    fn test_parse_patch_validates() {
        assert!(ContactField::Name.parse_patch("  ").is_err());
        assert!(ContactField::Email.parse_patch("nope").is_err());
        assert_eq!(
            ContactField::Email.parse_patch(""),
            Ok(FixedPatch::Email(None))
        );
        assert_eq!(
            ContactField::Status.parse_patch("closed lost"),
            Ok(FixedPatch::Status(ContactStatus::ClosedLost))
        );
        assert!(ContactField::CreatedAt.parse_patch("x").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada @example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada@example..com"));
    }
}
