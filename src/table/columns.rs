//! Column descriptors for the contact table.

use std::collections::HashMap;

use crate::custom_fields;
use crate::model::{
    Contact, ContactField, ContactPatch, CustomFieldType, CustomPropertyDefinition, CustomValue,
    FixedPatch,
};

pub const SELECT_COLUMN: &str = "select";
pub const NAME_COLUMN: &str = "name";
const CUSTOM_PREFIX: &str = "custom:";

const SELECT_WIDTH: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Leading checkbox column
    Selection,
    /// Contact name; pinned after the checkbox and opens the detail view
    Name,
    Fixed(ContactField),
    Custom {
        definition_id: String,
        field_key: String,
        field_type: CustomFieldType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: String,
    pub title: String,
    pub kind: ColumnKind,
    pub default_width: u16,
    pub min_width: u16,
}

impl ColumnDescriptor {
    fn selection() -> Self {
        Self {
            id: SELECT_COLUMN.to_string(),
            title: String::new(),
            kind: ColumnKind::Selection,
            default_width: SELECT_WIDTH,
            min_width: SELECT_WIDTH,
        }
    }

    fn name(min_width: u16) -> Self {
        Self {
            id: NAME_COLUMN.to_string(),
            title: ContactField::Name.title().to_string(),
            kind: ColumnKind::Name,
            default_width: 24,
            min_width: min_width.max(12),
        }
    }

    fn fixed(field: ContactField, min_width: u16) -> Self {
        let default_width = match field {
            ContactField::Email | ContactField::Address => 28,
            ContactField::CreatedAt | ContactField::UpdatedAt => 17,
            ContactField::ContactType => 12,
            _ => 16,
        };
        Self {
            id: field.key().to_string(),
            title: field.title().to_string(),
            kind: ColumnKind::Fixed(field),
            default_width: default_width.max(min_width),
            min_width,
        }
    }

    fn custom(definition: &CustomPropertyDefinition, min_width: u16) -> Self {
        Self {
            id: custom_column_id(&definition.field_key),
            title: definition.name.to_uppercase(),
            kind: ColumnKind::Custom {
                definition_id: definition.id.clone(),
                field_key: definition.field_key.clone(),
                field_type: definition.field_type,
            },
            default_width: 16u16.max(min_width),
            min_width,
        }
    }

    /// Selection and name stay at the front.
    pub fn is_reorderable(&self) -> bool {
        matches!(self.kind, ColumnKind::Fixed(_) | ColumnKind::Custom { .. })
    }

    pub fn is_resizable(&self) -> bool {
        !matches!(self.kind, ColumnKind::Selection)
    }

    pub fn is_hideable(&self) -> bool {
        self.is_reorderable()
    }

    /// Selection and server timestamps are reserved and never edited.
    pub fn is_editable(&self) -> bool {
        match &self.kind {
            ColumnKind::Selection => false,
            ColumnKind::Name => true,
            ColumnKind::Fixed(field) => !field.is_read_only(),
            ColumnKind::Custom { .. } => true,
        }
    }

    /// Plain text custom columns send an update even when the value did not
    /// change, so that blank cells can be filled in server-side defaults.
    pub fn always_round_trip(&self) -> bool {
        matches!(
            self.kind,
            ColumnKind::Custom {
                field_type: CustomFieldType::Text,
                ..
            }
        )
    }
}

pub fn custom_column_id(field_key: &str) -> String {
    format!("{}{}", CUSTOM_PREFIX, field_key)
}

/// Every column the table can show, plus the custom definitions behind them.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
    definitions: HashMap<String, CustomPropertyDefinition>,
}

impl ColumnSet {
    /// Selection, name, the fixed fields, then one column per active
    /// custom definition.
    pub fn build(definitions: &[CustomPropertyDefinition], min_width: u16) -> Self {
        let mut columns = vec![ColumnDescriptor::selection(), ColumnDescriptor::name(min_width)];
        columns.extend(
            ContactField::ALL
                .iter()
                .filter(|f| **f != ContactField::Name)
                .map(|f| ColumnDescriptor::fixed(*f, min_width)),
        );

        let mut by_key = HashMap::new();
        for definition in definitions.iter().filter(|d| d.is_active) {
            if by_key.contains_key(&definition.field_key) {
                continue;
            }
            columns.push(ColumnDescriptor::custom(definition, min_width));
            by_key.insert(definition.field_key.clone(), definition.clone());
        }

        Self {
            columns,
            definitions: by_key,
        }
    }

    pub fn all(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn definition(&self, field_key: &str) -> Option<&CustomPropertyDefinition> {
        self.definitions.get(field_key)
    }

    pub fn display(&self, column: &ColumnDescriptor, contact: &Contact) -> String {
        match &column.kind {
            ColumnKind::Selection => String::new(),
            ColumnKind::Name => contact.name.clone(),
            ColumnKind::Fixed(field) => field.display(contact),
            ColumnKind::Custom { field_key, .. } => match self.definition(field_key) {
                Some(definition) => {
                    custom_fields::display_value(definition, contact.custom_fields.get(field_key))
                }
                None => String::new(),
            },
        }
    }

    /// Turn edited text into a single-field patch.
    pub fn parse(&self, column: &ColumnDescriptor, input: &str) -> Result<ContactPatch, String> {
        if !column.is_editable() {
            return Err(format!("{} is read-only", column.title));
        }
        match &column.kind {
            ColumnKind::Selection => Err("selection column is not editable".to_string()),
            ColumnKind::Name => ContactField::Name.parse_patch(input).map(ContactPatch::Fixed),
            ColumnKind::Fixed(field) => field.parse_patch(input).map(ContactPatch::Fixed),
            ColumnKind::Custom { field_key, .. } => {
                let definition = self
                    .definition(field_key)
                    .ok_or_else(|| format!("unknown custom field {}", field_key))?;
                custom_fields::parse_value(definition, input).map(|value| ContactPatch::Custom {
                    field_key: field_key.clone(),
                    value,
                })
            }
        }
    }

    /// A patch that would put `contact`'s current value of the column back.
    pub fn snapshot(&self, column: &ColumnDescriptor, contact: &Contact) -> Option<ContactPatch> {
        let fixed = |field: ContactField| -> Option<FixedPatch> {
            Some(match field {
                ContactField::Name => FixedPatch::Name(contact.name.clone()),
                ContactField::Email => FixedPatch::Email(contact.email.clone()),
                ContactField::Phone => FixedPatch::Phone(contact.phone.clone()),
                ContactField::Address => FixedPatch::Address(contact.address.clone()),
                ContactField::Suburb => FixedPatch::Suburb(contact.suburb.clone()),
                ContactField::ContactType => FixedPatch::ContactType(contact.contact_type),
                ContactField::LeadSource => FixedPatch::LeadSource(contact.lead_source.clone()),
                ContactField::Status => FixedPatch::Status(contact.status),
                ContactField::CreatedAt | ContactField::UpdatedAt => return None,
            })
        };
        match &column.kind {
            ColumnKind::Selection => None,
            ColumnKind::Name => fixed(ContactField::Name).map(ContactPatch::Fixed),
            ColumnKind::Fixed(field) => fixed(*field).map(ContactPatch::Fixed),
            ColumnKind::Custom { field_key, .. } => Some(ContactPatch::Custom {
                field_key: field_key.clone(),
                value: contact
                    .custom_fields
                    .get(field_key)
                    .cloned()
                    .unwrap_or(CustomValue::Empty),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    fn definitions() -> Vec<CustomPropertyDefinition> {
        vec![
            CustomPropertyDefinition {
                id: "d1".into(),
                name: "Budget".into(),
                field_key: "budget".into(),
                field_type: CustomFieldType::Text,
                options: Vec::new(),
                is_active: true,
            },
            CustomPropertyDefinition {
                id: "d2".into(),
                name: "Old".into(),
                field_key: "old".into(),
                field_type: CustomFieldType::Text,
                options: Vec::new(),
                is_active: false,
            },
        ]
    }

    #[test]
    fn test_build_orders_fixed_then_custom() {
        let set = ColumnSet::build(&definitions(), 8);
        let ids: Vec<&str> = set.all().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids[0], SELECT_COLUMN);
        assert_eq!(ids[1], NAME_COLUMN);
        assert_eq!(ids.last(), Some(&"custom:budget"));
        assert!(!set.contains("custom:old"));
        assert_eq!(set.all().len(), 2 + 9 + 1);
    }

    #[test]
    fn test_reserved_columns_are_not_editable() {
        let set = ColumnSet::build(&definitions(), 8);
        assert!(!set.get(SELECT_COLUMN).unwrap().is_editable());
        assert!(!set.get("createdAt").unwrap().is_editable());
        assert!(!set.get("updatedAt").unwrap().is_editable());
        assert!(set.get("email").unwrap().is_editable());
        assert!(set.get(NAME_COLUMN).unwrap().is_resizable());
        assert!(!set.get(NAME_COLUMN).unwrap().is_reorderable());
        assert!(!set.get(SELECT_COLUMN).unwrap().is_resizable());
    }

    #[test]
    fn test_only_text_custom_columns_round_trip() {
        let set = ColumnSet::build(&definitions(), 8);
        assert!(set.get("custom:budget").unwrap().always_round_trip());
        assert!(!set.get("email").unwrap().always_round_trip());
    }

    #[test]
    fn test_snapshot_restores_value() {
        let set = ColumnSet::build(&definitions(), 8);
        let mut contact = fixtures::contact("c1", "Ada");
        contact.email = Some("ada@example.com".into());
        let column = set.get("email").unwrap();
        let restore = set.snapshot(column, &contact).unwrap();

        let patch = set.parse(column, "other@example.com").unwrap();
        patch.apply(&mut contact);
        restore.apply(&mut contact);
        assert_eq!(contact.email.as_deref(), Some("ada@example.com"));
    }
}
