//! Header-to-field mapping for contact CSV files.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::model::ContactField;

/// Substrings that identify a field in a lowercased header, checked in
/// order. Email comes before address so "Email Address" maps to email.
const ALIASES: &[(ContactField, &[&str])] = &[
    (ContactField::Email, &["email", "e-mail"]),
    (ContactField::Phone, &["phone", "mobile", "tel"]),
    (ContactField::Address, &["address", "street"]),
    (ContactField::Suburb, &["suburb", "city"]),
    (ContactField::ContactType, &["type"]),
    (ContactField::LeadSource, &["source"]),
    (ContactField::Status, &["status"]),
    (ContactField::Name, &["name"]),
];

/// Column index for every mapped field.
pub type FieldMap = BTreeMap<usize, ContactField>;

pub fn importable(field: ContactField) -> bool {
    !field.is_read_only()
}

/// Guess a field for each header. A field is claimed by the first header
/// that matches it.
pub fn auto_map(headers: &[String]) -> FieldMap {
    let mut map = FieldMap::new();
    for (index, header) in headers.iter().enumerate() {
        let lowered = header.trim().to_lowercase();
        let guess = ALIASES.iter().find(|(field, needles)| {
            !map.values().any(|taken| taken == field)
                && needles.iter().any(|needle| lowered.contains(needle))
        });
        if let Some((field, _)) = guess {
            map.insert(index, *field);
        }
    }
    map
}

/// Parse a `Header=field` override. The field may be given by key
/// (`leadSource`) or by title (`lead source`); `-` skips the column.
pub fn parse_override(raw: &str) -> Result<(String, Option<ContactField>)> {
    let Some((header, field)) = raw.split_once('=') else {
        bail!("invalid mapping '{}': expected HEADER=FIELD", raw);
    };
    let header = header.trim().to_string();
    let field = field.trim();
    if header.is_empty() {
        bail!("invalid mapping '{}': header is empty", raw);
    }
    if field == "-" {
        return Ok((header, None));
    }
    let resolved = ContactField::from_key(field).or_else(|| {
        ContactField::ALL
            .iter()
            .copied()
            .find(|f| f.title().eq_ignore_ascii_case(field) || f.key().eq_ignore_ascii_case(field))
    });
    match resolved {
        Some(f) if importable(f) => Ok((header, Some(f))),
        Some(f) => bail!("{} cannot be imported", f.key()),
        None => bail!("unknown field '{}' in mapping '{}'", field, raw),
    }
}

/// Apply overrides on top of an automatic mapping. An override moves a
/// field away from whichever header had claimed it.
pub fn apply_overrides(
    headers: &[String],
    mut map: FieldMap,
    overrides: &[(String, Option<ContactField>)],
) -> Result<FieldMap> {
    for (header, field) in overrides {
        let Some(index) = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(header))
        else {
            bail!("no column named '{}' in the file", header);
        };
        match field {
            Some(field) => {
                map.retain(|_, mapped| mapped != field);
                map.insert(index, *field);
            }
            None => {
                map.remove(&index);
            }
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_auto_map_by_substring() {
        let h = headers(&["Full Name", "E-mail", "Mobile Phone", "Contact Type", "Notes"]);
        let map = auto_map(&h);
        assert_eq!(map.get(&0), Some(&ContactField::Name));
        assert_eq!(map.get(&1), Some(&ContactField::Email));
        assert_eq!(map.get(&2), Some(&ContactField::Phone));
        assert_eq!(map.get(&3), Some(&ContactField::ContactType));
        assert_eq!(map.get(&4), None);
    }

    #[test]
    fn test_first_header_claims_field() {
        let h = headers(&["Email Address", "Home Address", "Work email"]);
        let map = auto_map(&h);
        assert_eq!(map.get(&0), Some(&ContactField::Email));
        assert_eq!(map.get(&1), Some(&ContactField::Address));
        assert_eq!(map.get(&2), None);
    }

    #[test]
    fn test_overrides_win() {
        let h = headers(&["Client", "Full Name", "Where"]);
        let map = auto_map(&h);
        let overrides = vec![
            parse_override("client=name").unwrap(),
            parse_override("Where = suburb").unwrap(),
        ];
        let map = apply_overrides(&h, map, &overrides).unwrap();
        assert_eq!(map.get(&0), Some(&ContactField::Name));
        assert_eq!(map.get(&1), None);
        assert_eq!(map.get(&2), Some(&ContactField::Suburb));
    }

    #[test]
    fn test_override_errors() {
        assert!(parse_override("nofield").is_err());
        assert!(parse_override("X=createdAt").is_err());
        assert!(parse_override("X=shoe size").is_err());
        assert_eq!(parse_override("X=-").unwrap(), ("X".to_string(), None));
        assert_eq!(
            parse_override("Src=Lead Source").unwrap().1,
            Some(ContactField::LeadSource)
        );
        let h = headers(&["A"]);
        let overrides = vec![parse_override("B=name").unwrap()];
        assert!(apply_overrides(&h, FieldMap::new(), &overrides).is_err());
    }
}
