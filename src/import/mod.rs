//! Bulk contact import from CSV files.

pub mod mapping;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::model::{ContactDraft, ContactField, ContactStatus, FixedPatch};

pub use mapping::{apply_overrides, auto_map, parse_override, FieldMap};

/// A problem with one data row. Rows count from 1, not counting the
/// header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub headers: Vec<String>,
    pub mapping: FieldMap,
    pub valid: Vec<ContactDraft>,
    pub errors: Vec<RowError>,
    pub rows: usize,
}

impl ImportPlan {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// `header -> field` lines for the user to check the mapping.
    pub fn describe_mapping(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, header)| match self.mapping.get(&index) {
                Some(field) => format!("{} -> {}", header, field.key()),
                None => format!("{} -> (skipped)", header),
            })
            .collect()
    }
}

pub fn read_records<R: Read>(reader: R) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read CSV row {}", index + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

/// Turn one row into a draft, or the list of everything wrong with it.
pub fn validate_row(row: &[String], mapping: &FieldMap) -> Result<ContactDraft, Vec<String>> {
    let mut draft = ContactDraft {
        status: ContactStatus::New,
        ..ContactDraft::default()
    };
    let mut errors = Vec::new();
    let mut has_name = false;

    for (index, field) in mapping {
        let value = row.get(*index).map(String::as_str).unwrap_or("");
        // Blank optional cells keep their defaults; status stays NEW.
        if *field != ContactField::Name && value.trim().is_empty() {
            continue;
        }
        match field.parse_patch(value) {
            Ok(patch) => match patch {
                FixedPatch::Name(v) => {
                    has_name = true;
                    draft.name = v;
                }
                FixedPatch::Email(v) => draft.email = v,
                FixedPatch::Phone(v) => draft.phone = v,
                FixedPatch::Address(v) => draft.address = v,
                FixedPatch::Suburb(v) => draft.suburb = v,
                FixedPatch::ContactType(v) => draft.contact_type = v,
                FixedPatch::LeadSource(v) => draft.lead_source = v,
                FixedPatch::Status(v) => draft.status = v,
            },
            Err(message) => {
                if *field == ContactField::Name {
                    has_name = true;
                }
                errors.push(message);
            }
        }
    }
    if !has_name {
        errors.insert(0, "name is required".to_string());
    }

    if errors.is_empty() {
        Ok(draft)
    } else {
        Err(errors)
    }
}

pub fn plan<R: Read>(reader: R, overrides: &[String]) -> Result<ImportPlan> {
    let (headers, records) = read_records(reader)?;
    let overrides = overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<Vec<_>>>()?;
    let mapping = apply_overrides(&headers, auto_map(&headers), &overrides)?;
    debug!(?mapping, "csv column mapping");

    let mut plan = ImportPlan {
        headers,
        mapping,
        ..ImportPlan::default()
    };
    for (index, record) in records.iter().enumerate() {
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        plan.rows += 1;
        match validate_row(record, &plan.mapping) {
            Ok(draft) => plan.valid.push(draft),
            Err(messages) => plan.errors.extend(messages.into_iter().map(|message| RowError {
                row: index + 1,
                message,
            })),
        }
    }
    Ok(plan)
}

pub fn plan_file(path: &Path, overrides: &[String]) -> Result<ImportPlan> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    plan(file, overrides).with_context(|| format!("failed to import {}", path.display()))
}
