//! User-defined contact properties: option list maintenance and value
//! conversion between the wire form and what is shown in a cell.

use anyhow::{bail, Result};
use deunicode::deunicode;

use crate::model::{
    format_plain_date, parse_date, CustomFieldType, CustomOption, CustomPropertyDefinition,
    CustomValue,
};

/// Lowercase ASCII slug of the transliterated label: alphanumerics kept,
/// every other run becomes `-`.
pub fn slugify(label: &str) -> String {
    let ascii = deunicode(label);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "option".to_string()
    } else {
        slug
    }
}

fn unique_slug(label: &str, options: &[CustomOption]) -> String {
    let base = slugify(label);
    if !options.iter().any(|o| o.value == base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !options.iter().any(|o| o.value == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Rewrite `sort_order` densely from 0 in the current vector order.
pub fn renumber(options: &mut [CustomOption]) {
    for (index, option) in options.iter_mut().enumerate() {
        option.sort_order = index as u32;
    }
}

/// Put options into `sort_order` order and renumber them.
pub fn normalize_order(options: &mut Vec<CustomOption>) {
    options.sort_by_key(|o| o.sort_order);
    renumber(options);
}

pub fn add_option(options: &mut Vec<CustomOption>, label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        bail!("option label cannot be empty");
    }
    if options.iter().any(|o| o.label.eq_ignore_ascii_case(label)) {
        bail!("option \"{}\" already exists", label);
    }
    normalize_order(options);
    let value = unique_slug(label, options);
    options.push(CustomOption {
        label: label.to_string(),
        value: value.clone(),
        sort_order: options.len() as u32,
        is_active: true,
    });
    Ok(value)
}

/// Move the option at `from` to `to` (positions in sort order).
pub fn move_option(options: &mut Vec<CustomOption>, from: usize, to: usize) -> Result<()> {
    normalize_order(options);
    if from >= options.len() || to >= options.len() {
        bail!(
            "option position out of range (have {} options)",
            options.len()
        );
    }
    let option = options.remove(from);
    options.insert(to, option);
    renumber(options);
    Ok(())
}

pub fn set_option_active(options: &mut [CustomOption], value: &str, active: bool) -> Result<()> {
    let Some(option) = options.iter_mut().find(|o| o.value == value) else {
        bail!("no option with value \"{}\"", value);
    };
    option.is_active = active;
    Ok(())
}

fn active_options(definition: &CustomPropertyDefinition) -> Vec<&CustomOption> {
    let mut options: Vec<&CustomOption> =
        definition.options.iter().filter(|o| o.is_active).collect();
    options.sort_by_key(|o| o.sort_order);
    options
}

fn label_for<'a>(definition: &'a CustomPropertyDefinition, value: &'a str) -> &'a str {
    definition
        .options
        .iter()
        .find(|o| o.value == value)
        .map(|o| o.label.as_str())
        .unwrap_or(value)
}

fn find_option<'a>(definition: &'a CustomPropertyDefinition, input: &str) -> Option<&'a CustomOption> {
    let input = input.trim();
    active_options(definition)
        .into_iter()
        .find(|o| o.label.eq_ignore_ascii_case(input) || o.value == input)
}

/// Text shown in a table cell (and pre-filled into the editor).
pub fn display_value(definition: &CustomPropertyDefinition, value: Option<&CustomValue>) -> String {
    match value {
        None | Some(CustomValue::Empty) => String::new(),
        Some(CustomValue::Text(text)) => match definition.field_type {
            CustomFieldType::Dropdown | CustomFieldType::Multiselect => {
                label_for(definition, text).to_string()
            }
            CustomFieldType::Text | CustomFieldType::Date => text.clone(),
        },
        Some(CustomValue::Many(values)) => values
            .iter()
            .map(|v| label_for(definition, v))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Parse edited text into the value sent to the server.
pub fn parse_value(definition: &CustomPropertyDefinition, input: &str) -> Result<CustomValue, String> {
    let trimmed = input.trim();
    match definition.field_type {
        CustomFieldType::Text => Ok(CustomValue::Text(trimmed.to_string())),
        CustomFieldType::Date => {
            if trimmed.is_empty() {
                return Ok(CustomValue::Empty);
            }
            parse_date(trimmed)
                .map(|date| CustomValue::Text(format_plain_date(date)))
                .ok_or_else(|| format!("\"{}\" is not a date (use YYYY-MM-DD)", trimmed))
        }
        CustomFieldType::Dropdown => {
            if trimmed.is_empty() {
                return Ok(CustomValue::Empty);
            }
            find_option(definition, trimmed)
                .map(|o| CustomValue::Text(o.value.clone()))
                .ok_or_else(|| option_error(definition, trimmed))
        }
        CustomFieldType::Multiselect => {
            let mut values = Vec::new();
            for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let option = find_option(definition, part)
                    .ok_or_else(|| option_error(definition, part))?;
                if !values.contains(&option.value) {
                    values.push(option.value.clone());
                }
            }
            Ok(CustomValue::Many(values))
        }
    }
}

fn option_error(definition: &CustomPropertyDefinition, input: &str) -> String {
    let labels: Vec<&str> = active_options(definition)
        .into_iter()
        .map(|o| o.label.as_str())
        .collect();
    format!(
        "\"{}\" is not an option of {} ({})",
        input,
        definition.name,
        labels.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(field_type: CustomFieldType, labels: &[&str]) -> CustomPropertyDefinition {
        let mut options = Vec::new();
        for label in labels {
            add_option(&mut options, label).unwrap();
        }
        CustomPropertyDefinition {
            id: "def1".into(),
            name: "Areas".into(),
            field_key: "areas".into(),
            field_type,
            options,
            is_active: true,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("North Shore"), "north-shore");
        assert_eq!(slugify("  $1M+ budget!! "), "1m-budget");
        assert_eq!(slugify("???"), "option");
    }

    #[test]
    fn test_slugify_transliterates_labels() {
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("Größe"), "grosse");
        assert_eq!(slugify("Москва"), "moskva");

        let mut options = Vec::new();
        assert_eq!(add_option(&mut options, "Café").unwrap(), "cafe");
        assert_eq!(add_option(&mut options, "Москва").unwrap(), "moskva");
        assert_eq!(add_option(&mut options, "Cafe").unwrap(), "cafe-2");
    }

    #[test]
    fn test_add_option_keeps_slugs_unique() {
        let mut options = Vec::new();
        add_option(&mut options, "Hot lead").unwrap();
        add_option(&mut options, "HOT LEAD").unwrap_err();
        // Different labels, same slug as an existing option.
        let value = add_option(&mut options, "Hot-Lead!").unwrap();
        assert_eq!(value, "hot-lead-2");
        let value = add_option(&mut options, "hot / lead").unwrap();
        assert_eq!(value, "hot-lead-3");
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["hot-lead", "hot-lead-2", "hot-lead-3"]);
    }

    #[test]
    fn test_move_option_renumbers_densely() {
        let mut options = definition(CustomFieldType::Dropdown, &["A", "B", "C", "D"]).options;
        options[3].sort_order = 40;
        move_option(&mut options, 3, 0).unwrap();
        let order: Vec<(&str, u32)> = options
            .iter()
            .map(|o| (o.label.as_str(), o.sort_order))
            .collect();
        assert_eq!(order, [("D", 0), ("A", 1), ("B", 2), ("C", 3)]);
        assert!(move_option(&mut options, 9, 0).is_err());
    }

    #[test]
    fn test_dropdown_parse_and_display() {
        let mut def = definition(CustomFieldType::Dropdown, &["North Shore", "Inner West"]);
        let value = parse_value(&def, "north shore").unwrap();
        assert_eq!(value, CustomValue::Text("north-shore".into()));
        assert_eq!(display_value(&def, Some(&value)), "North Shore");

        set_option_active(&mut def.options, "inner-west", false).unwrap();
        assert!(parse_value(&def, "Inner West").is_err());
        assert_eq!(parse_value(&def, "").unwrap(), CustomValue::Empty);
    }

    #[test]
    fn test_multiselect_parse_dedupes() {
        let def = definition(CustomFieldType::Multiselect, &["Pool", "Garage", "Garden"]);
        let value = parse_value(&def, "garage, Pool ,garage").unwrap();
        assert_eq!(value, CustomValue::Many(vec!["garage".into(), "pool".into()]));
        assert_eq!(display_value(&def, Some(&value)), "Garage, Pool");
        assert!(parse_value(&def, "Pool, Basement").is_err());
    }

    #[test]
    fn test_date_parse() {
        let def = definition(CustomFieldType::Date, &[]);
        assert_eq!(
            parse_value(&def, "2024-07-01").unwrap(),
            CustomValue::Text("2024-07-01".into())
        );
        assert!(parse_value(&def, "01/07/2024").is_err());
    }
}
