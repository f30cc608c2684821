//! Conversion between CRM records and section data, and save-time
//! normalization of edited values.

use std::collections::BTreeMap;

use bizprofile_api::RemoteRecord;
use serde_json::{Number, Value};

use crate::config::{FieldType, GroupConfig, ProfileConfig, SectionConfig};
use crate::field_mapping::FieldMapping;
use crate::profile::{FieldValues, SectionData};
use crate::validation::{FieldError, ValidationErrors};

/// The values of one group, ready to send to the CRM.
pub type NormalizedPatch = FieldValues;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Maps a CRM record onto one section's fields.
///
/// A key present in the record is copied even when its value is `null`;
/// missing keys stay absent. `Date Only` strings keep only the part before
/// the first `T`.
pub fn map_remote_to_section(
    record: &RemoteRecord,
    mapping: &FieldMapping,
    section: Option<&SectionConfig>,
) -> SectionData {
    let Some(section) = section else {
        return SectionData::default();
    };

    let mut data = SectionData::default();
    for field in section.fields() {
        let Some(external) = mapping.external(&field.field_name) else {
            continue;
        };
        let Some(value) = record.get(external) else {
            continue;
        };
        let value = match (field.field_type, value) {
            (FieldType::DateOnly, Value::String(s)) => {
                Value::String(s.split('T').next().unwrap_or_default().to_string())
            }
            _ => value.clone(),
        };
        data.fields.insert(field.field_name.clone(), value);
    }
    data
}

/// Maps a CRM record onto every configured section.
pub fn map_remote_to_sections(
    record: &RemoteRecord,
    mapping: &FieldMapping,
    config: &ProfileConfig,
) -> BTreeMap<String, SectionData> {
    config
        .tabs
        .iter()
        .map(|section| {
            (
                section.id.clone(),
                map_remote_to_section(record, mapping, Some(section)),
            )
        })
        .collect()
}

#[derive(Clone, Copy)]
enum NumberRule {
    Any,
    Whole,
    Percent,
}

/// Converts the group's edited values into the shape the CRM expects.
///
/// Only fields declared in `group` are read. Keys missing from `editing`
/// are left out of the patch. Numeric input that does not parse is
/// reported per field instead of being sent.
pub fn normalize_edit_for_save(
    editing: &FieldValues,
    group: &GroupConfig,
) -> Result<NormalizedPatch, ValidationErrors> {
    let mut patch = NormalizedPatch::new();
    let mut errors = Vec::new();

    for field in &group.fields {
        let Some(value) = editing.get(&field.field_name) else {
            continue;
        };
        match normalize_value(field.field_type, value) {
            Ok(normalized) => {
                patch.insert(field.field_name.clone(), normalized);
            }
            Err(message) => errors.push(FieldError::new(&field.field_name, message)),
        }
    }

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn normalize_value(field_type: FieldType, value: &Value) -> Result<Value, String> {
    match field_type {
        FieldType::WholeNumber => to_number(value, NumberRule::Whole),
        FieldType::Decimal | FieldType::Currency => to_number(value, NumberRule::Any),
        FieldType::Percentage => to_number(value, NumberRule::Percent),
        FieldType::Date | FieldType::DateTime => Ok(match value {
            Value::String(s) if s.trim().is_empty() => Value::Null,
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        }),
        FieldType::Text
        | FieldType::MultilineText
        | FieldType::Select
        | FieldType::MultiSelect
        | FieldType::Url
        | FieldType::DateOnly
        | FieldType::FileUpload
        | FieldType::Table
        | FieldType::Lookup => Ok(value.clone()),
    }
}

fn to_number(value: &Value, rule: NumberRule) -> Result<Value, String> {
    let n = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s.trim()))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{} is out of range", n))?,
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            return Err("expected a number".to_string())
        }
    };

    if !n.is_finite() {
        return Err("must be a finite number".to_string());
    }
    match rule {
        NumberRule::Whole if n.fract() != 0.0 => {
            return Err(format!("{} is not a whole number", n));
        }
        NumberRule::Percent if !(0.0..=100.0).contains(&n) => {
            return Err(format!("{} is outside 0-100", n));
        }
        _ => {}
    }

    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT {
        Ok(Value::from(n as i64))
    } else {
        Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| "must be a finite number".to_string())
    }
}
