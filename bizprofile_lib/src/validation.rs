use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::config::{suggest, FieldConfig, FieldType, GroupConfig, ProfileConfig};
use crate::error::ProfileError;
use crate::profile::FieldValues;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// A problem with one edited field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Every field-level problem found in one edit.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("invalid field values: {}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, ProfileError> {
    if input.len() > max_len {
        return Err(ProfileError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(ProfileError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a user email: one `@`, non-empty local part, dotted domain.
pub fn validate_email(input: &str) -> Result<String, ProfileError> {
    let email = sanitize_text(input, MAX_EMAIL_LENGTH)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(' ')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(ProfileError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        )))
    }
}

/// Validate an opaque identifier such as an Azure object id or account id.
/// Letters, digits, `-` and `_` only.
pub fn validate_identifier(input: &str) -> Result<String, ProfileError> {
    let id = sanitize_text(input, MAX_IDENTIFIER_LENGTH)?;
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(id)
    } else {
        Err(ProfileError::InvalidInput(format!(
            "identifier '{}' contains invalid characters (allowed: letters, digits, '-', '_')",
            id
        )))
    }
}

/// Validate a section id against the configuration. Section ids are
/// case-sensitive; a case-insensitive match is accepted and returned in its
/// configured spelling.
pub fn validate_section_id(input: &str, config: &ProfileConfig) -> Result<String, ProfileError> {
    let trimmed = input.trim();
    if let Some(section) = config
        .tabs
        .iter()
        .find(|s| s.id == trimmed)
        .or_else(|| config.tabs.iter().find(|s| s.id.eq_ignore_ascii_case(trimmed)))
    {
        return Ok(section.id.clone());
    }
    let ids: Vec<&str> = config.tabs.iter().map(|s| s.id.as_str()).collect();
    let hint = suggest(trimmed, ids.iter().copied())
        .map(|s| format!(" Did you mean '{}'?", s))
        .unwrap_or_default();
    Err(ProfileError::InvalidInput(format!(
        "unknown section '{}'.{} Valid sections: {}",
        trimmed,
        hint,
        ids.join(", ")
    )))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn parse_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

fn parse_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").is_ok()
}

fn check_field(field: &FieldConfig, value: &Value) -> Option<String> {
    match field.field_type {
        FieldType::Select => match value {
            Value::String(s) if field.options.is_empty() || field.has_option(s) => None,
            Value::String(s) => Some(format!("'{}' is not a valid option", s)),
            _ => Some("expected a single option".to_string()),
        },
        FieldType::MultiSelect => match value {
            Value::Array(items) => {
                let invalid: Vec<String> = items
                    .iter()
                    .filter(|item| match item {
                        Value::String(s) => !field.options.is_empty() && !field.has_option(s),
                        _ => true,
                    })
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                if invalid.is_empty() {
                    None
                } else {
                    Some(format!("invalid options: {}", invalid.join(", ")))
                }
            }
            _ => Some("expected a list of options".to_string()),
        },
        FieldType::DateOnly | FieldType::Date => match value {
            Value::String(s) if parse_date(s.trim()) => None,
            Value::String(s) => Some(format!("'{}' is not a valid date", s)),
            _ => Some("expected a date string".to_string()),
        },
        FieldType::DateTime => match value {
            Value::String(s) if parse_date_time(s.trim()) => None,
            Value::String(s) => Some(format!("'{}' is not a valid date and time", s)),
            _ => Some("expected a date-time string".to_string()),
        },
        FieldType::Text
        | FieldType::MultilineText
        | FieldType::WholeNumber
        | FieldType::Decimal
        | FieldType::Percentage
        | FieldType::Currency
        | FieldType::Url
        | FieldType::FileUpload
        | FieldType::Table
        | FieldType::Lookup => None,
    }
}

/// Checks option membership and date formats for the group's edited
/// fields. Empty values are not checked; numeric checks happen during
/// normalization.
pub fn validate_group_edit(editing: &FieldValues, group: &GroupConfig) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = group
        .fields
        .iter()
        .filter_map(|field| {
            let value = editing.get(&field.field_name)?;
            if is_empty_value(value) {
                return None;
            }
            check_field(field, value).map(|msg| FieldError::new(&field.field_name, msg))
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
