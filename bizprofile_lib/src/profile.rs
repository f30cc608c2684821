//! In-memory business profile built from a flat CRM record.

use std::collections::BTreeMap;

use bizprofile_api::RemoteRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProfileConfig;
use crate::field_mapping::FieldMapping;
use crate::mapping::map_remote_to_sections;

/// Field name to value. An absent key means the value was never stored.
pub type FieldValues = serde_json::Map<String, Value>;

/// CRM keys consulted, in order, for the company's lifecycle stage.
const STAGE_SOURCE_KEYS: &[&str] = &["kf_cf_businesslifecyclestage", "department"];

/// Loose spellings seen in CRM data, mapped to canonical stage ids.
const STAGE_ALIASES: &[(&str, &str)] = &[
    ("start", "startup"),
    ("ideation", "startup"),
    ("launch", "growth"),
    ("expansion", "mature"),
    ("large", "enterprise"),
];

const UNTITLED_COMPANY: &str = "Untitled Company";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SectionData {
    #[serde(default)]
    pub fields: FieldValues,
}

impl SectionData {
    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.fields.get(field_name)
    }

    /// Overwrites the given keys and leaves every other key alone.
    pub fn merge(&mut self, values: FieldValues) {
        self.fields.extend(values);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub company_stage: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionData>,
}

impl ProfileData {
    /// Builds a fresh profile from a combined CRM record.
    pub fn from_remote(record: &RemoteRecord, mapping: &FieldMapping, config: &ProfileConfig) -> Self {
        let name = ["kf_tradename", "kf_companyname", "accountName"]
            .iter()
            .find_map(|key| non_empty_str(record, key))
            .unwrap_or(UNTITLED_COMPANY)
            .to_string();

        Self {
            company_stage: resolve_company_stage(record, config),
            name,
            company_type: non_empty_str(record, "industry").map(str::to_string),
            company_size: non_empty_str(record, "kf_businesssize").map(str::to_string),
            account_id: non_empty_str(record, "accountId").map(str::to_string),
            sections: map_remote_to_sections(record, mapping, config),
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionData> {
        self.sections.get(section_id)
    }

    /// Mutable access to a section, creating it empty if it was never stored.
    pub fn section_mut(&mut self, section_id: &str) -> &mut SectionData {
        self.sections.entry(section_id.to_string()).or_default()
    }
}

fn non_empty_str<'a>(record: &'a RemoteRecord, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn normalize_stage(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves the company stage from the raw CRM record.
///
/// The first non-empty source key is normalised and matched against the
/// configured stage ids and labels, then against known aliases. Anything
/// unmatched falls back to the configured default stage.
pub fn resolve_company_stage(record: &RemoteRecord, config: &ProfileConfig) -> String {
    let Some(raw) = STAGE_SOURCE_KEYS.iter().find_map(|k| non_empty_str(record, k)) else {
        return config.default_stage.clone();
    };
    let normalized = normalize_stage(raw);
    if normalized.is_empty() {
        return config.default_stage.clone();
    }

    for stage in &config.company_stages {
        let id = normalize_stage(&stage.id);
        let label = normalize_stage(&stage.label);
        let matches = |candidate: &str| {
            !candidate.is_empty()
                && (normalized.contains(candidate) || candidate.contains(normalized.as_str()))
        };
        if matches(&id) || matches(&label) {
            return stage.id.clone();
        }
    }

    for (needle, stage_id) in STAGE_ALIASES {
        if normalized.contains(needle) && config.is_known_stage(stage_id) {
            return stage_id.to_string();
        }
    }

    tracing::debug!("Unrecognised company stage {:?}; using default", raw);
    config.default_stage.clone()
}
