//! Internal field name to CRM field id mapping.
//!
//! Loaded from `seed_data/field_mapping.yml`. The mapping is one-to-one: two
//! internal names pointing at the same CRM id is a load error. An empty CRM id
//! marks a field that has no CRM column yet.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::config::{read_seed_file, ConfigError, ProfileConfig};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MappingFile {
    api_field_mapping: BTreeMap<String, String>,
}

/// Bidirectional internal/external field name table.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
    unmapped: Vec<String>,
}

impl FieldMapping {
    /// Builds the table from `(internal, external)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut mapping = FieldMapping::default();
        for (internal, external) in pairs {
            let internal = internal.into();
            let external = external.into().trim().to_string();
            if external.is_empty() {
                tracing::warn!("Field {} has no CRM mapping; skipping", internal);
                mapping.unmapped.push(internal);
                continue;
            }
            if let Some(first) = mapping.reverse.get(&external) {
                return Err(ConfigError::DuplicateExternalId {
                    external,
                    first: first.clone(),
                    second: internal,
                });
            }
            mapping.reverse.insert(external.clone(), internal.clone());
            mapping.forward.insert(internal, external);
        }
        mapping.unmapped.sort();
        Ok(mapping)
    }

    /// CRM field id for an internal field name.
    pub fn external(&self, internal: &str) -> Option<&str> {
        self.forward.get(internal).map(String::as_str)
    }

    /// Internal field name for a CRM field id.
    pub fn internal(&self, external: &str) -> Option<&str> {
        self.reverse.get(external).map(String::as_str)
    }

    /// Internal names listed with an empty CRM id.
    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Warnings for configured fields that have no CRM column.
    pub fn warnings_for(&self, config: &ProfileConfig) -> Vec<String> {
        config
            .all_fields()
            .filter(|(_, _, f)| self.external(&f.field_name).is_none())
            .map(|(s, _, f)| {
                format!(
                    "Field {} in section {} has no CRM mapping",
                    f.field_name, s.id
                )
            })
            .collect()
    }
}

pub fn parse_field_mapping(yaml_content: &str) -> Result<FieldMapping, ConfigError> {
    let file: MappingFile = serde_yml::from_str(yaml_content)?;
    FieldMapping::from_pairs(file.api_field_mapping)
}

/// Loads the field mapping compiled into the binary.
pub fn load_field_mapping() -> Result<FieldMapping, ConfigError> {
    let yaml_content = include_str!("../../seed_data/field_mapping.yml");
    parse_field_mapping(yaml_content)
}

pub fn load_field_mapping_from(path: &Path) -> Result<FieldMapping, ConfigError> {
    parse_field_mapping(&read_seed_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_profile_config;

    #[test]
    fn test_forward_and_reverse() {
        let mapping =
            FieldMapping::from_pairs([("founderName", "fullname"), ("revenue", "revenue")])
                .unwrap();
        assert_eq!(mapping.external("founderName"), Some("fullname"));
        assert_eq!(mapping.internal("fullname"), Some("founderName"));
        assert_eq!(mapping.internal("revenue"), Some("revenue"));
        assert_eq!(mapping.external("missing"), None);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_duplicate_external_id_is_error() {
        let err = FieldMapping::from_pairs([
            ("registrationNumber", "kf_registrationnumber"),
            ("registrationAuthority", "kf_registrationnumber"),
        ])
        .unwrap_err();
        match err {
            ConfigError::DuplicateExternalId { external, first, second } => {
                assert_eq!(external, "kf_registrationnumber");
                assert_eq!(first, "registrationNumber");
                assert_eq!(second, "registrationAuthority");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_external_id_is_unmapped() {
        let mapping =
            FieldMapping::from_pairs([("investmentGoals", ""), ("industry", "industry")]).unwrap();
        assert_eq!(mapping.external("investmentGoals"), None);
        assert_eq!(mapping.unmapped(), &["investmentGoals".to_string()]);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_parse_yaml_missing_key_fails() {
        assert!(parse_field_mapping("mappings: {}").is_err());
    }

    #[test]
    fn test_embedded_mapping_covers_config() {
        let mapping = load_field_mapping().unwrap();
        let config = load_profile_config().unwrap();
        let warnings = mapping.warnings_for(&config);
        assert_eq!(
            warnings,
            vec!["Field investmentGoals in section basic has no CRM mapping".to_string()]
        );
        assert_eq!(mapping.external("founderName"), Some("fullname"));
    }
}
