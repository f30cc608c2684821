//! Business profile configuration: company stages and the tab/group/field layout.
//!
//! The configuration is compiled in from `seed_data/profile_config.yml` and can be
//! overridden from a file. Structural problems (duplicate field names, duplicate
//! section ids, unknown field types) fail the load; softer issues are reported by
//! [`ProfileConfig::warnings`].

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage used when the configuration file does not name one.
pub const DEFAULT_STAGE: &str = "growth";

/// Errors raised while loading any of the profile seed files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Section at position {0} has no id")]
    MissingSectionId(usize),
    #[error("Duplicate section id: {0}")]
    DuplicateSectionId(String),
    #[error("Field in section {0} has no fieldName")]
    MissingFieldName(String),
    #[error("Duplicate fieldName detected: {0}")]
    DuplicateFieldName(String),
    #[error("CRM field {external} is mapped by both {first} and {second}")]
    DuplicateExternalId {
        external: String,
        first: String,
        second: String,
    },
    #[error("Duplicate save route for section {0}")]
    DuplicateRoute(String),
    #[error("Save route references unknown section {0}")]
    UnknownRouteSection(String),
}

/// Reads a seed file from disk, wrapping I/O failures with the path.
pub(crate) fn read_seed_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Closed set of field types. The wire spellings are the ones used by the
/// portal's configuration files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    #[serde(rename = "Text")]
    Text,
    #[serde(rename = "Multiline Text")]
    MultilineText,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "multiselect", alias = "select-multi")]
    MultiSelect,
    #[serde(rename = "Whole Number")]
    WholeNumber,
    #[serde(rename = "Decimal")]
    Decimal,
    #[serde(rename = "Decimal (0–100)")]
    Percentage,
    #[serde(rename = "Currency")]
    Currency,
    #[serde(rename = "URL")]
    Url,
    #[serde(rename = "Date Only")]
    DateOnly,
    #[serde(rename = "Date")]
    Date,
    #[serde(rename = "DateTime")]
    DateTime,
    #[serde(rename = "File Upload")]
    FileUpload,
    #[serde(rename = "Table")]
    Table,
    #[serde(rename = "Lookup")]
    Lookup,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::MultilineText => "Multiline Text",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multiselect",
            FieldType::WholeNumber => "Whole Number",
            FieldType::Decimal => "Decimal",
            FieldType::Percentage => "Decimal (0–100)",
            FieldType::Currency => "Currency",
            FieldType::Url => "URL",
            FieldType::DateOnly => "Date Only",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::FileUpload => "File Upload",
            FieldType::Table => "Table",
            FieldType::Lookup => "Lookup",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a field counts as mandatory.
///
/// Written either as a boolean or as a list of stage ids.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MandatoryRule {
    Always(bool),
    Stages(Vec<String>),
}

impl Default for MandatoryRule {
    fn default() -> Self {
        MandatoryRule::Always(false)
    }
}

impl MandatoryRule {
    /// Whether the field is mandatory for a company at `stage`.
    ///
    /// A stage that appears in no list matches nothing, so only
    /// unconditional fields apply to it.
    pub fn applies_at(&self, stage: &str) -> bool {
        match self {
            MandatoryRule::Always(flag) => *flag,
            MandatoryRule::Stages(stages) => stages.iter().any(|s| s == stage),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub label: String,
    pub field_name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub mandatory: MandatoryRule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

impl FieldConfig {
    /// Label for display, falling back to the field name.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.field_name
        } else {
            &self.label
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// A set of fields edited and saved together.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    pub group_name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One tab of the profile page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SectionConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl SectionConfig {
    /// All fields of all groups, in layout order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    pub fn field_count(&self) -> usize {
        self.groups.iter().map(|g| g.fields.len()).sum()
    }

    /// Fields that are mandatory at `stage`, paired with their group name.
    pub fn mandatory_fields_for_stage<'a>(
        &'a self,
        stage: &'a str,
    ) -> impl Iterator<Item = (&'a GroupConfig, &'a FieldConfig)> + 'a {
        self.groups.iter().flat_map(move |g| {
            g.fields
                .iter()
                .filter(move |f| f.mandatory.applies_at(stage))
                .map(move |f| (g, f))
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompanyStage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn default_stage() -> String {
    DEFAULT_STAGE.to_string()
}

/// The full profile layout. Immutable after load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    #[serde(default = "default_stage")]
    pub default_stage: String,
    #[serde(default)]
    pub company_stages: Vec<CompanyStage>,
    pub tabs: Vec<SectionConfig>,
}

impl ProfileConfig {
    pub fn section(&self, id: &str) -> Option<&SectionConfig> {
        self.tabs.iter().find(|s| s.id == id)
    }

    pub fn stage(&self, id: &str) -> Option<&CompanyStage> {
        self.company_stages.iter().find(|s| s.id == id)
    }

    pub fn is_known_stage(&self, id: &str) -> bool {
        self.stage(id).is_some()
    }

    /// Every field in the profile with its owning section and group.
    pub fn all_fields(&self) -> impl Iterator<Item = (&SectionConfig, &GroupConfig, &FieldConfig)> {
        self.tabs.iter().flat_map(|s| {
            s.groups
                .iter()
                .flat_map(move |g| g.fields.iter().map(move |f| (s, g, f)))
        })
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldConfig> {
        self.all_fields()
            .map(|(_, _, f)| f)
            .find(|f| f.field_name == field_name)
    }

    /// Checks the structural rules every other component relies on.
    fn check_structure(&self) -> Result<(), ConfigError> {
        let mut section_ids = HashSet::new();
        let mut field_names = HashSet::new();
        for (idx, section) in self.tabs.iter().enumerate() {
            if section.id.trim().is_empty() {
                return Err(ConfigError::MissingSectionId(idx));
            }
            if !section_ids.insert(section.id.as_str()) {
                return Err(ConfigError::DuplicateSectionId(section.id.clone()));
            }
            for field in section.fields() {
                if field.field_name.trim().is_empty() {
                    return Err(ConfigError::MissingFieldName(section.id.clone()));
                }
                if !field_names.insert(field.field_name.as_str()) {
                    return Err(ConfigError::DuplicateFieldName(field.field_name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Non-fatal configuration problems, one message per finding.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();
        for stage in &self.company_stages {
            if stage.id.is_empty() {
                warnings.push("Stage missing id".to_string());
                continue;
            }
            if !seen.insert(stage.id.as_str()) {
                warnings.push(format!("Duplicate stage id {}", stage.id));
            }
            if stage.label.trim().is_empty() {
                warnings.push(format!("Stage {} missing label", stage.id));
            }
        }

        if !self.company_stages.is_empty() && !self.is_known_stage(&self.default_stage) {
            warnings.push(format!(
                "Default stage {} is not a configured stage",
                self.default_stage
            ));
        }

        let stage_ids: Vec<&str> = self.company_stages.iter().map(|s| s.id.as_str()).collect();
        for (section, _, field) in self.all_fields() {
            if let MandatoryRule::Stages(stages) = &field.mandatory {
                for stage in stages.iter().filter(|s| !stage_ids.contains(&s.as_str())) {
                    let mut msg = format!(
                        "Field {} references unknown mandatory stage {}",
                        field.field_name, stage
                    );
                    if let Some(hint) = suggest(stage, stage_ids.iter().copied()) {
                        msg.push_str(&format!(" (did you mean {}?)", hint));
                    }
                    warnings.push(msg);
                }
            }
            let wants_options = matches!(field.field_type, FieldType::Select | FieldType::MultiSelect);
            if wants_options && field.options.is_empty() {
                warnings.push(format!(
                    "Field {} in section {} is a {} without options",
                    field.field_name, section.id, field.field_type
                ));
            }
        }
        warnings
    }
}

/// Closest known value to `candidate`, if any is similar enough.
pub fn suggest<'a>(candidate: &str, known: impl Iterator<Item = &'a str>) -> Option<String> {
    let lower = candidate.to_lowercase();
    known
        .map(|k| (k, strsim::jaro_winkler(&lower, &k.to_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k.to_string())
}

/// Parses and structurally validates a profile configuration.
pub fn parse_profile_config(yaml_content: &str) -> Result<ProfileConfig, ConfigError> {
    let config: ProfileConfig = serde_yml::from_str(yaml_content)?;
    config.check_structure()?;
    Ok(config)
}

/// Loads the profile configuration compiled into the binary.
pub fn load_profile_config() -> Result<ProfileConfig, ConfigError> {
    let yaml_content = include_str!("../../seed_data/profile_config.yml");
    parse_profile_config(yaml_content)
}

/// Loads a profile configuration from a YAML file on disk.
pub fn load_profile_config_from(path: &Path) -> Result<ProfileConfig, ConfigError> {
    parse_profile_config(&read_seed_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
companyStages:
  - { id: startup, label: Startup }
  - { id: growth, label: Growth }
tabs:
  - id: basic
    title: Basics
    groups:
      - groupName: Identity
        fields:
          - { fieldName: founderName, fieldType: Text, mandatory: true }
          - { fieldName: revenue, fieldType: Currency, mandatory: [growth] }
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_profile_config(MINIMAL).unwrap();
        assert_eq!(config.default_stage, "growth");
        assert_eq!(config.tabs.len(), 1);
        let section = config.section("basic").unwrap();
        assert_eq!(section.field_count(), 2);
        let revenue = config.field("revenue").unwrap();
        assert_eq!(revenue.field_type, FieldType::Currency);
        assert_eq!(
            revenue.mandatory,
            MandatoryRule::Stages(vec!["growth".to_string()])
        );
        assert_eq!(revenue.display_label(), "revenue");
    }

    #[test]
    fn test_field_type_spellings() {
        let parse = |s: &str| serde_yml::from_str::<FieldType>(s).unwrap();
        assert_eq!(parse("\"Decimal (0–100)\""), FieldType::Percentage);
        assert_eq!(parse("select-multi"), FieldType::MultiSelect);
        assert_eq!(parse("multiselect"), FieldType::MultiSelect);
        assert_eq!(parse("Date Only"), FieldType::DateOnly);
        assert_eq!(FieldType::MultiSelect.to_string(), "multiselect");
    }

    #[test]
    fn test_unknown_field_type_fails_load() {
        let yaml = r#"
tabs:
  - id: basic
    groups:
      - groupName: G
        fields:
          - { fieldName: a, fieldType: Boolean }
"#;
        assert!(matches!(
            parse_profile_config(yaml),
            Err(ConfigError::YamlParse(_))
        ));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let yaml = r#"
tabs:
  - id: basic
    groups:
      - groupName: G
        fields:
          - { fieldName: a, fieldType: Text }
  - id: other
    groups:
      - groupName: H
        fields:
          - { fieldName: a, fieldType: Text }
"#;
        let err = parse_profile_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFieldName(ref n) if n == "a"));
    }

    #[test]
    fn test_duplicate_section_id_rejected() {
        let yaml = r#"
tabs:
  - { id: basic, groups: [] }
  - { id: basic, groups: [] }
"#;
        assert!(matches!(
            parse_profile_config(yaml),
            Err(ConfigError::DuplicateSectionId(_))
        ));
    }

    #[test]
    fn test_mandatory_rule_applies_at() {
        let always = MandatoryRule::Always(true);
        let never = MandatoryRule::Always(false);
        let growth = MandatoryRule::Stages(vec!["growth".to_string()]);
        assert!(always.applies_at("anything"));
        assert!(!never.applies_at("growth"));
        assert!(growth.applies_at("growth"));
        assert!(!growth.applies_at("startup"));
        assert!(!growth.applies_at("hypergrowth"));
    }

    #[test]
    fn test_warnings_unknown_stage_with_suggestion() {
        let yaml = r#"
companyStages:
  - { id: growth, label: Growth }
  - { id: mature, label: "" }
tabs:
  - id: basic
    groups:
      - groupName: G
        fields:
          - { fieldName: a, fieldType: Text, mandatory: [grwoth] }
          - { fieldName: b, fieldType: select }
"#;
        let config = parse_profile_config(yaml).unwrap();
        let warnings = config.warnings();
        assert!(warnings.iter().any(|w| w == "Stage mature missing label"));
        assert!(warnings
            .iter()
            .any(|w| w.contains("unknown mandatory stage grwoth") && w.contains("did you mean growth?")));
        assert!(warnings.iter().any(|w| w.contains("without options")));
    }

    #[test]
    fn test_suggest_requires_similarity() {
        let known = ["startup", "growth", "mature"];
        assert_eq!(suggest("startp", known.iter().copied()), Some("startup".to_string()));
        assert_eq!(suggest("zzz", known.iter().copied()), None);
    }

    #[test]
    fn test_embedded_config_loads_clean() {
        let config = load_profile_config().unwrap();
        assert!(config.section("basic").is_some());
        assert!(config.section("Sales").is_some());
        assert_eq!(config.company_stages.len(), 4);
        assert!(config.warnings().is_empty(), "{:?}", config.warnings());
    }

    #[test]
    fn test_mandatory_fields_for_stage() {
        let config = parse_profile_config(MINIMAL).unwrap();
        let section = config.section("basic").unwrap();
        let at_growth: Vec<_> = section
            .mandatory_fields_for_stage("growth")
            .map(|(_, f)| f.field_name.as_str())
            .collect();
        assert_eq!(at_growth, vec!["founderName", "revenue"]);
        let at_startup: Vec<_> = section
            .mandatory_fields_for_stage("startup")
            .map(|(g, f)| (g.group_name.as_str(), f.field_name.as_str()))
            .collect();
        assert_eq!(at_startup, vec![("Identity", "founderName")]);
    }
}
