//! Profile completion: per-section fill rate, stage-dependent mandatory
//! coverage, and the list of mandatory fields still missing.
//!
//! All percentages are integers in `0..=100`, rounded half up.

use serde::Serialize;
use serde_json::Value;

use crate::config::{ProfileConfig, SectionConfig};
use crate::profile::{ProfileData, SectionData};

/// Whether a stored value counts as filled in.
///
/// Strings must contain something other than whitespace and arrays must be
/// non-empty. Numbers (zero included), booleans and objects always count.
pub fn is_completed(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) | Some(Value::Object(_)) => true,
    }
}

/// `completed / total` as a whole percentage, rounded half up.
/// Returns 0 when `total` is 0.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u8
}

/// A completed/total tally with its percentage.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Mandatory-field coverage for one section.
pub type MandatoryCompletion = Completion;

impl Completion {
    fn of(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            percentage: percentage(completed, total),
        }
    }

    /// Like [`Completion::of`] but an empty tally counts as fully complete.
    fn mandatory(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            percentage: if total == 0 { 100 } else { percentage(completed, total) },
        }
    }
}

/// Share of all fields in `section` that are filled in.
pub fn calculate_section_completion(data: &SectionData, section: &SectionConfig) -> u8 {
    let total = section.field_count();
    let completed = section
        .fields()
        .filter(|f| is_completed(data.get(&f.field_name)))
        .count();
    percentage(completed, total)
}

/// Share of the fields mandatory at `stage` in one section that are filled in.
///
/// An unknown section or missing data yields an all-zero result. A section
/// with no mandatory fields at this stage is 100% complete.
pub fn calculate_mandatory_completion(
    data: Option<&SectionData>,
    section_id: &str,
    stage: &str,
    config: &ProfileConfig,
) -> MandatoryCompletion {
    let (Some(data), Some(section)) = (data, config.section(section_id)) else {
        return Completion::default();
    };
    let mut total = 0;
    let mut completed = 0;
    for (_, field) in section.mandatory_fields_for_stage(stage) {
        total += 1;
        if is_completed(data.get(&field.field_name)) {
            completed += 1;
        }
    }
    Completion::mandatory(completed, total)
}

/// A mandatory field that is not filled in.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub section_id: String,
    pub section_title: String,
    pub group_name: String,
    pub field_name: String,
    pub label: String,
}

/// Profile-wide mandatory coverage.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct MandatoryCheck {
    pub completed: usize,
    pub total: usize,
    pub missing: Vec<MissingField>,
}

impl MandatoryCheck {
    /// 100 when nothing is mandatory.
    pub fn percentage(&self) -> u8 {
        Completion::mandatory(self.completed, self.total).percentage
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Walks every section and collects the mandatory fields still missing at `stage`.
pub fn check_mandatory_fields_completion(
    profile: &ProfileData,
    stage: &str,
    config: &ProfileConfig,
) -> MandatoryCheck {
    let empty = SectionData::default();
    let mut check = MandatoryCheck::default();
    for section in &config.tabs {
        let data = profile.section(&section.id).unwrap_or(&empty);
        for (group, field) in section.mandatory_fields_for_stage(stage) {
            check.total += 1;
            if is_completed(data.get(&field.field_name)) {
                check.completed += 1;
            } else {
                check.missing.push(MissingField {
                    section_id: section.id.clone(),
                    section_title: section.title.clone(),
                    group_name: group.group_name.clone(),
                    field_name: field.field_name.clone(),
                    label: field.display_label().to_string(),
                });
            }
        }
    }
    check
}

/// Fill rate across every field of every section.
pub fn calculate_overall_completion(profile: &ProfileData, config: &ProfileConfig) -> Completion {
    let empty = SectionData::default();
    let mut total = 0;
    let mut completed = 0;
    for section in &config.tabs {
        let data = profile.section(&section.id).unwrap_or(&empty);
        for field in section.fields() {
            total += 1;
            if is_completed(data.get(&field.field_name)) {
                completed += 1;
            }
        }
    }
    Completion::of(completed, total)
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub section_id: String,
    pub title: String,
    pub percentage: u8,
    pub mandatory: MandatoryCompletion,
}

/// Every completion figure derived from one profile snapshot.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub stage: String,
    pub sections: Vec<SectionReport>,
    pub mandatory: MandatoryCheck,
    pub overall: Completion,
}

impl CompletionReport {
    pub fn compute(profile: &ProfileData, config: &ProfileConfig) -> Self {
        let stage = profile.company_stage.as_str();
        let empty = SectionData::default();
        let sections = config
            .tabs
            .iter()
            .map(|section| {
                // Sections without stored data count as empty, as in the mandatory check.
                let data = profile.section(&section.id).unwrap_or(&empty);
                SectionReport {
                    section_id: section.id.clone(),
                    title: section.title.clone(),
                    percentage: calculate_section_completion(data, section),
                    mandatory: calculate_mandatory_completion(Some(data), &section.id, stage, config),
                }
            })
            .collect();

        Self {
            stage: stage.to_string(),
            sections,
            mandatory: check_mandatory_fields_completion(profile, stage, config),
            overall: calculate_overall_completion(profile, config),
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_profile_config;
    use crate::field_mapping::FieldMapping;
    use crate::mapping::map_remote_to_section;
    use serde_json::json;
    use std::collections::BTreeMap;

    const TWO_SECTIONS: &str = r#"
companyStages:
  - { id: startup, label: Startup }
  - { id: growth, label: Growth }
tabs:
  - id: basic
    title: Vision & Strategy
    groups:
      - groupName: Identity
        fields:
          - { fieldName: tradeName, label: Trade Name, fieldType: Text, mandatory: true }
          - { fieldName: industry, fieldType: select, mandatory: false, options: [{label: Retail, value: Retail}] }
          - { fieldName: revenue, fieldType: Currency, mandatory: [growth] }
  - id: products
    title: Products
    groups:
      - groupName: Portfolio
        fields:
          - { fieldName: productName, label: Product Name, fieldType: Text, mandatory: true }
  - id: empty
    title: Nothing Here
    groups: []
"#;

    fn config() -> ProfileConfig {
        parse_profile_config(TWO_SECTIONS).unwrap()
    }

    fn section_data(value: serde_json::Value) -> SectionData {
        SectionData {
            fields: value.as_object().cloned().unwrap(),
        }
    }

    fn profile(stage: &str, sections: Vec<(&str, SectionData)>) -> ProfileData {
        ProfileData {
            company_stage: stage.to_string(),
            name: "Test Co".to_string(),
            company_type: None,
            company_size: None,
            account_id: Some("acc-1".to_string()),
            sections: sections
                .into_iter()
                .map(|(id, data)| (id.to_string(), data))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_completion_predicate_boundaries() {
        assert!(!is_completed(Some(&json!(""))));
        assert!(!is_completed(Some(&json!("   "))));
        assert!(is_completed(Some(&json!(0))));
        assert!(!is_completed(Some(&json!([]))));
        assert!(is_completed(Some(&json!(["a"]))));
        assert!(!is_completed(Some(&Value::Null)));
        assert!(!is_completed(None));
        assert!(is_completed(Some(&json!(false))));
        assert!(is_completed(Some(&json!({}))));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_section_completion_one_of_three() {
        let config = config();
        let basic = config.section("basic").unwrap();
        let data = section_data(json!({"tradeName": "Blue Horizon", "industry": "", "revenue": null}));
        assert_eq!(calculate_section_completion(&data, basic), 33);
        let data = section_data(json!({"tradeName": "Blue Horizon", "revenue": 0}));
        assert_eq!(calculate_section_completion(&data, basic), 67);
    }

    #[test]
    fn test_empty_denominators() {
        let config = config();
        let empty = config.section("empty").unwrap();
        assert_eq!(calculate_section_completion(&SectionData::default(), empty), 0);

        let data = SectionData::default();
        let result = calculate_mandatory_completion(Some(&data), "empty", "growth", &config);
        assert_eq!(
            result,
            Completion {
                completed: 0,
                total: 0,
                percentage: 100
            }
        );
    }

    #[test]
    fn test_mandatory_unknown_section_or_missing_data() {
        let config = config();
        let data = SectionData::default();
        assert_eq!(
            calculate_mandatory_completion(Some(&data), "nope", "growth", &config),
            Completion::default()
        );
        assert_eq!(
            calculate_mandatory_completion(None, "basic", "growth", &config),
            Completion::default()
        );
    }

    #[test]
    fn test_mandatory_depends_on_stage() {
        let config = config();
        let data = section_data(json!({"tradeName": "Blue Horizon"}));
        let growth = calculate_mandatory_completion(Some(&data), "basic", "growth", &config);
        assert_eq!((growth.completed, growth.total, growth.percentage), (1, 2, 50));
        let startup = calculate_mandatory_completion(Some(&data), "basic", "startup", &config);
        assert_eq!((startup.completed, startup.total, startup.percentage), (1, 1, 100));
    }

    #[test]
    fn test_unknown_stage_applies_only_unconditional_fields() {
        let config = config();
        let data = section_data(json!({}));
        let result = calculate_mandatory_completion(Some(&data), "basic", "hypergrowth", &config);
        assert_eq!((result.completed, result.total), (0, 1));
    }

    #[test]
    fn test_monotonic_when_adding_values() {
        let config = config();
        let basic = config.section("basic").unwrap();
        let mut data = SectionData::default();
        let mut last = calculate_section_completion(&data, basic);
        for (name, value) in [
            ("industry", json!("Retail")),
            ("revenue", json!(0)),
            ("tradeName", json!("Blue Horizon")),
        ] {
            data.fields.insert(name.to_string(), value);
            let next = calculate_section_completion(&data, basic);
            assert!(next >= last, "{} dropped completion {} -> {}", name, last, next);
            last = next;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_missing_fields_aggregation() {
        let config = config();
        let profile = profile(
            "startup",
            vec![("basic", section_data(json!({"tradeName": "Blue Horizon"})))],
        );
        let check = check_mandatory_fields_completion(&profile, "startup", &config);
        assert_eq!(check.completed, 1);
        assert_eq!(check.total, 2);
        assert_eq!(
            check.missing,
            vec![MissingField {
                section_id: "products".to_string(),
                section_title: "Products".to_string(),
                group_name: "Portfolio".to_string(),
                field_name: "productName".to_string(),
                label: "Product Name".to_string(),
            }]
        );
        assert_eq!(check.percentage(), 50);
        assert!(!check.is_complete());
    }

    #[test]
    fn test_report_counts_sections_without_data() {
        let config = config();
        let profile = profile(
            "growth",
            vec![("basic", section_data(json!({"tradeName": "Blue Horizon"})))],
        );
        let report = CompletionReport::compute(&profile, &config);

        let products = report.section("products").unwrap();
        assert_eq!(
            (products.mandatory.completed, products.mandatory.total, products.mandatory.percentage),
            (0, 1, 0)
        );
        let section_total: usize = report.sections.iter().map(|s| s.mandatory.total).sum();
        let section_completed: usize = report.sections.iter().map(|s| s.mandatory.completed).sum();
        assert_eq!(section_total, report.mandatory.total);
        assert_eq!(section_completed, report.mandatory.completed);
    }

    #[test]
    fn test_mandatory_check_nothing_mandatory() {
        let config = parse_profile_config(
            "tabs:\n  - id: a\n    groups:\n      - groupName: G\n        fields:\n          - { fieldName: x, fieldType: Text }\n",
        )
        .unwrap();
        let check = check_mandatory_fields_completion(&profile("growth", vec![]), "growth", &config);
        assert_eq!(check.total, 0);
        assert_eq!(check.percentage(), 100);
        assert!(check.is_complete());
    }

    #[test]
    fn test_end_to_end_founder_and_revenue() {
        let yaml = r#"
companyStages:
  - { id: growth, label: Growth }
tabs:
  - id: basic
    title: Basics
    groups:
      - groupName: Founder
        fields:
          - { fieldName: founderName, fieldType: Text, mandatory: true }
          - { fieldName: revenue, fieldType: Currency, mandatory: [growth] }
"#;
        let config = parse_profile_config(yaml).unwrap();
        let mapping =
            FieldMapping::from_pairs([("founderName", "kf_foundername"), ("revenue", "revenue")])
                .unwrap();
        let record = json!({"kf_foundername": "Jane Doe"}).as_object().cloned().unwrap();
        let section = config.section("basic");
        let data = map_remote_to_section(&record, &mapping, section);

        assert_eq!(calculate_section_completion(&data, section.unwrap()), 50);
        let mandatory = calculate_mandatory_completion(Some(&data), "basic", "growth", &config);
        assert_eq!(
            mandatory,
            Completion {
                completed: 1,
                total: 2,
                percentage: 50
            }
        );
    }

    #[test]
    fn test_report_and_overall() {
        let config = config();
        let profile = profile(
            "growth",
            vec![
                (
                    "basic",
                    section_data(json!({"tradeName": "Blue Horizon", "revenue": 1200})),
                ),
                ("products", section_data(json!({"productName": ""}))),
            ],
        );
        let report = CompletionReport::compute(&profile, &config);
        assert_eq!(report.stage, "growth");
        assert_eq!(report.sections.len(), 3);
        let basic = report.section("basic").unwrap();
        assert_eq!(basic.percentage, 67);
        assert_eq!(basic.mandatory.percentage, 100);
        let products = report.section("products").unwrap();
        assert_eq!(products.percentage, 0);
        assert_eq!(products.mandatory.total, 1);
        let empty = report.section("empty").unwrap();
        assert_eq!(
            empty.mandatory,
            Completion {
                completed: 0,
                total: 0,
                percentage: 100
            }
        );
        assert_eq!(report.mandatory.missing.len(), 1);
        assert_eq!(
            report.overall,
            Completion {
                completed: 2,
                total: 4,
                percentage: 50
            }
        );
    }
}
