//! Section id to save endpoint table.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{read_seed_file, ConfigError, ProfileConfig};
use crate::mapping::NormalizedPatch;

/// How a section's payload is assembled before sending.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PayloadShape {
    /// The normalized patch as-is.
    #[default]
    Plain,
    /// The patch plus `alignmentScore` (mandatory completion) and
    /// `dataCompleteness` (section completion).
    WithCompletionMetrics,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SaveRoute {
    pub section: String,
    pub endpoint: String,
    #[serde(default)]
    pub shape: PayloadShape,
}

impl SaveRoute {
    /// Builds the body sent for this section. Metrics are taken from the
    /// completion state before the edit is applied.
    pub fn build_payload(
        &self,
        patch: NormalizedPatch,
        section_percentage: u8,
        mandatory_percentage: u8,
    ) -> NormalizedPatch {
        let mut payload = patch;
        if self.shape == PayloadShape::WithCompletionMetrics {
            payload.insert("alignmentScore".to_string(), Value::from(mandatory_percentage));
            payload.insert("dataCompleteness".to_string(), Value::from(section_percentage));
        }
        payload
    }
}

#[derive(Deserialize, Debug)]
struct RoutesFile {
    routes: Vec<SaveRoute>,
}

/// Lookup table from section id to its save route.
#[derive(Debug, Clone, Default)]
pub struct SaveRegistry {
    routes: HashMap<String, SaveRoute>,
}

impl SaveRegistry {
    /// Builds the registry, rejecting duplicate sections and sections the
    /// configuration does not define.
    pub fn new(routes: Vec<SaveRoute>, config: &ProfileConfig) -> Result<Self, ConfigError> {
        let mut registry = SaveRegistry::default();
        for route in routes {
            if config.section(&route.section).is_none() {
                return Err(ConfigError::UnknownRouteSection(route.section));
            }
            if registry.routes.contains_key(&route.section) {
                return Err(ConfigError::DuplicateRoute(route.section));
            }
            registry.routes.insert(route.section.clone(), route);
        }
        Ok(registry)
    }

    pub fn get(&self, section_id: &str) -> Option<&SaveRoute> {
        self.routes.get(section_id)
    }

    /// Every route, ordered by section id.
    pub fn routes(&self) -> Vec<&SaveRoute> {
        let mut routes: Vec<&SaveRoute> = self.routes.values().collect();
        routes.sort_by(|a, b| a.section.cmp(&b.section));
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Sections that have no save route and therefore cannot be saved.
    pub fn warnings_for(&self, config: &ProfileConfig) -> Vec<String> {
        config
            .tabs
            .iter()
            .filter(|s| !self.routes.contains_key(&s.id))
            .map(|s| format!("Section {} has no save route", s.id))
            .collect()
    }
}

pub fn parse_save_routes(yaml_content: &str, config: &ProfileConfig) -> Result<SaveRegistry, ConfigError> {
    let file: RoutesFile = serde_yml::from_str(yaml_content)?;
    SaveRegistry::new(file.routes, config)
}

/// Loads the save routes compiled into the binary.
pub fn load_save_routes(config: &ProfileConfig) -> Result<SaveRegistry, ConfigError> {
    let yaml_content = include_str!("../../seed_data/save_routes.yml");
    parse_save_routes(yaml_content, config)
}

pub fn load_save_routes_from(path: &Path, config: &ProfileConfig) -> Result<SaveRegistry, ConfigError> {
    parse_save_routes(&read_seed_file(path)?, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_profile_config;
    use serde_json::json;

    #[test]
    fn test_embedded_routes() {
        let config = load_profile_config().unwrap();
        let registry = load_save_routes(&config).unwrap();
        let basic = registry.get("basic").unwrap();
        assert_eq!(basic.endpoint, "/vision/visionstrategy");
        assert_eq!(basic.shape, PayloadShape::WithCompletionMetrics);
        assert_eq!(registry.get("products").unwrap().shape, PayloadShape::Plain);
        assert!(registry.get("finance").is_none());
        assert_eq!(
            registry.warnings_for(&config),
            vec!["Section finance has no save route".to_string()]
        );
    }

    #[test]
    fn test_unknown_section_rejected() {
        let config = load_profile_config().unwrap();
        let yaml = "routes:\n  - { section: marketing, endpoint: /form/marketing }\n";
        assert!(matches!(
            parse_save_routes(yaml, &config),
            Err(ConfigError::UnknownRouteSection(ref s)) if s == "marketing"
        ));
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let config = load_profile_config().unwrap();
        let yaml = "routes:\n  - { section: basic, endpoint: /a }\n  - { section: basic, endpoint: /b }\n";
        assert!(matches!(
            parse_save_routes(yaml, &config),
            Err(ConfigError::DuplicateRoute(_))
        ));
    }

    #[test]
    fn test_build_payload_shapes() {
        let mut patch = NormalizedPatch::new();
        patch.insert("tradeName".to_string(), json!("Blue Horizon"));

        let plain = SaveRoute {
            section: "products".to_string(),
            endpoint: "/form/productsandinnovation".to_string(),
            shape: PayloadShape::Plain,
        };
        let body = plain.build_payload(patch.clone(), 40, 75);
        assert_eq!(body.len(), 1);

        let metrics = SaveRoute {
            shape: PayloadShape::WithCompletionMetrics,
            ..plain
        };
        let body = metrics.build_payload(patch, 40, 75);
        assert_eq!(body["alignmentScore"], json!(75));
        assert_eq!(body["dataCompleteness"], json!(40));
        assert_eq!(body["tradeName"], json!("Blue Horizon"));
    }
}
