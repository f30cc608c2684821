//! The immutable seed data a profile session works against.

use std::path::Path;
use std::sync::Arc;

use crate::config::{load_profile_config, load_profile_config_from, ConfigError, ProfileConfig};
use crate::field_mapping::{load_field_mapping, load_field_mapping_from, FieldMapping};
use crate::routes::{load_save_routes, load_save_routes_from, SaveRegistry};

/// Profile configuration, field mapping and save routes, loaded once and
/// shared between sessions.
#[derive(Debug, Clone)]
pub struct ProfileContext {
    pub config: Arc<ProfileConfig>,
    pub mapping: Arc<FieldMapping>,
    pub routes: Arc<SaveRegistry>,
}

/// Optional on-disk replacements for the compiled-in seed files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedPaths<'a> {
    pub config: Option<&'a Path>,
    pub mapping: Option<&'a Path>,
    pub routes: Option<&'a Path>,
}

impl ProfileContext {
    pub fn new(config: ProfileConfig, mapping: FieldMapping, routes: SaveRegistry) -> Self {
        Self {
            config: Arc::new(config),
            mapping: Arc::new(mapping),
            routes: Arc::new(routes),
        }
    }

    /// Loads the seed files compiled into the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::load(SeedPaths::default())
    }

    /// Loads each seed file from its override path, or the compiled-in copy.
    pub fn load(paths: SeedPaths<'_>) -> Result<Self, ConfigError> {
        let config = match paths.config {
            Some(p) => load_profile_config_from(p)?,
            None => load_profile_config()?,
        };
        let mapping = match paths.mapping {
            Some(p) => load_field_mapping_from(p)?,
            None => load_field_mapping()?,
        };
        let routes = match paths.routes {
            Some(p) => load_save_routes_from(p, &config)?,
            None => load_save_routes(&config)?,
        };
        let ctx = Self::new(config, mapping, routes);
        for warning in ctx.warnings() {
            tracing::debug!("profile config: {}", warning);
        }
        Ok(ctx)
    }

    /// Every non-fatal finding across the three seed files.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = self.config.warnings();
        warnings.extend(self.mapping.warnings_for(&self.config));
        warnings.extend(self.routes.warnings_for(&self.config));
        warnings
    }
}
