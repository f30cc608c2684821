//! Display strings for profile messages, loaded from a TOML seed file.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::config::{read_seed_file, ConfigError};

#[derive(Deserialize, Debug)]
struct StringsFile {
    strings: HashMap<String, String>,
}

/// Keyed message templates with `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct ProfileStrings {
    strings: HashMap<String, String>,
    placeholder: Regex,
}

impl ProfileStrings {
    pub fn parse(toml_content: &str) -> Result<Self, ConfigError> {
        let file: StringsFile =
            toml::from_str(toml_content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        let placeholder = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::TomlParse(format!("placeholder pattern: {}", e)))?;
        Ok(Self {
            strings: file.strings,
            placeholder,
        })
    }

    /// Loads the strings compiled into the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(include_str!("../../seed_data/profile_strings.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::parse(&read_seed_file(path)?)
    }

    /// The raw template for `key`; unknown keys come back as the key itself.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Fills `{name}` placeholders from `params`. Placeholders without a
    /// value are left as written.
    pub fn format(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.get(key);
        self.placeholder
            .replace_all(template, |caps: &regex::Captures<'_>| {
                params
                    .iter()
                    .find(|(name, _)| *name == &caps[1])
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_strings_load() {
        let strings = ProfileStrings::embedded().unwrap();
        assert!(!strings.is_empty());
        assert_eq!(strings.get("profile.title"), "Business Profile");
    }

    #[test]
    fn format_fills_placeholders() {
        let strings = ProfileStrings::embedded().unwrap();
        assert_eq!(
            strings.format("profile.mandatory", &[("completed", "3"), ("total", "6")]),
            "3 of 6 mandatory fields completed"
        );
        assert_eq!(
            strings.format("save.unhandled_section", &[("section", "finance")]),
            "Saving is not available for finance yet."
        );
    }

    #[test]
    fn missing_params_and_keys() {
        let strings = ProfileStrings::embedded().unwrap();
        assert_eq!(strings.format("profile.completion", &[]), "{percent}% complete");
        assert_eq!(strings.get("no.such.key"), "no.such.key");
    }

    #[test]
    fn bad_toml_is_error() {
        assert!(matches!(
            ProfileStrings::parse("strings = 5"),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
