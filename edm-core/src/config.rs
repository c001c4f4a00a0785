#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fs;
use std::path::Path;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(edm::config))]
pub struct ConfigError {
    pub message: String,
}

/// Engine settings, read from TOML. Every field has a default, so an empty
/// document is a valid configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdmConfig {
    pub validation: ValidationConfig,
    pub epm: EpmConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Non-abstract entity types must have a declared or inherited key.
    pub require_entity_keys: bool,
    /// Cap on the diagnostics returned by a model-wide walk; 0 is unlimited.
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_entity_keys: true,
            max_errors: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EpmConfig {
    /// Also reject mixed content in the syndication subtree.
    pub check_syndication_mixed_content: bool,
}

impl EdmConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError {
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text).map_err(|e| ConfigError {
            message: format!("{}: {}", path.display(), e.message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EdmConfig::from_toml_str("").unwrap();
        assert_eq!(config, EdmConfig::default());
        assert!(config.validation.require_entity_keys);
        assert!(!config.epm.check_syndication_mixed_content);
    }

    #[test]
    fn sections_override_defaults() {
        let config = EdmConfig::from_toml_str(
            r#"
            [validation]
            max_errors = 10

            [epm]
            check_syndication_mixed_content = true
            "#,
        )
        .unwrap();
        assert_eq!(config.validation.max_errors, 10);
        assert!(config.validation.require_entity_keys);
        assert!(config.epm.check_syndication_mixed_content);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EdmConfig::from_toml_str("[validation]\nstrict = true\n").unwrap_err();
        assert!(err.message.contains("strict"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = EdmConfig::load(Path::new("/definitely/not/here/edm.toml")).unwrap_err();
        assert!(err.message.contains("edm.toml"));
    }
}
