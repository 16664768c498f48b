//! Pipeline configuration, loadable from TOML.
//!
//! ```toml
//! strict_labels = true
//!
//! [merge]
//! merge_all_pass = true
//!
//! [limits]
//! max_steps = 50000
//! ```

use std::fs;
use std::path::Path;

use layered_extract::MatchLimits;
use layered_extract_model::CONFIDENCE_EPSILON;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// How partial records are combined after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Rank merge candidates by `distance / (confidence + epsilon)` rather
    /// than by distance alone.
    pub adjust_by_confidence: bool,
    pub confidence_epsilon: f64,
    /// Also fill non-contextual fields from records of the same type found
    /// in the same sentence or table row.
    pub merge_all_pass: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            adjust_by_confidence: true,
            confidence_epsilon: CONFIDENCE_EPSILON,
            merge_all_pass: false,
        }
    }
}

/// Settings for one [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub limits: MatchLimits,
    pub merge: MergeConfig,
    /// Register only labels that were found next to a compound name.
    pub strict_labels: bool,
    pub remove_subsets_strict: bool,
    pub remove_used_subrecords: bool,
    /// Reset nested records whose contextual fields were never filled.
    pub clean_contextual: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            limits: MatchLimits::default(),
            merge: MergeConfig::default(),
            strict_labels: false,
            remove_subsets_strict: false,
            remove_used_subrecords: true,
            clean_contextual: false,
        }
    }
}

impl ExtractionConfig {
    /// Load from a TOML file. A missing file gives the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_keep_their_defaults() {
        let config = ExtractionConfig::from_toml(
            r#"
            strict_labels = true

            [merge]
            merge_all_pass = true

            [limits]
            max_steps = 50000
            "#,
        )
        .unwrap();
        assert!(config.strict_labels);
        assert!(config.merge.merge_all_pass);
        assert!(config.merge.adjust_by_confidence);
        assert_eq!(config.merge.confidence_epsilon, 0.01);
        assert_eq!(config.limits.max_steps, 50_000);
        assert_eq!(config.limits.max_repetitions, 512);
        assert_eq!(config.limits.max_depth, 256);
        assert!(config.remove_used_subrecords);
    }

    #[test]
    fn missing_files_give_the_defaults() {
        let config = ExtractionConfig::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn unknown_types_are_parse_errors() {
        assert!(ExtractionConfig::from_toml("strict_labels = 3").is_err());
    }
}
