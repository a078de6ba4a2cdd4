//! Run configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working configuration. CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::vocab;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Namespace for every minted node. Must end in `/` or `#`.
    pub base_iri: String,
    /// RiC-O namespace.
    pub rico_iri: String,
    /// Container index at or above which a new agent is a corporate body.
    pub corporate_threshold: u32,
    /// Instance column holding the container (box) number.
    pub container_column: String,
    /// Case-insensitive substrings marking mapping sheets to skip.
    pub skip_sheet_patterns: Vec<String>,
    /// Process at most this many mapping sheets.
    pub max_sheets: Option<usize>,
    pub geonames: GeoNamesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_iri: "http://example.org/".into(),
            rico_iri: vocab::RICO.into(),
            corporate_threshold: 12,
            container_column: "Busta".into(),
            skip_sheet_patterns: vec!["immagin".into(), "image".into()],
            max_sheets: None,
            geonames: GeoNamesConfig::default(),
        }
    }
}

/// GeoNames lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoNamesConfig {
    /// Web-service account. Remote lookups are disabled when unset.
    pub username: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Local GeoNames dump (tab-separated `geoname` table).
    pub reference_dump: Option<PathBuf>,
    /// ISO-3166 country code used to bias remote searches.
    pub country: Option<String>,
}

impl Default for GeoNamesConfig {
    fn default() -> Self {
        Self {
            username: None,
            endpoint: "http://api.geonames.org/searchJSON".into(),
            timeout_secs: 10,
            reference_dump: None,
            country: None,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Parse configuration text; `origin` names the source in errors.
    pub fn from_toml(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, iri) in [("base_iri", &self.base_iri), ("rico_iri", &self.rico_iri)] {
            if !crate::uri::is_absolute_iri(iri) {
                return Err(ConfigError::Invalid {
                    message: format!("{name} must be an absolute http(s) IRI, got \"{iri}\""),
                });
            }
            if !(iri.ends_with('/') || iri.ends_with('#')) {
                return Err(ConfigError::Invalid {
                    message: format!("{name} must end in '/' or '#', got \"{iri}\""),
                });
            }
        }
        if self.geonames.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "geonames.timeout_secs must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Whether a mapping sheet is excluded by `skip_sheet_patterns`.
    pub fn skips_sheet(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.skip_sheet_patterns
            .iter()
            .any(|p| lower.contains(&p.to_lowercase()))
    }

    pub fn namespaces(&self) -> vocab::Namespaces {
        vocab::Namespaces::new(self.base_iri.clone(), self.rico_iri.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml("", "test").unwrap();
        assert_eq!(config.base_iri, "http://example.org/");
        assert_eq!(config.corporate_threshold, 12);
        assert!(config.geonames.username.is_none());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            corporate_threshold = 20

            [geonames]
            username = "archivist"
            country = "IT"
            "#,
            "test",
        )
        .unwrap();
        assert_eq!(config.corporate_threshold, 20);
        assert_eq!(config.geonames.username.as_deref(), Some("archivist"));
        assert_eq!(config.geonames.timeout_secs, 10);
        assert_eq!(config.container_column, "Busta");
    }

    #[test]
    fn base_iri_must_be_a_namespace() {
        let err = PipelineConfig::from_toml("base_iri = \"http://example.org/x\"", "test")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        let err = PipelineConfig::from_toml("base_iri = \"example\"", "test").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = PipelineConfig::from_toml("corporate_threshold = \"many\"", "cfg.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn image_sheets_are_skipped_by_default() {
        let config = PipelineConfig::default();
        assert!(config.skips_sheet("Immagini"));
        assert!(config.skips_sheet("Image assets"));
        assert!(!config.skips_sheet("Documento"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("archive.toml");
        std::fs::write(&path, "max_sheets = 3\n").unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.max_sheets, Some(3));
        assert!(PipelineConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
