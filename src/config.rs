use crate::error::{BillingsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths and fixed layout constants for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    /// Preamble lines before the header row of the export.
    pub skip_rows: usize,
    pub interim_path: PathBuf,
    pub output_path: PathBuf,
    /// First calendar year (inclusive) counted in the period billings view.
    pub period_start_year: i32,
    pub country_type: String,
    pub market_type: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/raw/billings.csv"),
            skip_rows: 3,
            interim_path: PathBuf::from("data/interim/base_output.csv"),
            output_path: PathBuf::from("data/processed/output.xlsx"),
            period_start_year: 2016,
            country_type: "Countries".to_string(),
            market_type: "Market".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_input(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Self::default()
        }
    }

    /// Loads a config from JSON; absent keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(BillingsError::ConfigError(
                "input_path must not be empty".to_string(),
            ));
        }
        if self.interim_path == self.output_path {
            return Err(BillingsError::ConfigError(format!(
                "interim_path and output_path both point to {}",
                self.output_path.display()
            )));
        }
        if self.country_type.trim().is_empty() || self.market_type.trim().is_empty() {
            return Err(BillingsError::ConfigError(
                "country_type and market_type must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_export_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.skip_rows, 3);
        assert_eq!(config.period_start_year, 2016);
        assert_eq!(config.country_type, "Countries");
        assert_eq!(config.market_type, "Market");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "input_path": "in.csv", "period_start_year": 2018 }"#)
                .unwrap();

        assert_eq!(config.input_path, PathBuf::from("in.csv"));
        assert_eq!(config.period_start_year, 2018);
        assert_eq!(config.skip_rows, 3);
    }

    #[test]
    fn test_rejects_colliding_output_paths() {
        let mut config = PipelineConfig::with_input("in.csv");
        config.interim_path = PathBuf::from("same.out");
        config.output_path = PathBuf::from("same.out");

        assert!(matches!(
            config.validate(),
            Err(BillingsError::ConfigError(_))
        ));
    }
}
