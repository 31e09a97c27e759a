use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SaddError;
use crate::geo::{OverrideEntry, default_overrides};
use crate::interval::AgeLabel;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub age_labels: Option<Vec<String>>,
    #[serde(default)]
    pub datasets: Option<DatasetPaths>,
    #[serde(default)]
    pub overrides: Option<Vec<OverrideEntry>>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetPaths {
    pub population: String,
    pub female_ratios: String,
    pub male_ratios: String,
    pub reference: String,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            population: "Datasets/PopulationAgeSex.csv".to_string(),
            female_ratios: "Datasets/PercFemalePop.csv".to_string(),
            male_ratios: "Datasets/PercMalePop.csv".to_string(),
            reference: "Datasets/Geoentities.csv".to_string(),
        }
    }
}

/// Age labels used when the config omits them.
pub fn default_age_labels() -> Vec<String> {
    [
        "0-4", "0-17", "5-14", "15-24", "25-64", "65+", "0+", "0-1", "5-11", "12-14", "12-16",
        "15-17",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub age_labels: Vec<AgeLabel>,
    pub datasets: DatasetPaths,
    pub overrides: Vec<OverrideEntry>,
    pub output: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SaddError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("sadd-gen.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(SaddError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SaddError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| SaddError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    /// Validate and default-fill a parsed config. Malformed age labels fail
    /// here, before any dataset is touched.
    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SaddError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let label_strings = match config.age_labels {
            Some(labels) if !labels.is_empty() => labels,
            _ => default_age_labels(),
        };
        let age_labels = label_strings
            .iter()
            .map(|label| label.parse())
            .collect::<Result<Vec<AgeLabel>, SaddError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            age_labels,
            datasets: config.datasets.unwrap_or_default(),
            overrides: config.overrides.unwrap_or_else(default_overrides),
            output: Utf8PathBuf::from(
                config
                    .output
                    .unwrap_or_else(|| "Population_Age_Sex.csv".to_string()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolve_config_defaults() {
        let config = Config {
            schema_version: None,
            age_labels: None,
            datasets: None,
            overrides: None,
            output: None,
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.age_labels.len(), default_age_labels().len());
        assert_eq!(resolved.overrides.len(), 5);
        assert_eq!(resolved.output, Utf8PathBuf::from("Population_Age_Sex.csv"));
    }

    #[test]
    fn resolve_config_rejects_malformed_label() {
        let config = Config {
            schema_version: None,
            age_labels: Some(vec!["0-4".to_string(), "young".to_string()]),
            datasets: None,
            overrides: None,
            output: None,
        };

        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, SaddError::InvalidAgeLabel(_));
    }
}
