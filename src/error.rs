use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SaddError {
    #[error("invalid age label: {0}")]
    InvalidAgeLabel(String),

    #[error("age label {label} cannot be inferred from the population data")]
    #[diagnostic(help(
        "the label must equal a canonical bucket, a broad ratio bucket, or align exactly with canonical bucket boundaries"
    ))]
    UnresolvableLabel { label: String },

    #[error("no {sex} ratio row for location {location}")]
    MissingRatioRow { location: String, sex: String },

    #[error("override iso3 code {0} not present in the geographic reference table")]
    OverrideIsoNotFound(String),

    #[error("missing config file sadd-gen.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read dataset {path}: {message}")]
    DatasetRead { path: String, message: String },

    #[error("failed to parse dataset {path}: {message}")]
    DatasetParse { path: String, message: String },

    #[error("dataset {path} is missing required column {column}")]
    MissingColumn { path: String, column: String },

    #[error("duplicate (location, sex) row for {location}/{sex}")]
    DuplicatePopulationRow { location: String, sex: String },

    #[error("failed to write output: {0}")]
    Output(String),
}
