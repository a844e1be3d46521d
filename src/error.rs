use std::path::PathBuf;
use thiserror::Error;

/// The main error type for platescan operations.
#[derive(Debug, Error)]
pub enum PlatescanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to parse detections from {path}: {source}")]
    DetectionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid detections in {path}: {message}")]
    InvalidDetections { path: PathBuf, message: String },

    #[error("Failed to parse probabilities from {path}: {source}")]
    ProbabilitiesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid probabilities: {message}")]
    InvalidProbabilities { message: String },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("{service} API key not configured. Set the {env} environment variable.")]
    MissingApiKey { service: &'static str, env: String },

    #[error("{service} request failed: {message}")]
    Http {
        service: &'static str,
        message: String,
    },

    #[error("Unexpected {service} response: {message}")]
    ApiResponse {
        service: &'static str,
        message: String,
    },

    #[error("Failed to create output file {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report: {source}")]
    ReportWrite {
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported {kind}: {value}")]
    Unsupported { kind: &'static str, value: String },
}
