use std::path::PathBuf;

use grabview_core::{SchemaError, ViewError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema file error: {0}")]
    SchemaFile(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Extraction failed: {0}")]
    View(#[from] ViewError),

    #[error("Schema {schema}, member `{member}`: {reason}")]
    InvalidMember {
        schema: String,
        member: String,
        reason: String,
    },

    #[error("Unknown transform `{0}`")]
    UnknownTransform(String),

    #[error("Unknown coercion `{0}`")]
    UnknownCoercion(String),
}
