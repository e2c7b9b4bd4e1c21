use std::path::PathBuf;
use thiserror::Error;

use crate::invoice::ValidationError;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Config directory not found at {0}. Run 'invoice-scan init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to update config file {path}: {source}")]
    ConfigEdit {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Please enter an API key")]
    EmptyApiKey,

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Please upload an image file (JPEG, PNG, etc.): {0}")]
    UnsupportedFile(PathBuf),

    #[error("File is too large ({size} bytes). Please upload an image smaller than {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("An upload is already being processed")]
    Busy,

    #[error("Vision API request failed: {0}")]
    Transport(String),

    #[error("Vision API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Could not read invoice data from model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid invoice JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Please fix {} error{} in the invoice", .0.len(), if .0.len() == 1 { "" } else { "s" })]
    ValidationFailed(Vec<ValidationError>),

    #[error("Item index {index} is out of range (invoice has {count} item(s))")]
    ItemIndexOutOfRange { index: usize, count: usize },

    #[error("Invoice must have at least one item")]
    LastItem,

    #[error("Unknown invoice field '{0}'")]
    UnknownField(String),

    #[error("Invalid number '{value}' for {field}")]
    InvalidNumber { field: String, value: String },

    #[error("{0} is not a finite number")]
    NonFinite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InvoiceError>;
