use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::error::{InvoiceError, Result};

/// An image accepted for extraction
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, rejecting oversized and non-image files
    /// before anything is sent anywhere.
    pub fn open(path: &Path, max_bytes: u64) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            warn!(path = %path.display(), size, limit = max_bytes, "Rejected oversized upload");
            return Err(InvoiceError::FileTooLarge {
                size,
                limit: max_bytes,
            });
        }

        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::from_bytes(file_name, bytes).map_err(|e| match e {
            InvoiceError::UnsupportedFile(_) => InvoiceError::UnsupportedFile(path.to_path_buf()),
            other => other,
        })
    }

    /// Accept in-memory bytes when they sniff as an image
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let kind = infer::get(&bytes)
            .filter(|k| k.matcher_type() == infer::MatcherType::Image)
            .ok_or_else(|| InvoiceError::UnsupportedFile(PathBuf::from(&file_name)))?;

        info!(file = %file_name, mime = kind.mime_type(), size = bytes.len(), "Accepted upload");

        Ok(Self {
            file_name,
            mime_type: kind.mime_type(),
            bytes,
        })
    }

    /// Inline `data:` URL carrying the image as base64
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}
