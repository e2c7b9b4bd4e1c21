mod payload;
mod vision;

pub use payload::{locate_json, parse_payload};
pub use vision::VisionClient;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::config::VisionSettings;
use crate::error::Result;
use crate::invoice::sample_invoice;
use crate::upload::ImageUpload;

/// Turns an invoice image into loosely structured JSON for the normalizer
pub trait Extractor {
    fn extract(&self, upload: &ImageUpload) -> Result<Value>;
}

/// Returns the deterministic placeholder invoice instead of calling a model
pub struct SampleExtractor {
    pub today: NaiveDate,
}

impl Extractor for SampleExtractor {
    fn extract(&self, upload: &ImageUpload) -> Result<Value> {
        info!(file = %upload.file_name, "No API key configured, using sample invoice data");
        Ok(serde_json::to_value(sample_invoice(self.today))?)
    }
}

/// Pick the extractor for the configured credentials.
///
/// A key selects the vision model; no key selects sample data. A failed
/// model call is reported as an error and never replaced by sample data.
pub fn extractor_for(settings: &VisionSettings, today: NaiveDate) -> Box<dyn Extractor> {
    match settings.api_key() {
        Some(key) => Box::new(VisionClient::new(settings.clone(), key)),
        None => Box::new(SampleExtractor { today }),
    }
}
