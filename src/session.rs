use chrono::{Local, NaiveDate};
use tracing::{error, info};

use crate::error::{InvoiceError, Result};
use crate::extract::Extractor;
use crate::invoice::{normalize_on, InvoiceRecord, ProcessingStatus};
use crate::upload::ImageUpload;

/// One editing session: at most one extraction in flight, and the record
/// it produced.
#[derive(Debug, Default)]
pub struct Session {
    status: ProcessingStatus,
    record: Option<InvoiceRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn record(&self) -> Option<&InvoiceRecord> {
        self.record.as_ref()
    }

    pub fn into_record(self) -> Option<InvoiceRecord> {
        self.record
    }

    /// Run `upload` through `extractor` and the normalizer
    pub fn process(
        &mut self,
        upload: &ImageUpload,
        extractor: &dyn Extractor,
    ) -> Result<&InvoiceRecord> {
        self.process_on(upload, extractor, Local::now().date_naive())
    }

    /// [`Session::process`] with an explicit date for defaults
    pub fn process_on(
        &mut self,
        upload: &ImageUpload,
        extractor: &dyn Extractor,
        today: NaiveDate,
    ) -> Result<&InvoiceRecord> {
        if self.status.is_busy() {
            return Err(InvoiceError::Busy);
        }

        self.status = ProcessingStatus::Uploading;
        info!(file = %upload.file_name, status = %self.status, "Upload started");

        self.status = ProcessingStatus::Processing;
        match extractor.extract(upload) {
            Ok(raw) => {
                let record = normalize_on(&raw, today);
                self.status = ProcessingStatus::Complete;
                info!(
                    invoice = %record.invoice_number,
                    items = record.items.len(),
                    status = %self.status,
                    "Extraction complete"
                );
                Ok(&*self.record.insert(record))
            }
            Err(e) => {
                self.status = ProcessingStatus::Error;
                error!(error = %e, status = %self.status, "Extraction failed");
                Err(e)
            }
        }
    }
}
