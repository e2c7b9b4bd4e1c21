use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::Company;
use crate::error::Result;
use crate::invoice::InvoiceRecord;

use super::render_pdf;

/// A rendered PDF held in a temporary file for viewing.
///
/// The file is deleted when the preview is dropped.
pub struct PdfPreview {
    file: NamedTempFile,
}

impl PdfPreview {
    pub fn create(record: &InvoiceRecord, company: &Company) -> Result<Self> {
        let bytes = render_pdf(record, company)?;

        let mut file = tempfile::Builder::new()
            .prefix("invoice_")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), "Created PDF preview");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the temporary file now, reporting any error
    pub fn release(self) -> Result<()> {
        debug!(path = %self.file.path().display(), "Releasing PDF preview");
        self.file.close()?;
        Ok(())
    }
}
