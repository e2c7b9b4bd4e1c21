mod preview;
mod render;

pub use preview::PdfPreview;
pub use render::{address_lines, render_pdf};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Company;
use crate::error::Result;
use crate::export::{ensure_valid, export_file_name};
use crate::invoice::InvoiceRecord;

/// Validate, then write `invoice_<n>.pdf` into `output_dir`
pub fn write_pdf(record: &InvoiceRecord, company: &Company, output_dir: &Path) -> Result<PathBuf> {
    ensure_valid(record)?;

    // Render before touching the filesystem so a failure leaves nothing behind
    let bytes = render_pdf(record, company)?;

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(export_file_name(record, "pdf"));
    fs::write(&path, bytes)?;

    info!(path = %path.display(), "Exported invoice PDF");
    Ok(path)
}
