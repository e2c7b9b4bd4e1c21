use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{InvoiceError, Result};
use crate::invoice::{first_non_finite, validate, InvoiceRecord};

/// Serialize a record as pretty JSON (2-space indent, schema key order).
/// NaN and infinite numbers are refused since they would be written as `null`.
pub fn to_json(record: &InvoiceRecord) -> Result<String> {
    if let Some(field) = first_non_finite(record) {
        return Err(InvoiceError::NonFinite(field));
    }
    Ok(serde_json::to_string_pretty(record)?)
}

pub fn from_json(json: &str) -> Result<InvoiceRecord> {
    Ok(serde_json::from_str(json)?)
}

/// `invoice_<invoiceNumber>.<extension>`, with path separators replaced
pub fn export_file_name(record: &InvoiceRecord, extension: &str) -> String {
    let number: String = record
        .invoice_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("invoice_{number}.{extension}")
}

/// Read a draft record written by `extract` or a previous edit
pub fn load_draft(path: &Path) -> Result<InvoiceRecord> {
    let content = fs::read_to_string(path)?;
    from_json(&content)
}

pub fn save_draft(path: &Path, record: &InvoiceRecord) -> Result<()> {
    fs::write(path, to_json(record)?)?;
    Ok(())
}

/// Refuse to export a record that has validation errors
pub fn ensure_valid(record: &InvoiceRecord) -> Result<()> {
    let errors = validate(record);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(InvoiceError::ValidationFailed(errors))
    }
}

/// Validate, then write `invoice_<n>.json` into `output_dir`
pub fn write_json(record: &InvoiceRecord, output_dir: &Path) -> Result<PathBuf> {
    ensure_valid(record)?;
    fs::create_dir_all(output_dir)?;

    let path = output_dir.join(export_file_name(record, "json"));
    fs::write(&path, to_json(record)?)?;

    info!(path = %path.display(), "Exported invoice JSON");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::sample_invoice;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record() -> InvoiceRecord {
        sample_invoice(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    }

    #[test]
    fn json_round_trips() {
        let mut original = record();
        original.items[0].unit_price = 0.1 + 0.2;
        let parsed = from_json(&to_json(&original).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn json_uses_schema_keys_and_two_space_indent() {
        let json = to_json(&record()).unwrap();
        assert!(json.starts_with(
            "{\n  \"invoiceNumber\": \"INV-0001\",\n  \"date\": \"2024-02-29\",\n  \"dueDate\""
        ));
        assert!(json.contains("\n      \"unitPrice\": 1500.0,"));

        let keys = [
            "invoiceNumber",
            "date",
            "dueDate",
            "customerName",
            "customerAddress",
            "customerEmail",
            "items",
            "subtotal",
            "taxRate",
            "taxAmount",
            "total",
            "notes",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| json.find(&format!("\n  \"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn non_finite_numbers_are_not_serialized() {
        let mut r = record();
        r.items[1].quantity = f64::NAN;
        match to_json(&r) {
            Err(InvoiceError::NonFinite(field)) => assert_eq!(field, "items[1].quantity"),
            other => panic!("expected non-finite error, got {other:?}"),
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.json");
        assert!(save_draft(&path, &r).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn file_names_follow_invoice_number() {
        let mut r = record();
        assert_eq!(export_file_name(&r, "json"), "invoice_INV-0001.json");
        r.invoice_number = "2024/17".to_string();
        assert_eq!(export_file_name(&r, "pdf"), "invoice_2024_17.pdf");
    }

    #[test]
    fn invalid_records_are_not_written() {
        let dir = TempDir::new().unwrap();
        let mut r = record();
        r.customer_name.clear();

        match write_json(&r, dir.path()) {
            Err(InvoiceError::ValidationFailed(errors)) => {
                assert_eq!(errors[0].field, "customerName");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(!dir.path().join("invoice_INV-0001.json").exists());

        let path = write_json(&record(), dir.path()).unwrap();
        assert_eq!(load_draft(&path).unwrap(), record());
    }
}
