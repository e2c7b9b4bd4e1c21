use serde::{Deserialize, Serialize};

/// One billable row of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

impl LineItem {
    /// Empty row with a fresh id: quantity 1, unit price 0
    pub fn placeholder() -> Self {
        Self {
            id: new_item_id(),
            description: String::new(),
            quantity: 1.0,
            unit_price: 0.0,
            amount: 0.0,
        }
    }
}

/// The canonical invoice record edited and exported by the tool.
///
/// Dates stay strings so that whatever the user typed survives until the
/// validator reports on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub date: String,
    pub due_date: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub notes: String,
}

/// A field-scoped validation failure, keyed the way the form looks errors up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Where an upload is in the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Complete,
    Error,
}

impl ProcessingStatus {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Uploading | Self::Processing)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

pub(crate) fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
