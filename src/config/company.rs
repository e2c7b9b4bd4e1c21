use serde::{Deserialize, Serialize};

/// The "from" block printed on exported PDFs
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            name: "Invoice Mate Inc.".to_string(),
            lines: vec![
                "123 Business Street".to_string(),
                "San Francisco, CA 94107".to_string(),
            ],
            email: Some("billing@invoicemate.example".to_string()),
        }
    }
}
