use chrono::{Duration, NaiveDate};

use super::normalize::{format_date, DEFAULT_DUE_DAYS};
use super::record::{InvoiceRecord, LineItem};
use super::totals::recompute_in_place;

/// Placeholder invoice shown when no API key is configured.
///
/// Only `today` varies, so the result is reproducible.
pub fn sample_invoice(today: NaiveDate) -> InvoiceRecord {
    let items = vec![
        LineItem {
            id: "1".to_string(),
            description: "Web Design Services".to_string(),
            quantity: 1.0,
            unit_price: 1500.0,
            amount: 1500.0,
        },
        LineItem {
            id: "2".to_string(),
            description: "Hosting (Annual)".to_string(),
            quantity: 1.0,
            unit_price: 150.0,
            amount: 150.0,
        },
    ];

    let mut record = InvoiceRecord {
        invoice_number: "INV-0001".to_string(),
        date: format_date(today),
        due_date: format_date(today + Duration::days(DEFAULT_DUE_DAYS)),
        customer_name: "Acme Corporation".to_string(),
        customer_address: "123 Business Ave, Suite 100, San Francisco, CA 94107".to_string(),
        customer_email: "accounting@acmecorp.example".to_string(),
        items,
        subtotal: 0.0,
        tax_rate: 7.5,
        tax_amount: 0.0,
        total: 0.0,
        notes: "Thank you for your business!".to_string(),
    };
    recompute_in_place(&mut record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::validate::validate;

    #[test]
    fn sample_is_valid_and_deterministic() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let a = sample_invoice(today);
        let b = sample_invoice(today);

        assert_eq!(a, b);
        assert!(validate(&a).is_empty());
        assert_eq!(a.due_date, "2025-02-09");
        assert_eq!(a.subtotal, 1650.0);
        assert_eq!(a.tax_amount, 123.75);
        assert_eq!(a.total, 1773.75);
    }
}
