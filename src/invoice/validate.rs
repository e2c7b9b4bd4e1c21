use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::record::{InvoiceRecord, ValidationError};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Check a record before export. Every check runs; an empty result means valid.
pub fn validate(record: &InvoiceRecord) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if record.invoice_number.is_empty() {
        errors.push(ValidationError::new("invoiceNumber", "Invoice number is required"));
    }

    if record.date.is_empty() {
        errors.push(ValidationError::new("date", "Invoice date is required"));
    } else if parse_calendar_date(&record.date).is_none() {
        errors.push(ValidationError::new("date", "Invoice date is invalid"));
    }

    if !record.due_date.is_empty() && parse_calendar_date(&record.due_date).is_none() {
        errors.push(ValidationError::new("dueDate", "Due date is invalid"));
    }

    if record.customer_name.is_empty() {
        errors.push(ValidationError::new("customerName", "Customer name is required"));
    }

    if !record.customer_email.is_empty() && !is_valid_email(&record.customer_email) {
        errors.push(ValidationError::new("customerEmail", "Customer email is invalid"));
    }

    if record.items.is_empty() {
        errors.push(ValidationError::new(
            "items",
            "At least one invoice item is required",
        ));
    }

    for (index, item) in record.items.iter().enumerate() {
        let n = index + 1;

        if item.description.is_empty() {
            errors.push(ValidationError::new(
                format!("items[{index}].description"),
                format!("Item #{n} description is required"),
            ));
        }

        if item.quantity.is_nan() || item.quantity <= 0.0 {
            errors.push(ValidationError::new(
                format!("items[{index}].quantity"),
                format!("Item #{n} quantity must be a positive number"),
            ));
        }

        if item.unit_price.is_nan() || item.unit_price < 0.0 {
            errors.push(ValidationError::new(
                format!("items[{index}].unitPrice"),
                format!("Item #{n} unit price must be a non-negative number"),
            ));
        }
    }

    if record.total.is_nan() || record.total < 0.0 {
        errors.push(ValidationError::new(
            "total",
            "Total amount must be a non-negative number",
        ));
    }

    errors
}

/// Parse a calendar date written as `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DDTHH:MM:SS`
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|d| d.date())
        })
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::record::LineItem;

    fn valid_record() -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-0042".to_string(),
            date: "2024-03-05".to_string(),
            due_date: "2024-04-04".to_string(),
            customer_name: "Acme Corporation".to_string(),
            customer_address: "1 Main St, Springfield".to_string(),
            customer_email: "billing@acme.example".to_string(),
            items: vec![LineItem {
                id: "a".to_string(),
                description: "Design".to_string(),
                quantity: 2.0,
                unit_price: 100.0,
                amount: 200.0,
            }],
            subtotal: 200.0,
            tax_rate: 10.0,
            tax_amount: 20.0,
            total: 220.0,
            notes: String::new(),
        }
    }

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn valid_record_has_no_errors() {
        assert!(validate(&valid_record()).is_empty());
    }

    #[test]
    fn empty_items_reported_on_items_field() {
        let mut r = valid_record();
        r.items.clear();
        let errors = validate(&r);
        assert_eq!(fields(&errors), vec!["items"]);
        assert_eq!(errors[0].message, "At least one invoice item is required");
    }

    #[test]
    fn zero_quantity_is_addressed_by_item_path() {
        let mut r = valid_record();
        r.items[0].quantity = 0.0;
        let errors = validate(&r);
        assert_eq!(fields(&errors), vec!["items[0].quantity"]);
        assert_eq!(errors[0].message, "Item #1 quantity must be a positive number");
    }

    #[test]
    fn item_checks_are_independent() {
        let mut r = valid_record();
        r.items.push(LineItem {
            id: "b".to_string(),
            description: String::new(),
            quantity: f64::NAN,
            unit_price: -1.0,
            amount: 0.0,
        });
        assert_eq!(
            fields(&validate(&r)),
            vec![
                "items[1].description",
                "items[1].quantity",
                "items[1].unitPrice"
            ]
        );
    }

    #[test]
    fn email_is_optional_but_checked_when_present() {
        let mut r = valid_record();
        r.customer_email = "not-an-email".to_string();
        assert_eq!(fields(&validate(&r)), vec!["customerEmail"]);

        r.customer_email = String::new();
        assert!(validate(&r).is_empty());
    }

    #[test]
    fn dates_required_and_parsed() {
        let mut r = valid_record();
        r.date = String::new();
        r.due_date = "2024-13-40".to_string();
        let errors = validate(&r);
        assert_eq!(fields(&errors), vec!["date", "dueDate"]);
        assert_eq!(errors[0].message, "Invoice date is required");
        assert_eq!(errors[1].message, "Due date is invalid");

        r.date = "5th of March".to_string();
        r.due_date = String::new();
        let errors = validate(&r);
        assert_eq!(fields(&errors), vec!["date"]);
        assert_eq!(errors[0].message, "Invoice date is invalid");
    }

    #[test]
    fn reports_everything_at_once() {
        let mut r = valid_record();
        r.invoice_number.clear();
        r.customer_name.clear();
        r.total = -1.0;
        assert_eq!(
            fields(&validate(&r)),
            vec!["invoiceNumber", "customerName", "total"]
        );
    }

    #[test]
    fn parses_supported_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_calendar_date("2024-03-05"), expected);
        assert_eq!(parse_calendar_date("2024-03-05T10:00:00Z"), expected);
        assert_eq!(parse_calendar_date("2024-03-05T10:00:00"), expected);
        assert_eq!(parse_calendar_date("2024-02-30"), None);
    }
}
