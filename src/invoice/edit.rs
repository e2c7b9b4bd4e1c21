use tracing::debug;

use super::record::{new_item_id, InvoiceRecord, LineItem};
use super::totals::{first_non_finite, recompute_in_place};
use crate::error::{InvoiceError, Result};

/// Partial update of a line item; `None` leaves the value alone
#[derive(Debug, Default, Clone)]
pub struct ItemUpdate {
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
}

/// Highest tax rate accepted from a form edit, in percent
const MAX_TAX_RATE: f64 = 100.0;

/// Set a top-level field by its JSON name (`invoiceNumber`, `taxRate`, ...).
///
/// Changing `taxRate` re-derives the totals; text fields do not touch them.
pub fn set_field(record: &mut InvoiceRecord, field: &str, value: &str) -> Result<()> {
    match field {
        "invoiceNumber" => record.invoice_number = value.to_string(),
        "date" => record.date = value.to_string(),
        "dueDate" => record.due_date = value.to_string(),
        "customerName" => record.customer_name = value.to_string(),
        "customerAddress" => record.customer_address = value.to_string(),
        "customerEmail" => record.customer_email = value.to_string(),
        "notes" => record.notes = value.to_string(),
        "taxRate" => {
            let rate = parse_number(field, value)?;
            if !(0.0..=MAX_TAX_RATE).contains(&rate) {
                return Err(InvoiceError::InvalidNumber {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
            commit(record, |r| r.tax_rate = rate)?;
        }
        other => return Err(InvoiceError::UnknownField(other.to_string())),
    }

    debug!(field, "Updated invoice field");
    Ok(())
}

/// Append a line item and re-derive totals. Returns the new item's index.
pub fn add_item(
    record: &mut InvoiceRecord,
    description: Option<String>,
    quantity: Option<f64>,
    unit_price: Option<f64>,
) -> Result<usize> {
    let item = LineItem {
        id: new_item_id(),
        description: description.unwrap_or_default(),
        quantity: finite("quantity", quantity.unwrap_or(1.0))?,
        unit_price: finite("unitPrice", unit_price.unwrap_or(0.0))?,
        amount: 0.0,
    };
    commit(record, |r| r.items.push(item))?;
    Ok(record.items.len() - 1)
}

/// Apply `update` to the item at `index`; the item's amount follows the edit
pub fn update_item(record: &mut InvoiceRecord, index: usize, update: ItemUpdate) -> Result<()> {
    let count = record.items.len();
    if index >= count {
        return Err(InvoiceError::ItemIndexOutOfRange { index, count });
    }
    let quantity = update.quantity.map(|q| finite("quantity", q)).transpose()?;
    let unit_price = update.unit_price.map(|p| finite("unitPrice", p)).transpose()?;

    commit(record, |r| {
        let item = &mut r.items[index];
        if let Some(description) = update.description {
            item.description = description;
        }
        if let Some(quantity) = quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = unit_price {
            item.unit_price = unit_price;
        }
    })
}

/// Remove the item at `index`. The last remaining item cannot be removed.
pub fn remove_item(record: &mut InvoiceRecord, index: usize) -> Result<LineItem> {
    let count = record.items.len();
    if index >= count {
        return Err(InvoiceError::ItemIndexOutOfRange { index, count });
    }
    if count == 1 {
        return Err(InvoiceError::LastItem);
    }

    let removed = record.items.remove(index);
    recompute_in_place(record);
    Ok(removed)
}

/// Parse a user-typed number, e.g. "7.5" or "$1,200"
pub fn parse_number(field: &str, value: &str) -> Result<f64> {
    super::normalize::coerce_number(&serde_json::Value::String(value.to_string())).ok_or_else(
        || InvoiceError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        },
    )
}

fn finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvoiceError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Apply `change` to a copy, recompute, and keep the copy only when every
/// derived amount is still finite
fn commit(record: &mut InvoiceRecord, change: impl FnOnce(&mut InvoiceRecord)) -> Result<()> {
    let mut updated = record.clone();
    change(&mut updated);
    recompute_in_place(&mut updated);

    if let Some(field) = first_non_finite(&updated) {
        return Err(InvoiceError::NonFinite(field));
    }
    *record = updated;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::normalize::normalize_on;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record() -> InvoiceRecord {
        let raw = json!({
            "invoiceNumber": "INV-7",
            "items": [{ "description": "Design", "quantity": 2, "unitPrice": 100, "amount": 150 }],
            "subtotal": 150,
            "taxRate": 10
        });
        normalize_on(&raw, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn item_edit_overrides_extracted_amount() {
        let mut r = record();
        assert_eq!(r.items[0].amount, 150.0);

        update_item(
            &mut r,
            0,
            ItemUpdate {
                quantity: Some(3.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(r.items[0].amount, 300.0);
        assert_eq!(r.subtotal, 300.0);
        assert_eq!(r.tax_amount, 30.0);
        assert_eq!(r.total, 330.0);
    }

    #[test]
    fn tax_rate_change_recomputes() {
        let mut r = record();
        set_field(&mut r, "taxRate", "20").unwrap();
        assert_eq!(r.subtotal, 200.0);
        assert_eq!(r.tax_amount, 40.0);
        assert_eq!(r.total, 240.0);
    }

    #[test]
    fn text_fields_leave_totals_alone() {
        let mut r = record();
        set_field(&mut r, "customerName", "Globex").unwrap();
        assert_eq!(r.customer_name, "Globex");
        assert_eq!(r.subtotal, 150.0);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_numbers() {
        let mut r = record();
        assert!(matches!(
            set_field(&mut r, "subtotal", "5"),
            Err(InvoiceError::UnknownField(_))
        ));
        assert!(matches!(
            set_field(&mut r, "taxRate", "ten"),
            Err(InvoiceError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn add_then_remove_items() {
        let mut r = record();
        let idx = add_item(&mut r, Some("Hosting".into()), None, Some(50.0)).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(r.items[1].quantity, 1.0);
        assert_eq!(r.subtotal, 250.0);
        assert_ne!(r.items[0].id, r.items[1].id);

        let removed = remove_item(&mut r, 0).unwrap();
        assert_eq!(removed.description, "Design");
        assert_eq!(r.subtotal, 50.0);

        assert!(matches!(remove_item(&mut r, 0), Err(InvoiceError::LastItem)));
        assert!(matches!(
            remove_item(&mut r, 4),
            Err(InvoiceError::ItemIndexOutOfRange { index: 4, count: 1 })
        ));
    }

    #[test]
    fn tax_rate_must_be_a_percentage() {
        let mut r = record();
        for rate in ["-5", "500", "100.5"] {
            assert!(
                matches!(
                    set_field(&mut r, "taxRate", rate),
                    Err(InvoiceError::InvalidNumber { .. })
                ),
                "rate = {rate}"
            );
        }
        assert_eq!(r.tax_rate, 10.0);

        set_field(&mut r, "taxRate", "100").unwrap();
        assert_eq!(r.total, 400.0);
        set_field(&mut r, "taxRate", "0").unwrap();
        assert_eq!(r.total, 200.0);
    }

    #[test]
    fn non_finite_item_values_are_rejected() {
        let mut r = record();
        let before = r.clone();

        for quantity in [f64::NAN, f64::INFINITY, "-inf".parse().unwrap()] {
            let update = ItemUpdate {
                quantity: Some(quantity),
                ..Default::default()
            };
            assert!(matches!(
                update_item(&mut r, 0, update),
                Err(InvoiceError::InvalidNumber { .. })
            ));
        }
        assert!(matches!(
            add_item(&mut r, None, None, Some(f64::NAN)),
            Err(InvoiceError::InvalidNumber { .. })
        ));
        assert_eq!(r, before);
    }

    #[test]
    fn overflowing_edit_leaves_record_unchanged() {
        let mut r = record();
        let before = r.clone();

        let update = ItemUpdate {
            quantity: Some(1e200),
            unit_price: Some(1e200),
            ..Default::default()
        };
        match update_item(&mut r, 0, update) {
            Err(InvoiceError::NonFinite(field)) => assert_eq!(field, "items[0].amount"),
            other => panic!("expected non-finite error, got {other:?}"),
        }
        assert_eq!(r, before);

        let saved = crate::export::to_json(&r).unwrap();
        assert_eq!(crate::export::from_json(&saved).unwrap(), r);
    }
}
