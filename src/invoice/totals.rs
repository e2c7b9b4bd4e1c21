use super::record::InvoiceRecord;

/// Recompute every derived amount from quantities, unit prices and the tax rate.
///
/// Prior `amount`, `subtotal`, `tax_amount` and `total` values are ignored,
/// so applying this twice yields the same record.
pub fn recompute(record: &InvoiceRecord) -> InvoiceRecord {
    let mut updated = record.clone();
    recompute_in_place(&mut updated);
    updated
}

/// In-place variant of [`recompute`], used after each edit
pub fn recompute_in_place(record: &mut InvoiceRecord) {
    for item in &mut record.items {
        item.amount = item.quantity * item.unit_price;
    }

    record.subtotal = record.items.iter().map(|i| i.amount).sum();
    record.tax_amount = tax_on(record.subtotal, record.tax_rate);
    record.total = record.subtotal + record.tax_amount;
}

/// Tax owed on `subtotal` at `rate` percent
pub fn tax_on(subtotal: f64, rate: f64) -> f64 {
    subtotal * rate / 100.0
}

/// JSON path of the first number in `record` that is NaN or infinite.
///
/// JSON has no encoding for these, so a record holding one cannot be saved.
pub fn first_non_finite(record: &InvoiceRecord) -> Option<String> {
    for (index, item) in record.items.iter().enumerate() {
        for (name, value) in [
            ("quantity", item.quantity),
            ("unitPrice", item.unit_price),
            ("amount", item.amount),
        ] {
            if !value.is_finite() {
                return Some(format!("items[{index}].{name}"));
            }
        }
    }

    [
        ("subtotal", record.subtotal),
        ("taxRate", record.tax_rate),
        ("taxAmount", record.tax_amount),
        ("total", record.total),
    ]
    .into_iter()
    .find(|(_, value)| !value.is_finite())
    .map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::record::LineItem;

    fn item(quantity: f64, unit_price: f64, amount: f64) -> LineItem {
        LineItem {
            id: format!("{quantity}-{unit_price}"),
            description: "Work".to_string(),
            quantity,
            unit_price,
            amount,
        }
    }

    fn record(items: Vec<LineItem>, tax_rate: f64) -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-1".to_string(),
            date: "2024-03-05".to_string(),
            due_date: "2024-04-04".to_string(),
            customer_name: "Acme".to_string(),
            customer_address: String::new(),
            customer_email: String::new(),
            items,
            subtotal: 999.0,
            tax_rate,
            tax_amount: 999.0,
            total: 999.0,
            notes: String::new(),
        }
    }

    #[test]
    fn derives_all_amounts_from_quantities_and_prices() {
        let r = recompute(&record(vec![item(2.0, 100.0, 0.0), item(3.0, 0.5, 42.0)], 10.0));

        assert_eq!(r.items[0].amount, 200.0);
        assert_eq!(r.items[1].amount, 1.5);
        assert_eq!(r.subtotal, 201.5);
        assert!((r.tax_amount - 20.15).abs() < 1e-9);
        assert!((r.total - 221.65).abs() < 1e-9);
    }

    #[test]
    fn recompute_is_idempotent() {
        let cases = [
            (1.0, 0.0, 0.0),
            (2.5, 19.99, 7.25),
            (1000.0, 0.01, 100.0),
            (0.333, 3.0, 21.0),
        ];

        for (qty, price, rate) in cases {
            let items = vec![item(qty, price, -1.0), item(price, qty, 5.0)];
            let once = recompute(&record(items, rate));
            let twice = recompute(&once);
            assert_eq!(once, twice, "qty={qty} price={price} rate={rate}");
            assert_eq!(once.total, once.subtotal + once.tax_amount);
        }
    }

    #[test]
    fn empty_items_give_zero_totals() {
        let r = recompute(&record(vec![], 20.0));
        assert_eq!(r.subtotal, 0.0);
        assert_eq!(r.tax_amount, 0.0);
        assert_eq!(r.total, 0.0);
    }

    #[test]
    fn reports_first_non_finite_number() {
        let mut r = recompute(&record(vec![item(2.0, 100.0, 0.0)], 10.0));
        assert_eq!(first_non_finite(&r), None);

        r.total = f64::INFINITY;
        assert_eq!(first_non_finite(&r).as_deref(), Some("total"));

        r.items[0].unit_price = f64::NAN;
        assert_eq!(first_non_finite(&r).as_deref(), Some("items[0].unitPrice"));
    }

    #[test]
    fn overflowing_products_are_detected_after_recompute() {
        let r = recompute(&record(vec![item(1e200, 1e200, 0.0)], 0.0));
        assert_eq!(first_non_finite(&r).as_deref(), Some("items[0].amount"));
    }
}
