use std::sync::LazyLock;

use chrono::{Duration, Local, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::record::{new_item_id, InvoiceRecord, LineItem};
use super::totals::tax_on;
use super::validate::parse_calendar_date;

/// Days between the invoice date and the default due date
pub const DEFAULT_DUE_DAYS: i64 = 30;

static SLASHED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$").expect("valid slashed date pattern")
});

/// Coerce a model's (possibly malformed) JSON answer into a complete record,
/// using the local calendar date for missing dates.
pub fn normalize(raw: &Value) -> InvoiceRecord {
    normalize_on(raw, Local::now().date_naive())
}

/// Same as [`normalize`] with an explicit "today".
///
/// Never fails: anything missing or unreadable falls back to a default.
/// Explicit subtotal, tax amount and total are taken verbatim here and only
/// here; later edits re-derive them.
pub fn normalize_on(raw: &Value, today: NaiveDate) -> InvoiceRecord {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let mut items: Vec<LineItem> = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(normalize_item).collect())
        .unwrap_or_default();

    if items.is_empty() {
        items.push(LineItem::placeholder());
    }

    let subtotal = number_field(obj, "subtotal")
        .unwrap_or_else(|| finite_or_zero(items.iter().map(|i| i.amount).sum()));
    let tax_rate = number_field(obj, "taxRate").unwrap_or(0.0);
    let tax_amount = number_field(obj, "taxAmount")
        .unwrap_or_else(|| finite_or_zero(tax_on(subtotal, tax_rate)));
    let total = number_field(obj, "total").unwrap_or(finite_or_zero(subtotal + tax_amount));

    let date = match string_field(obj, "date").filter(|d| !d.trim().is_empty()) {
        Some(d) => repair_date(&d),
        None => format_date(today),
    };

    let due_date = match string_field(obj, "dueDate").filter(|d| !d.trim().is_empty()) {
        Some(d) => d,
        None => {
            let base = parse_calendar_date(&date).unwrap_or(today);
            format_date(base + Duration::days(DEFAULT_DUE_DAYS))
        }
    };

    debug!(
        items = items.len(),
        subtotal, tax_rate, total, "Normalized extraction result"
    );

    InvoiceRecord {
        invoice_number: string_field(obj, "invoiceNumber").unwrap_or_default(),
        date,
        due_date,
        customer_name: string_field(obj, "customerName").unwrap_or_default(),
        customer_address: string_field(obj, "customerAddress").unwrap_or_default(),
        customer_email: string_field(obj, "customerEmail").unwrap_or_default(),
        items,
        subtotal,
        tax_rate,
        tax_amount,
        total,
        notes: string_field(obj, "notes").unwrap_or_default(),
    }
}

fn normalize_item(entry: &Value) -> LineItem {
    let empty = Map::new();
    let obj = entry.as_object().unwrap_or(&empty);

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => new_item_id(),
    };

    let quantity = number_field(obj, "quantity").unwrap_or(0.0);
    let unit_price = number_field(obj, "unitPrice").unwrap_or(0.0);
    let amount = number_field(obj, "amount").unwrap_or(finite_or_zero(quantity * unit_price));

    LineItem {
        id,
        description: string_field(obj, "description").unwrap_or_default(),
        quantity,
        unit_price,
        amount,
    }
}

/// Lenient numeric reading: JSON numbers as-is, strings with currency
/// symbols and thousands separators stripped. `None` when nothing parses.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Derived amounts that overflow are read as missing
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(coerce_number)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Rewrite `D/M/Y` (day first, 2-digit years in the 2000s) as `YYYY-MM-DD`.
/// Anything else is returned unchanged.
pub fn repair_date(value: &str) -> String {
    let trimmed = value.trim();
    let Some(caps) = SLASHED_DATE_RE.captures(trimmed) else {
        return value.to_string();
    };

    let day = &caps[1];
    let month = &caps[2];
    let year = &caps[3];
    let year = if year.len() == 2 {
        format!("20{year}")
    } else {
        year.to_string()
    };

    format!("{year}-{month:0>2}-{day:0>2}")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
