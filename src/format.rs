/// On-screen currency in en-US style: `$1,234.50`, `-$5.00`
pub fn currency(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let grouped = group_thousands(whole);

    // -0.001 rounds to zero and must not print as "-$0.00"
    if value < 0.0 && rounded != "0.00" {
        format!("-${grouped}.{frac}")
    } else {
        format!("${grouped}.{frac}")
    }
}

/// PDF amounts: `$` followed by two decimals, no grouping
pub fn pdf_amount(value: f64) -> String {
    format!("${value:.2}")
}

/// Quantities without trailing zeros: `2`, `1.5`
pub fn quantity(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Tax rate shown inside the "Tax (x%)" label
pub fn percent(value: f64) -> String {
    quantity(value)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
