use regex::Regex;
use std::sync::OnceLock;

/// Average number of weeks in a month, used to turn weekly rents into monthly ones.
pub const WEEKS_IN_A_MONTH: f64 = 4.34524;

fn non_numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.]").unwrap())
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]*\.?[0-9]*").unwrap())
}

/// Converts listing price text such as `"From €1,200 per week"` into a monthly value.
///
/// Surrounding whitespace from the markup is ignored. Text without any digits
/// yields `NaN`; callers decide what to do with it.
pub fn normalize_price(raw: &str) -> f64 {
    let lower = raw.trim().to_lowercase();
    let price = lower.strip_prefix("from ").unwrap_or(&lower);
    let weekly = price.ends_with("per week");

    let digits = non_numeric().replace_all(price, "");
    let value = parse_leading_float(&digits);

    if weekly {
        value * WEEKS_IN_A_MONTH
    } else {
        value
    }
}

// "1.200.50" parses as 1.2, the longest valid prefix.
fn parse_leading_float(digits: &str) -> f64 {
    leading_number()
        .find(digits)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}
