//! Minor-unit amount formatting
//!
//! Amounts move through the system as integer minor units (cents, paise).
//! Formatting to display units happens only at the edges.

use rust_decimal::Decimal;

/// Decimal places for a currency's minor unit.
/// The handful of zero- and three-decimal currencies we may encounter;
/// everything else uses two.
fn minor_unit_scale(currency: &str) -> u32 {
    match currency {
        "JPY" | "KRW" | "VND" => 0,
        "BHD" | "KWD" | "OMR" => 3,
        _ => 2,
    }
}

/// Render an integer minor-unit amount as a display-unit string,
/// e.g. `12345` in `"USD"` becomes `"123.45"`.
pub fn format_minor(amount: i64, currency: &str) -> String {
    Decimal::new(amount, minor_unit_scale(currency)).to_string()
}

/// Render with the currency code attached, e.g. `"123.45 USD"`.
pub fn format_with_currency(amount: i64, currency: &str) -> String {
    format!("{} {}", format_minor(amount, currency), currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_decimal_currencies() {
        assert_eq!(format_minor(12345, "USD"), "123.45");
        assert_eq!(format_minor(5, "EUR"), "0.05");
        assert_eq!(format_minor(-200, "USD"), "-2.00");
    }

    #[test]
    fn test_zero_decimal_currencies() {
        assert_eq!(format_minor(500, "JPY"), "500");
    }

    #[test]
    fn test_with_currency() {
        assert_eq!(format_with_currency(100, "USD"), "1.00 USD");
    }
}
