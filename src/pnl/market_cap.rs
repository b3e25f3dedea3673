/// Parse a human-entered market cap such as `"$1.5m"`, `"150k"` or `"2,300,000"`.
///
/// Empty input yields `0.0`; anything that does not parse yields `NaN`.
/// Callers must range-check the result before persisting it.
pub fn parse_market_cap(input: &str) -> f64 {
    if input.trim().is_empty() {
        return 0.0;
    }

    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
        .collect::<String>()
        .to_lowercase();

    let (number, multiplier) = match cleaned.chars().last() {
        Some('k') => (&cleaned[..cleaned.len() - 1], 1_000.0),
        Some('m') => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        Some('b') => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    parse_finite(number).map(|n| n * multiplier).unwrap_or(f64::NAN)
}

/// Parse a plain decimal such as a position size. `NaN` when invalid.
pub fn parse_position_size(input: &str) -> f64 {
    parse_finite(input.trim()).unwrap_or(f64::NAN)
}

/// `Some(value)` only when `value` is finite and strictly positive.
pub fn positive(value: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

// "inf" and "nan" are valid f64 literals in Rust; not here.
fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Compact display form, e.g. `1.50m`. Empty for zero or non-finite values.
pub fn format_market_cap(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return String::new();
    }
    if value >= 1_000_000_000.0 {
        return format!("{:.2}b", value / 1_000_000_000.0);
    }
    if value >= 1_000_000.0 {
        return format!("{:.2}m", value / 1_000_000.0);
    }
    if value >= 1_000.0 {
        return format!("{:.2}k", value / 1_000.0);
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_suffixes() {
        assert_eq!(parse_market_cap("1.5m"), 1_500_000.0);
        assert_eq!(parse_market_cap("150k"), 150_000.0);
        assert_eq!(parse_market_cap("$2.3b"), 2_300_000_000.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(parse_market_cap(""), 0.0);
        assert_eq!(parse_market_cap("   "), 0.0);
    }

    #[test]
    fn test_ignores_case_commas_and_spaces() {
        assert_eq!(parse_market_cap(" 1.5 M "), 1_500_000.0);
        assert_eq!(parse_market_cap("$2,300,000"), 2_300_000.0);
        assert_eq!(parse_market_cap("500"), 500.0);
    }

    #[test]
    fn test_garbage_is_nan() {
        assert!(parse_market_cap("abc").is_nan());
        assert!(parse_market_cap("m").is_nan());
        assert!(parse_market_cap("$").is_nan());
        assert!(parse_market_cap("1.5x").is_nan());
        assert!(parse_market_cap("inf").is_nan());
    }

    #[test]
    fn test_negative_values_parse_but_are_not_positive() {
        let value = parse_market_cap("-5k");
        assert_eq!(value, -5_000.0);
        assert_eq!(positive(value), None);
    }

    #[test]
    fn test_position_size() {
        assert_eq!(parse_position_size("2.5"), 2.5);
        assert_eq!(positive(parse_position_size("-5")), None);
        assert!(parse_position_size("ten").is_nan());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_market_cap(0.0), "");
        assert_eq!(format_market_cap(f64::NAN), "");
        assert_eq!(format_market_cap(500.0), "500");
        assert_eq!(format_market_cap(150_000.0), "150.00k");
        assert_eq!(format_market_cap(1_500_000.0), "1.50m");
        assert_eq!(format_market_cap(2_300_000_000.0), "2.30b");
    }

    #[test]
    fn test_formatted_value_parses_back() {
        assert_eq!(parse_market_cap(&format_market_cap(1_500_000.0)), 1_500_000.0);
    }
}
