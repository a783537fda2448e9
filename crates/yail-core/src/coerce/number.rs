//! Number rendering and numeric readings of text.

/// Magnitude at which numbers switch to scientific notation.
const SCIENTIFIC_THRESHOLD: f64 = 1e8;

/// Render a number the way YAIL displays it.
///
/// - infinities render as `+infinity` / `-infinity`
/// - magnitudes at or above 1e8 use normalized scientific notation with five
///   significant digits (`9.8765E7`)
/// - whole values have no fractional part
/// - everything else uses the shortest decimal that round-trips
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "+infinity" } else { "-infinity" }.to_string();
    }
    if n.abs() >= SCIENTIFIC_THRESHOLD {
        return format!("{:.4E}", n);
    }
    if n.fract() == 0.0 {
        // Below the threshold this always fits in i64; also folds -0 into 0
        return (n as i64).to_string();
    }
    n.to_string()
}

/// Lenient numeric reading used by arithmetic and `number` coercion:
/// surrounding whitespace is ignored and the infinity tokens are accepted.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed {
        "+infinity" => Some(f64::INFINITY),
        "-infinity" => Some(f64::NEG_INFINITY),
        _ => yail_ir::parse_number(trimmed),
    }
}

/// Numeric reading used by equality.
///
/// Same as [`parse_numeric`], except that a literal with a leading zero
/// followed by another digit only counts as numeric when its value is zero.
/// `"00"` reads as 0, while `"01"` has no numeric reading and is compared as
/// text.
pub fn canonical_numeric(text: &str) -> Option<f64> {
    let n = parse_numeric(text)?;
    if n != 0.0 && has_leading_zero(text.trim()) {
        return None;
    }
    Some(n)
}

fn has_leading_zero(literal: &str) -> bool {
    let digits = literal.trim_start_matches(['+', '-']).as_bytes();
    digits.len() >= 2 && digits[0] == b'0' && digits[1].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_numbers() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(99_999_999.0), "99999999");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(format_number(98_765_432.1), "9.8765E7");
        assert_eq!(format_number(-98_765_432.1), "-9.8765E7");
        assert_eq!(format_number(1e8), "1.0000E8");
        assert_eq!(format_number(123_456_789_012.0), "1.2346E11");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(format_number(f64::INFINITY), "+infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("  12  "), Some(12.0));
        assert_eq!(parse_numeric("01"), Some(1.0));
        assert_eq!(parse_numeric("+infinity"), Some(f64::INFINITY));
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn test_canonical_numeric_leading_zero() {
        assert_eq!(canonical_numeric("00"), Some(0.0));
        assert_eq!(canonical_numeric(" 0 "), Some(0.0));
        assert_eq!(canonical_numeric("0.5"), Some(0.5));
        assert_eq!(canonical_numeric("01"), None);
        assert_eq!(canonical_numeric("-007"), None);
    }
}
