//! Amount parsing for credit reports.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::AMOUNT_VALUE;

/// Parse an amount at the start of `s`, returning it with the bytes consumed.
pub fn parse_amount(s: &str) -> Option<(Decimal, usize)> {
    let caps = AMOUNT_VALUE.captures(s)?;
    let amount = parse_indian_amount(&caps[1])?;
    Some((amount, caps[0].len()))
}

/// Parse an amount written with Indian or international digit grouping
/// (e.g. "1,50,000", "150,000.50", "2000").
pub fn parse_indian_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Format an amount with Indian grouping (12,34,567.00).
pub fn format_indian_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    // Last three digits form one group, the rest go in pairs
    let head_len = digits.len().saturating_sub(3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && i < head_len && (head_len - i) % 2 == 0 {
            formatted.push(',');
        }
        if i == head_len && head_len > 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_indian_amount() {
        assert_eq!(parse_indian_amount("1,50,000"), Some(dec("150000")));
        assert_eq!(parse_indian_amount("150,000.50"), Some(dec("150000.50")));
        assert_eq!(parse_indian_amount("2000"), Some(dec("2000")));
        assert_eq!(parse_indian_amount("-"), None);
    }

    #[test]
    fn test_parse_amount_prefix() {
        assert_eq!(parse_amount("Rs. 1,25,000 sanctioned"), Some((dec("125000"), 12)));
        assert_eq!(parse_amount("₹ 5,000").map(|a| a.0), Some(dec("5000")));
        assert_eq!(parse_amount("INR 75000.25").map(|a| a.0), Some(dec("75000.25")));
        assert_eq!(parse_amount("- "), None);
        assert_eq!(parse_amount("NA"), None);
    }

    #[test]
    fn test_format_indian_amount() {
        assert_eq!(format_indian_amount(dec("1234567")), "12,34,567.00");
        assert_eq!(format_indian_amount(dec("150000.5")), "1,50,000.50");
        assert_eq!(format_indian_amount(dec("999")), "999.00");
        assert_eq!(format_indian_amount(dec("1000")), "1,000.00");
        assert_eq!(format_indian_amount(dec("-25000")), "-25,000.00");
    }
}
