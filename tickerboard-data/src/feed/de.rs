//! Lenient numeric helpers for the parse boundary between untyped upstream JSON and
//! strongly typed [`TickerRecord`](crate::ticker::TickerRecord)s.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Parse a [`Decimal`] from plain or scientific notation (eg/ `"5.2"`, `"9.1e-6"`).
pub fn decimal_from_str(input: &str) -> Option<Decimal> {
    let input = input.trim();
    if input.contains(['e', 'E']) {
        Decimal::from_scientific(input).ok()
    } else {
        Decimal::from_str(input).ok()
    }
}

/// Parse a [`Decimal`] from a JSON number or numeric string.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => decimal_from_str(&number.to_string()),
        Value::String(string) => decimal_from_str(string),
        _ => None,
    }
}

/// Parse a signed percentage such as `"+1.23%"` or `"−0.45 %"` (unicode minus).
pub fn percent_from_str(input: &str) -> Option<Decimal> {
    let cleaned = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect::<String>();
    decimal_from_str(cleaned.strip_prefix('+').unwrap_or(&cleaned))
}

/// Convert epoch milliseconds into a [`DateTime<Utc>`].
pub fn datetime_from_epoch_ms(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_from_json() {
        struct TestCase {
            input: Value,
            expected: Option<Decimal>,
        }

        let tests = vec![
            TestCase {
                // TC0: JSON number
                input: json!(5.2),
                expected: Some(dec!(5.2)),
            },
            TestCase {
                // TC1: numeric string with trailing zeros
                input: json!("65432.10000000"),
                expected: Some(dec!(65432.10000000)),
            },
            TestCase {
                // TC2: scientific notation
                input: json!("9.1e-6"),
                expected: Some(dec!(0.0000091)),
            },
            TestCase {
                // TC3: non-numeric string
                input: json!("n/a"),
                expected: None,
            },
            TestCase {
                // TC4: null
                input: Value::Null,
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = decimal_from_json(&test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_percent_from_str() {
        assert_eq!(percent_from_str("+1.23%"), Some(dec!(1.23)));
        assert_eq!(percent_from_str("\u{2212}0.45 %"), Some(dec!(-0.45)));
        assert_eq!(percent_from_str("-2%"), Some(dec!(-2)));
        assert_eq!(percent_from_str("%"), None);
    }
}
