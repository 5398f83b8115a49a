//! Order numbers: `ORD-YYYYMMDD-NNNN`.
//!
//! The sequence restarts at 0001 each calendar day (UTC) and is shared by
//! every outlet. Past 9999 the number simply grows wider.

use chrono::NaiveDate;

use crate::error::ValidationError;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Key used by the storage sequence for `date` (`YYYYMMDD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn format_order_number(date: NaiveDate, sequence: u32) -> String {
    format!("{ORDER_NUMBER_PREFIX}-{}-{sequence:04}", day_key(date))
}

/// Splits an order number back into its day and sequence.
pub fn parse_order_number(value: &str) -> Result<(NaiveDate, u32), ValidationError> {
    let bad = |reason: &str| ValidationError::InvalidFormat {
        field: "order_number".to_string(),
        reason: reason.to_string(),
    };

    let mut parts = value.split('-');
    let (Some(prefix), Some(day), Some(seq), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad("expected ORD-YYYYMMDD-NNNN"));
    };
    if prefix != ORDER_NUMBER_PREFIX {
        return Err(bad("missing ORD prefix"));
    }
    let date = NaiveDate::parse_from_str(day, "%Y%m%d").map_err(|_| bad("invalid date"))?;
    if seq.len() < 4 || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad("sequence must be at least four digits"));
    }
    let sequence: u32 = seq.parse().map_err(|_| bad("sequence out of range"))?;
    if sequence == 0 {
        return Err(bad("sequence starts at 0001"));
    }
    Ok((date, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_format() {
        assert_eq!(format_order_number(day(), 1), "ORD-20240309-0001");
        assert_eq!(format_order_number(day(), 42), "ORD-20240309-0042");
        assert_eq!(format_order_number(day(), 12345), "ORD-20240309-12345");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_order_number("ORD-20240309-0042").unwrap(), (day(), 42));
        assert!(parse_order_number("ORD-20240309-42").is_err());
        assert!(parse_order_number("INV-20240309-0042").is_err());
        assert!(parse_order_number("ORD-20241309-0042").is_err());
        assert!(parse_order_number("ORD-20240309-0000").is_err());
        assert!(parse_order_number("ORD-20240309-0001-x").is_err());
    }
}
