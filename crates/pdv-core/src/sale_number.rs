//! # Sale Numbers
//!
//! Human-readable sale identifiers: `VND` + `YYYYMMDD` + 4-digit daily
//! sequence, e.g. `VND202610180001`.
//!
//! The caller (pdv-db) reads the last number issued for the day inside the
//! sale transaction and passes it here.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};

/// Prefix of every sale number.
pub const SALE_NUMBER_PREFIX: &str = "VND";

/// Highest sequence issued per day.
pub const MAX_DAILY_SEQUENCE: u32 = 9999;

/// The `VNDYYYYMMDD` prefix shared by all sales of `date`.
pub fn day_prefix(date: NaiveDate) -> String {
    format!("{}{}", SALE_NUMBER_PREFIX, date.format("%Y%m%d"))
}

/// Computes the next sale number of `date`.
///
/// `last_of_day` is the most recent number issued that day, if any. Its
/// last four characters are parsed as the sequence; an unparsable suffix
/// counts as 0.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pdv_core::sale_number::next_sale_number;
///
/// let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// assert_eq!(next_sale_number(day, None).unwrap(), "VND202610180001");
/// assert_eq!(
///     next_sale_number(day, Some("VND202610180041")).unwrap(),
///     "VND202610180042"
/// );
/// ```
pub fn next_sale_number(date: NaiveDate, last_of_day: Option<&str>) -> CoreResult<String> {
    let last = last_of_day.map(parse_sequence).unwrap_or(0);
    let next = last + 1;
    if next > MAX_DAILY_SEQUENCE {
        return Err(CoreError::SaleSequenceExhausted {
            date: date.format("%Y-%m-%d").to_string(),
        });
    }
    Ok(format!("{}{:04}", day_prefix(date), next))
}

fn parse_sequence(number: &str) -> u32 {
    let chars: Vec<char> = number.chars().collect();
    let start = chars.len().saturating_sub(4);
    let suffix: String = chars[start..].iter().collect();
    suffix.parse().unwrap_or(0)
}
