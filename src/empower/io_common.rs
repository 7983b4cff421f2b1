// Helpers shared by the input adapters and the report writers.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::debug;
use phonenumber::{country, Mode, ParseError};
use std::path::Path;

pub const PHONE_NOT_A_NUMBER: &str = "The string supplied did not seem to be a phone number";
pub const PHONE_NOT_POSSIBLE: &str = "Listed number is not possible, please check";
pub const PHONE_NOT_VALID: &str = "Listed number is not valid, please check";

/// Shown instead of a login date when the organizer never logged in.
pub const UNKNOWN_LOGIN: &str = "Unknown/Never";
/// The days since login of an organizer who never logged in.
pub const UNKNOWN_LOGIN_DAYS: i64 = 100_000;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Normalizes a phone number to the national format of its country, with
/// the US as the default region.
///
/// An empty input stays empty. A number that cannot be used is replaced by
/// one of the `PHONE_*` messages.
pub fn normalize_phone(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match phonenumber::parse(Some(country::Id::US), raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            number.format().mode(Mode::National).to_string()
        }
        Ok(_) => PHONE_NOT_VALID.to_string(),
        Err(ParseError::TooShortNsn | ParseError::TooShortAfterIdd | ParseError::TooLong) => {
            PHONE_NOT_POSSIBLE.to_string()
        }
        Err(e) => {
            debug!("normalize_phone: {:?}: {}", raw, e);
            PHONE_NOT_A_NUMBER.to_string()
        }
    }
}

/// Upper-cases the first letter of every word and lower-cases the others.
/// Any character that is not a letter starts a new word.
pub fn title_case(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                res.extend(c.to_lowercase());
            } else {
                res.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            res.push(c);
            prev_is_letter = false;
        }
    }
    res
}

/// Reads the date part of an ISO timestamp (`2021-03-04T17:22:01.000Z`)
/// as epoch milliseconds at midnight UTC.
pub fn iso_date_to_mts(s: &str) -> Option<i64> {
    let s = s.trim();
    let date_part = s.split('T').next()?;
    let date = NaiveDate::parse_from_str(date_part.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

pub fn mts_to_date(mts: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(mts).map(|dt| dt.date_naive())
}

/// `YYYY-MM-DD`, or empty when unknown.
pub fn format_mts(mts: Option<i64>) -> String {
    mts.and_then(mts_to_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn days_since(mts: Option<i64>, today: NaiveDate) -> Option<i64> {
    mts.and_then(mts_to_date).map(|d| (today - d).num_days())
}

/// `N days`, or empty when unknown.
pub fn format_days_since(mts: Option<i64>, today: NaiveDate) -> String {
    days_since(mts, today)
        .map(|d| format!("{} days", d))
        .unwrap_or_default()
}

/// Excel stores dates as a number of days since 1899-12-30.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let origin = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    origin.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("   "), "");
        assert_eq!(normalize_phone("608-555-0100"), "(608) 555-0100");
        assert_eq!(normalize_phone("+1 (608) 555 0100"), "(608) 555-0100");
        assert_eq!(normalize_phone("16085550100"), "(608) 555-0100");
        assert_eq!(normalize_phone("call me"), PHONE_NOT_A_NUMBER);
        assert_eq!(normalize_phone("12345678901234567890"), PHONE_NOT_POSSIBLE);
        assert_eq!(normalize_phone("123-555-0100"), PHONE_NOT_VALID);
        assert_eq!(normalize_phone("608-155-0100"), PHONE_NOT_VALID);
    }

    #[test]
    fn international_phone_numbers() {
        // Mexico City, in the national format of Mexico.
        let mx = normalize_phone("+52 55 1234 5678");
        assert!(mx.contains("1234"), "{}", mx);
        assert!(mx.contains("5678"), "{}", mx);
        assert!(!mx.contains("+52"), "{}", mx);
        assert_ne!(mx, PHONE_NOT_POSSIBLE);
        assert_ne!(mx, PHONE_NOT_VALID);
    }

    #[test]
    fn title_casing() {
        assert_eq!(title_case("maria jose"), "Maria Jose");
        assert_eq!(title_case("O'NEIL"), "O'Neil");
        assert_eq!(title_case("mary-jo  smith"), "Mary-Jo  Smith");
        assert_eq!(title_case("josé"), "José");
    }

    #[test]
    fn dates() {
        let mts = iso_date_to_mts("2021-03-04T17:22:01.000Z").unwrap();
        assert_eq!(mts, 1_614_816_000_000);
        assert_eq!(iso_date_to_mts("2021-03-04"), Some(mts));
        assert_eq!(iso_date_to_mts(""), None);
        assert_eq!(iso_date_to_mts("yesterday"), None);
        assert_eq!(format_mts(Some(mts)), "2021-03-04");
        assert_eq!(format_mts(None), "");

        let today = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(days_since(Some(mts), today), Some(10));
        assert_eq!(format_days_since(Some(mts), today), "10 days");
        assert_eq!(format_days_since(None, today), "");
        assert_eq!(
            excel_serial_to_date(44259.5),
            NaiveDate::from_ymd_opt(2021, 3, 4)
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/exports/roster.csv"), "roster.csv");
        assert_eq!(simplify_file_name("roster.csv"), "roster.csv");
    }
}
