use chrono::NaiveDate;
use regex::Regex;

use crate::mapping::{DateFormat, NumberFormat};

/// Parse a raw date string under the configured format. `/`, `-` and `.`
/// are all accepted as the separator. Strict: the date must be a real
/// calendar date (leap-year aware) with a year between 2000 and 2100.
pub fn parse_date(raw: &str, format: DateFormat) -> Option<NaiveDate> {
    let raw = raw.trim();
    let (pattern, order) = match format {
        DateFormat::Dmy | DateFormat::DmyDash => {
            (r"^(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})$", [0usize, 1, 2])
        }
        DateFormat::Mdy => (r"^(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})$", [1, 0, 2]),
        DateFormat::Ymd => (r"^(\d{4})[/.-](\d{1,2})[/.-](\d{1,2})$", [2, 1, 0]),
    };

    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(raw)?;
    let nums: Vec<u32> = (1..=3).filter_map(|i| caps.get(i)?.as_str().parse().ok()).collect();
    if nums.len() != 3 {
        return None;
    }
    let day = nums[order[0]];
    let month = nums[order[1]];
    let year = nums[order[2]] as i32;

    if !(2000..=2100).contains(&year) {
        return None;
    }
    // from_ymd_opt rejects impossible calendar dates (Feb 30, month 13, ...)
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a raw amount under EU or US separator conventions. Currency
/// symbols and whitespace are stripped. Returns 0.0 on anything
/// unparseable; callers treat <= 0 as an invalid amount.
pub fn parse_amount(raw: &str, format: NumberFormat) -> f64 {
    let mut s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\u{20ac}' | '$' | '\u{a3}'))
        .collect();

    match format {
        NumberFormat::Eu => {
            if s.contains('.') && s.contains(',') {
                // 1.234,56 -> dot is thousands, comma is decimal
                s = s.replace('.', "").replace(',', ".");
            } else if s.contains(',') {
                s = s.replace(',', ".");
            }
        }
        NumberFormat::Us => {
            s = s.replace(',', "");
        }
    }

    s.parse().unwrap_or(0.0)
}
