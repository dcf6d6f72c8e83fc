use chrono::{Datelike, NaiveDate};

use crate::mapping::{ColumnMapping, ImportConfig};
use crate::models::ParsedReservation;
use crate::parse::{parse_amount, parse_date};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewStats {
    pub valid: usize,
    pub invalid: usize,
    pub total_amount: f64,
    pub total_nights: i64,
}

#[derive(Debug, Clone)]
pub struct Preview {
    pub rows: Vec<ParsedReservation>,
    pub stats: PreviewStats,
}

fn field<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

fn opt_field<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.map(|i| field(row, i)).unwrap_or("")
}

/// Map a free-text status onto the fixed vocabulary. Case-insensitive,
/// first matching rule wins in this order.
pub fn normalize_status(raw: &str) -> String {
    let s = raw.to_lowercase();
    if s.contains("cancel") {
        "Cancelada".to_string()
    } else if s.contains("complet") || s.contains("past") {
        "Completada".to_string()
    } else if s.contains("pending") || s.contains("pendiente") {
        "Pendiente".to_string()
    } else {
        // "confirm" and everything else
        "Confirmada".to_string()
    }
}

/// Deterministic fallback confirmation code: AUTO- + check-in as YYYYMMDD
/// + first 3 letters of the guest name upper-cased, padded with X.
/// Guests sharing initials and a check-in date collide; row-level
/// duplicate detection does not rely on this code.
pub fn synthesize_code(guest_name: &str, check_in: Option<NaiveDate>) -> String {
    let date_part = match check_in {
        Some(d) => format!("{:04}{:02}{:02}", d.year(), d.month(), d.day()),
        None => "00000000".to_string(),
    };
    let mut letters: String = guest_name
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    while letters.len() < 3 {
        letters.push('X');
    }
    format!("AUTO-{date_part}{letters}")
}

fn parse_row(
    row_index: usize,
    row: &[String],
    mapping: &ColumnMapping,
    config: &ImportConfig,
) -> ParsedReservation {
    let mut errors = Vec::new();

    let guest_name = field(row, mapping.guest_name).trim().to_string();
    if guest_name.is_empty() {
        errors.push("Guest name is empty".to_string());
    }

    let check_in_raw = field(row, mapping.check_in);
    let check_in = parse_date(check_in_raw, config.date_format);
    if check_in.is_none() {
        errors.push(format!("Invalid check-in date: '{check_in_raw}'"));
    }

    let check_out_raw = field(row, mapping.check_out);
    let check_out = parse_date(check_out_raw, config.date_format);
    if check_out.is_none() {
        errors.push(format!("Invalid check-out date: '{check_out_raw}'"));
    }

    if let (Some(ci), Some(co)) = (check_in, check_out) {
        if ci >= co {
            errors.push("Check-out must be after check-in".to_string());
        }
    }

    let amount_raw = field(row, mapping.amount);
    let amount = parse_amount(amount_raw, config.number_format);
    if amount <= 0.0 {
        errors.push(format!("Invalid amount: '{amount_raw}'"));
    }

    let mapped_nights: i64 = opt_field(row, mapping.nights).trim().parse().unwrap_or(0);
    let nights = if mapped_nights != 0 {
        mapped_nights
    } else if let (Some(ci), Some(co)) = (check_in, check_out) {
        (co - ci).num_days()
    } else {
        0
    };

    let code_raw = opt_field(row, mapping.confirmation_code).trim().to_string();
    let confirmation_code = if code_raw.is_empty() {
        synthesize_code(&guest_name, check_in)
    } else {
        code_raw
    };

    let status = normalize_status(opt_field(row, mapping.status));
    let cleaning_fee = parse_amount(opt_field(row, mapping.cleaning_fee), config.number_format);
    let commission = parse_amount(opt_field(row, mapping.commission), config.number_format);

    let listing = mapping.listing.map(|i| field(row, i).trim().to_string()).filter(|s| !s.is_empty());

    ParsedReservation {
        row_index,
        guest_name,
        check_in,
        check_out,
        nights,
        amount,
        cleaning_fee,
        commission,
        confirmation_code,
        status,
        listing,
        errors,
    }
}

/// Apply mapping + config to rows, collecting per-row errors and
/// aggregates. Aggregates only count rows with no errors.
pub fn build_preview(
    rows: &[Vec<String>],
    mapping: &ColumnMapping,
    config: &ImportConfig,
    max_rows: Option<usize>,
) -> Preview {
    let take = max_rows.unwrap_or(rows.len());
    let parsed: Vec<ParsedReservation> = rows
        .iter()
        .take(take)
        .enumerate()
        .map(|(i, row)| parse_row(i, row, mapping, config))
        .collect();

    let mut stats = PreviewStats::default();
    for r in &parsed {
        if r.is_valid() {
            stats.valid += 1;
            stats.total_amount += r.amount;
            stats.total_nights += r.nights;
        } else {
            stats.invalid += 1;
        }
    }

    Preview { rows: parsed, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Platform;
    use crate::mapping::{AmountType, DateFormat, NumberFormat};

    fn config() -> ImportConfig {
        ImportConfig {
            date_format: DateFormat::Dmy,
            number_format: NumberFormat::Eu,
            amount_type: AmountType::Net,
            platform: Platform::Other,
        }
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn mapping() -> ColumnMapping {
        ColumnMapping::new(0, 1, 2, 3)
    }

    #[test]
    fn test_valid_row() {
        let rows = vec![row(&["Ana Garc\u{ed}a", "01/03/2024", "05/03/2024", "450,00"])];
        let p = build_preview(&rows, &mapping(), &config(), None);
        assert!(p.rows[0].is_valid());
        assert_eq!(p.rows[0].nights, 4);
        assert_eq!(p.stats.valid, 1);
        assert_eq!(p.stats.total_amount, 450.0);
        assert_eq!(p.stats.total_nights, 4);
    }

    #[test]
    fn test_chronology_violation() {
        let rows = vec![row(&["Ana", "05/03/2024", "01/03/2024", "450,00"])];
        let p = build_preview(&rows, &mapping(), &config(), None);
        assert!(!p.rows[0].is_valid());
        assert!(p.rows[0].errors.iter().any(|e| e.contains("after check-in")));
    }

    #[test]
    fn test_missing_amount() {
        let rows = vec![row(&["Ana", "01/03/2024", "05/03/2024", ""])];
        let p = build_preview(&rows, &mapping(), &config(), None);
        assert!(p.rows[0].errors.iter().any(|e| e.contains("amount")));
    }

    #[test]
    fn test_empty_guest_name() {
        let rows = vec![row(&["  ", "01/03/2024", "05/03/2024", "100"])];
        let p = build_preview(&rows, &mapping(), &config(), None);
        assert!(p.rows[0].errors.iter().any(|e| e.contains("Guest name")));
    }

    #[test]
    fn test_aggregates_exclude_invalid_rows() {
        let rows = vec![
            row(&["Ana", "01/03/2024", "05/03/2024", "400,00"]),
            row(&["", "01/03/2024", "05/03/2024", "999,00"]),
        ];
        let p = build_preview(&rows, &mapping(), &config(), None);
        assert_eq!(p.stats.valid, 1);
        assert_eq!(p.stats.invalid, 1);
        assert_eq!(p.stats.total_amount, 400.0);
        assert_eq!(p.stats.total_nights, 4);
    }

    #[test]
    fn test_mapped_nights_column_wins() {
        let mut m = mapping();
        m.nights = Some(4);
        let rows = vec![row(&["Ana", "01/03/2024", "05/03/2024", "100", "7"])];
        let p = build_preview(&rows, &m, &config(), None);
        assert_eq!(p.rows[0].nights, 7);
    }

    #[test]
    fn test_zero_nights_column_falls_back_to_date_diff() {
        let mut m = mapping();
        m.nights = Some(4);
        let rows = vec![row(&["Ana", "01/03/2024", "05/03/2024", "100", "0"])];
        let p = build_preview(&rows, &m, &config(), None);
        assert_eq!(p.rows[0].nights, 4);
    }

    #[test]
    fn test_code_synthesis_deterministic() {
        let d = NaiveDate::from_ymd_opt(2024, 12, 25);
        let a = synthesize_code("Juan P\u{e9}rez", d);
        let b = synthesize_code("Juan P\u{e9}rez", d);
        assert_eq!(a, b);
        assert_eq!(a, "AUTO-20241225JUA");
    }

    #[test]
    fn test_code_synthesis_pads_short_names() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(synthesize_code("Al", d), "AUTO-20240105ALX");
        assert_eq!(synthesize_code("", d), "AUTO-20240105XXX");
    }

    #[test]
    fn test_code_synthesis_collides_on_shared_initials() {
        // Known non-uniqueness: same initials + same date = same code.
        let d = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert_eq!(synthesize_code("Juana L\u{f3}pez", d), synthesize_code("juan torres", d));
    }

    #[test]
    fn test_mapped_code_column_preserved() {
        let mut m = mapping();
        m.confirmation_code = Some(4);
        let rows = vec![row(&["Ana", "01/03/2024", "05/03/2024", "100", "HM123ABC"])];
        let p = build_preview(&rows, &m, &config(), None);
        assert_eq!(p.rows[0].confirmation_code, "HM123ABC");
    }

    #[test]
    fn test_status_normalization() {
        assert_eq!(normalize_status("Cancelled by guest"), "Cancelada");
        assert_eq!(normalize_status("COMPLETED"), "Completada");
        assert_eq!(normalize_status("Past guest"), "Completada");
        assert_eq!(normalize_status("pendiente de pago"), "Pendiente");
        assert_eq!(normalize_status("confirmed"), "Confirmada");
        assert_eq!(normalize_status(""), "Confirmada");
    }

    #[test]
    fn test_out_of_range_mapped_index_fails_validation() {
        // Ragged source row: mapped column missing yields empty field,
        // which fails that field's rule downstream.
        let rows = vec![row(&["Ana", "01/03/2024"])];
        let p = build_preview(&rows, &mapping(), &config(), None);
        assert!(!p.rows[0].is_valid());
        assert!(p.rows[0].errors.iter().any(|e| e.contains("check-out")));
        assert!(p.rows[0].errors.iter().any(|e| e.contains("amount")));
    }

    #[test]
    fn test_max_rows_limits_preview() {
        let rows: Vec<Vec<String>> = (0..20)
            .map(|i| row(&[&format!("Guest {i}"), "01/03/2024", "05/03/2024", "100"]))
            .collect();
        let p = build_preview(&rows, &mapping(), &config(), Some(5));
        assert_eq!(p.rows.len(), 5);
    }
}
