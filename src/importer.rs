use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::detect::{detect_platform, Detected, Platform};
use crate::error::{CasonaError, Result};
use crate::mapping::{AmountType, ColumnMapping, DateFormat, ImportConfig, NumberFormat};
use crate::models::ParsedReservation;
use crate::outcome::{ImportOutcome, RowError};
use crate::table::RawTable;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn find_header(headers: &[String], names: &[&str]) -> Option<usize> {
    for name in names {
        if let Some(idx) = headers.iter().position(|h| h.to_lowercase() == *name) {
            return Some(idx);
        }
    }
    for name in names {
        if let Some(idx) = headers.iter().position(|h| h.to_lowercase().contains(name)) {
            return Some(idx);
        }
    }
    None
}

fn require_header(headers: &[String], names: &[&str], platform: &str) -> Result<usize> {
    find_header(headers, names).ok_or_else(|| {
        CasonaError::Other(format!(
            "File looks like a {platform} export but has no '{}' column",
            names[0]
        ))
    })
}

fn is_duplicate_row(
    conn: &Connection,
    unit_id: i64,
    guest_name: &str,
    check_in: &str,
    check_out: &str,
) -> bool {
    conn.prepare_cached(
        "SELECT 1 FROM reservations WHERE unit_id = ?1 AND guest_name = ?2 \
         AND check_in = ?3 AND check_out = ?4",
    )
    .and_then(|mut stmt| {
        stmt.exists(rusqlite::params![unit_id, guest_name, check_in, check_out])
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Importer kinds — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterKind {
    Airbnb,
    Booking,
    Mapped,
}

impl ImporterKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Airbnb => "Airbnb export",
            Self::Booking => "Booking.com export",
            Self::Mapped => "mapped CSV",
        }
    }
}

/// A resolved import: which importer runs, with what mapping/config, over
/// which (possibly cleaned) rows.
#[derive(Debug, Clone)]
pub struct PlannedImport {
    pub kind: ImporterKind,
    pub mapping: ColumnMapping,
    pub config: ImportConfig,
    pub rows: Vec<Vec<String>>,
}

/// Decision policy: a recognized platform export always uses its platform
/// importer, even when a manual mapping exists — the platform column set
/// carries derived fields (commission, cleaning fee) a generic mapping
/// cannot reconstruct. Unknown headers require a confirmed mapping.
pub fn plan_import(
    table: &RawTable,
    manual: Option<(ColumnMapping, ImportConfig)>,
) -> Result<PlannedImport> {
    match detect_platform(&table.headers) {
        Detected::Airbnb => airbnb_plan(table),
        Detected::Booking => booking_plan(table),
        Detected::Unknown => {
            let (mapping, config) = manual.ok_or_else(|| {
                CasonaError::MappingIncomplete(
                    "platform not recognized and no column mapping given".to_string(),
                )
            })?;
            mapping.validate(table.headers.len())?;
            Ok(PlannedImport {
                kind: ImporterKind::Mapped,
                mapping,
                config,
                rows: table.rows.clone(),
            })
        }
    }
}

fn airbnb_plan(table: &RawTable) -> Result<PlannedImport> {
    let h = &table.headers;
    let mut mapping = ColumnMapping::new(
        require_header(h, &["guest name", "hu\u{e9}sped"], "Airbnb")?,
        require_header(h, &["start date", "fecha de inicio"], "Airbnb")?,
        require_header(h, &["end date", "fecha de finalizaci\u{f3}n"], "Airbnb")?,
        require_header(h, &["earnings", "gross earnings", "ganancias", "amount"], "Airbnb")?,
    );
    mapping.confirmation_code = find_header(h, &["confirmation code", "c\u{f3}digo de confirmaci\u{f3}n"]);
    mapping.nights = find_header(h, &["# of nights", "nights", "noches"]);
    mapping.cleaning_fee = find_header(h, &["cleaning fee", "tarifa de limpieza"]);
    mapping.commission = find_header(h, &["service fee", "host fee", "tarifa de servicio"]);
    mapping.status = find_header(h, &["status", "estado"]);
    mapping.listing = find_header(h, &["listing", "anuncio"]);

    Ok(PlannedImport {
        kind: ImporterKind::Airbnb,
        mapping,
        config: ImportConfig {
            date_format: DateFormat::Mdy,
            number_format: NumberFormat::Us,
            amount_type: AmountType::Gross,
            platform: Platform::Airbnb,
        },
        rows: table.rows.clone(),
    })
}

fn booking_plan(table: &RawTable) -> Result<PlannedImport> {
    let h = &table.headers;
    let mut mapping = ColumnMapping::new(
        require_header(h, &["guest name(s)", "guest name", "booked by"], "Booking.com")?,
        require_header(h, &["check-in", "llegada"], "Booking.com")?,
        require_header(h, &["check-out", "salida"], "Booking.com")?,
        require_header(h, &["price", "precio", "amount"], "Booking.com")?,
    );
    mapping.confirmation_code = find_header(h, &["book number", "n\u{fa}mero de reserva"]);
    mapping.commission = find_header(h, &["commission amount", "comisi\u{f3}n"]);
    mapping.status = find_header(h, &["status", "estado"]);
    mapping.listing = find_header(h, &["property name", "unit type", "apartment"]);

    // Booking writes amounts like "585.00 EUR"; drop the currency words
    // so the numeric parser sees clean input.
    let money_cols: Vec<usize> = [Some(mapping.amount), mapping.commission]
        .into_iter()
        .flatten()
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| {
                    if money_cols.contains(&i) {
                        cell.chars().filter(|c| !c.is_alphabetic()).collect::<String>()
                    } else {
                        cell.clone()
                    }
                })
                .collect()
        })
        .collect();

    Ok(PlannedImport {
        kind: ImporterKind::Booking,
        mapping,
        config: ImportConfig {
            date_format: DateFormat::Ymd,
            number_format: NumberFormat::Eu,
            amount_type: AmountType::Gross,
            platform: Platform::Booking,
        },
        rows,
    })
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub replace: bool,
    pub allow_duplicates: bool,
}

pub struct CommitResult {
    pub outcome: ImportOutcome,
    pub import_id: Option<i64>,
    pub duplicate_file: bool,
}

fn date_str(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Write parsed rows to the database in one transaction. Invalid rows are
/// reported, not imported; duplicate rows are skipped unless allowed.
/// With `replace`, existing reservations for every routed unit are
/// deleted in the same transaction, so a failed import leaves the old
/// data intact.
#[allow(clippy::too_many_arguments)]
pub fn commit_import(
    conn: &mut Connection,
    filename: &str,
    checksum: &str,
    platform: Platform,
    parsed: &[ParsedReservation],
    routing: &HashMap<String, i64>,
    fallback_unit: Option<i64>,
    opts: &ImportOptions,
) -> Result<CommitResult> {
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([checksum])? {
            return Ok(CommitResult {
                outcome: ImportOutcome::default(),
                import_id: None,
                duplicate_file: true,
            });
        }
    }

    let tx = conn.transaction()?;
    let mut outcome = ImportOutcome::default();

    if opts.replace {
        let mut affected: HashSet<i64> = routing.values().copied().collect();
        if let Some(u) = fallback_unit {
            affected.insert(u);
        }
        for unit_id in affected {
            tx.execute("DELETE FROM reservations WHERE unit_id = ?1", [unit_id])?;
        }
    }

    let import_id: i64 = {
        let mut dates: Vec<String> = parsed
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| date_str(r.check_in))
            .collect();
        dates.sort();
        tx.execute(
            "INSERT INTO imports (filename, platform, record_count, date_range_start, date_range_end, checksum) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                filename,
                platform.to_string(),
                parsed.len() as i64,
                dates.first(),
                dates.last(),
                checksum,
            ],
        )?;
        tx.last_insert_rowid()
    };

    for r in parsed {
        // Source row number: 1-based, counting the header line.
        let row_no = r.row_index + 2;

        if !r.is_valid() {
            outcome.errors.push(RowError { row: row_no, reason: r.errors.join("; ") });
            continue;
        }

        let unit_id = match &r.listing {
            Some(listing) => routing.get(listing.trim()).copied().or(fallback_unit),
            None => fallback_unit,
        };
        let Some(unit_id) = unit_id else {
            outcome.errors.push(RowError {
                row: row_no,
                reason: match &r.listing {
                    Some(l) => format!("Listing '{l}' has no assigned billing unit"),
                    None => "No billing unit assigned (use --unit)".to_string(),
                },
            });
            continue;
        };

        let check_in = date_str(r.check_in);
        let check_out = date_str(r.check_out);
        if !opts.allow_duplicates
            && is_duplicate_row(&tx, unit_id, &r.guest_name, &check_in, &check_out)
        {
            outcome.skipped += 1;
            continue;
        }

        tx.execute(
            "INSERT INTO reservations (unit_id, guest_name, check_in, check_out, nights, amount, \
             cleaning_fee, commission, confirmation_code, status, platform, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                unit_id,
                r.guest_name,
                check_in,
                check_out,
                r.nights,
                r.amount,
                r.cleaning_fee,
                r.commission,
                r.confirmation_code,
                r.status,
                platform.to_string(),
                import_id,
            ],
        )?;
        outcome.imported += 1;
    }

    tx.execute(
        "UPDATE imports SET summary = ?1 WHERE id = ?2",
        rusqlite::params![outcome.to_json()?, import_id],
    )?;
    tx.commit()?;

    Ok(CommitResult { outcome, import_id: Some(import_id), duplicate_file: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::preview::build_preview;
    use crate::table::parse_table;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn add_unit(conn: &Connection, name: &str) -> i64 {
        conn.execute("INSERT INTO units (name) VALUES (?1)", [name]).unwrap();
        conn.last_insert_rowid()
    }

    const AIRBNB_CSV: &str = "\
Confirmation code,Status,Guest name,Start date,End date,# of nights,Listing,Earnings,Cleaning fee,Service fee
HM123ABC,Confirmed,Ana Garcia,03/01/2024,03/05/2024,4,Casa Azul,\"$450.00\",$40.00,$13.50
HM456DEF,Past guest,John Smith,03/10/2024,03/12/2024,2,Casa Azul,$210.00,$40.00,$6.30
";

    const BOOKING_CSV: &str = "\
Book number;Booked by;Guest name(s);Check-in;Check-out;Status;Price;Commission amount
123456789;Maria Lopez;Maria Lopez;2024-03-01;2024-03-05;ok;585.00 EUR;87.75 EUR
";

    #[test]
    fn test_plan_airbnb_authoritative_over_manual_mapping() {
        let table = parse_table(AIRBNB_CSV).unwrap();
        let manual = Some((ColumnMapping::new(0, 1, 2, 3), ImportConfig::default()));
        let plan = plan_import(&table, manual).unwrap();
        assert_eq!(plan.kind, ImporterKind::Airbnb);
        assert_eq!(plan.config.platform, Platform::Airbnb);
        assert_eq!(plan.config.date_format, DateFormat::Mdy);
        assert_eq!(plan.mapping.get(crate::mapping::Field::GuestName), Some(2));
        assert_eq!(plan.mapping.listing, Some(6));
        assert_eq!(plan.mapping.commission, Some(9));
    }

    #[test]
    fn test_plan_booking_cleans_currency_words() {
        let table = parse_table(BOOKING_CSV).unwrap();
        let plan = plan_import(&table, None).unwrap();
        assert_eq!(plan.kind, ImporterKind::Booking);
        assert_eq!(plan.config.date_format, DateFormat::Ymd);
        assert_eq!(plan.rows[0][plan.mapping.amount], "585.00");
        let p = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
        assert!(p.rows[0].is_valid());
        assert_eq!(p.rows[0].amount, 585.0);
        assert_eq!(p.rows[0].commission, 87.75);
        assert_eq!(p.rows[0].nights, 4);
    }

    #[test]
    fn test_plan_unknown_without_mapping_fails() {
        let table = parse_table("Name,From,To,Total\nAna,01/03/2024,05/03/2024,100\n").unwrap();
        assert!(matches!(
            plan_import(&table, None),
            Err(CasonaError::MappingIncomplete(_))
        ));
    }

    #[test]
    fn test_commit_airbnb_end_to_end() {
        let (_dir, mut conn) = test_db();
        let unit = add_unit(&conn, "Casa Azul");

        let table = parse_table(AIRBNB_CSV).unwrap();
        let plan = plan_import(&table, None).unwrap();
        let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
        let routing = HashMap::from([("Casa Azul".to_string(), unit)]);

        let result = commit_import(
            &mut conn, "airbnb.csv", "abc123", plan.config.platform,
            &preview.rows, &routing, None, &ImportOptions::default(),
        )
        .unwrap();

        assert!(!result.duplicate_file);
        assert_eq!(result.outcome.imported, 2);
        assert_eq!(result.outcome.skipped, 0);
        assert!(result.outcome.errors.is_empty());

        let (code, status, amount): (String, String, f64) = conn
            .query_row(
                "SELECT confirmation_code, status, amount FROM reservations WHERE guest_name = 'John Smith'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(code, "HM456DEF");
        assert_eq!(status, "Completada");
        assert_eq!(amount, 210.0);
    }

    #[test]
    fn test_commit_skips_row_duplicates() {
        let (_dir, mut conn) = test_db();
        let unit = add_unit(&conn, "Casa Azul");
        let table = parse_table(AIRBNB_CSV).unwrap();
        let plan = plan_import(&table, None).unwrap();
        let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
        let routing = HashMap::from([("Casa Azul".to_string(), unit)]);

        commit_import(&mut conn, "a.csv", "sum1", Platform::Airbnb, &preview.rows, &routing, None, &ImportOptions::default()).unwrap();
        let second = commit_import(&mut conn, "a2.csv", "sum2", Platform::Airbnb, &preview.rows, &routing, None, &ImportOptions::default()).unwrap();
        assert_eq!(second.outcome.imported, 0);
        assert_eq!(second.outcome.skipped, 2);
    }

    #[test]
    fn test_commit_detects_duplicate_file() {
        let (_dir, mut conn) = test_db();
        let unit = add_unit(&conn, "Casa Azul");
        let table = parse_table(AIRBNB_CSV).unwrap();
        let plan = plan_import(&table, None).unwrap();
        let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
        let routing = HashMap::from([("Casa Azul".to_string(), unit)]);

        commit_import(&mut conn, "a.csv", "same", Platform::Airbnb, &preview.rows, &routing, None, &ImportOptions::default()).unwrap();
        let again = commit_import(&mut conn, "a.csv", "same", Platform::Airbnb, &preview.rows, &routing, None, &ImportOptions::default()).unwrap();
        assert!(again.duplicate_file);
        assert_eq!(again.outcome.imported, 0);
    }

    #[test]
    fn test_commit_replace_is_transactional_delete_plus_insert() {
        let (_dir, mut conn) = test_db();
        let unit = add_unit(&conn, "Casa Azul");
        conn.execute(
            "INSERT INTO reservations (unit_id, guest_name, check_in, check_out, nights, amount, confirmation_code, status) \
             VALUES (?1, 'Old Guest', '2023-01-01', '2023-01-03', 2, 100.0, 'OLD1', 'Confirmada')",
            [unit],
        )
        .unwrap();

        let table = parse_table(AIRBNB_CSV).unwrap();
        let plan = plan_import(&table, None).unwrap();
        let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
        let routing = HashMap::from([("Casa Azul".to_string(), unit)]);

        let opts = ImportOptions { replace: true, allow_duplicates: false };
        commit_import(&mut conn, "a.csv", "sum", Platform::Airbnb, &preview.rows, &routing, None, &opts).unwrap();

        let old: i64 = conn
            .query_row("SELECT count(*) FROM reservations WHERE guest_name = 'Old Guest'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(old, 0);
        let total: i64 = conn.query_row("SELECT count(*) FROM reservations", [], |r| r.get(0)).unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_commit_reports_invalid_rows_with_reasons() {
        let (_dir, mut conn) = test_db();
        let unit = add_unit(&conn, "Casa Azul");
        let csv = "Guest,Check-in,Check-out,Importe\nAna,01/03/2024,05/03/2024,100\n,01/03/2024,05/03/2024,100\n";
        let table = parse_table(csv).unwrap();
        let mapping = crate::mapping::auto_detect_columns(&table.headers).unwrap();
        let preview = build_preview(&table.rows, &mapping, &ImportConfig::default(), None);

        let result = commit_import(
            &mut conn, "x.csv", "s", Platform::Other, &preview.rows,
            &HashMap::new(), Some(unit), &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!(result.outcome.imported, 1);
        assert_eq!(result.outcome.errors.len(), 1);
        assert_eq!(result.outcome.errors[0].row, 3);
        assert!(result.outcome.errors[0].reason.contains("Guest name"));
    }

    #[test]
    fn test_commit_records_summary_in_current_shape() {
        let (_dir, mut conn) = test_db();
        let unit = add_unit(&conn, "Casa Azul");
        let table = parse_table(AIRBNB_CSV).unwrap();
        let plan = plan_import(&table, None).unwrap();
        let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
        let routing = HashMap::from([("Casa Azul".to_string(), unit)]);

        let result = commit_import(&mut conn, "a.csv", "s", Platform::Airbnb, &preview.rows, &routing, None, &ImportOptions::default()).unwrap();
        let summary: String = conn
            .query_row("SELECT summary FROM imports WHERE id = ?1", [result.import_id.unwrap()], |r| r.get(0))
            .unwrap();
        let parsed = ImportOutcome::from_json(&summary).unwrap();
        assert_eq!(parsed, result.outcome);
    }
}
