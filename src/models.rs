use chrono::NaiveDate;

use crate::mapping::{ColumnMapping, ImportConfig};

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct BillingUnit {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct UnitAlias {
    pub id: i64,
    pub unit_id: i64,
    pub listing_name: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: Option<i64>,
    pub unit_id: i64,
    pub guest_name: String,
    pub check_in: String,
    pub check_out: String,
    pub nights: i64,
    pub amount: f64,
    pub cleaning_fee: f64,
    pub commission: f64,
    pub confirmation_code: String,
    pub status: String,
    pub platform: String,
    pub import_id: Option<i64>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub id: Option<i64>,
    pub filename: String,
    pub platform: String,
    pub record_count: Option<i64>,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub checksum: Option<String>,
    pub summary: Option<String>,
}

/// A named, persisted (mapping, config) pair reusable across imports
/// from the same source format.
#[derive(Debug, Clone)]
pub struct ImportTemplate {
    pub id: i64,
    pub name: String,
    pub mapping: ColumnMapping,
    pub config: ImportConfig,
}

/// One source row after mapping + parsing. Recomputed on every preview
/// pass, never persisted.
#[derive(Debug, Clone)]
pub struct ParsedReservation {
    pub row_index: usize,
    pub guest_name: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub nights: i64,
    pub amount: f64,
    pub cleaning_fee: f64,
    pub commission: f64,
    pub confirmation_code: String,
    pub status: String,
    pub listing: Option<String>,
    pub errors: Vec<String>,
}

impl ParsedReservation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
