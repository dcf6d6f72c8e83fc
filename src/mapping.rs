use serde::{Deserialize, Serialize};

use crate::detect::Platform;
use crate::error::{CasonaError, Result};

// ---------------------------------------------------------------------------
// Import config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "DD/MM/YYYY")]
    Dmy,
    #[serde(rename = "MM/DD/YYYY")]
    Mdy,
    #[serde(rename = "YYYY-MM-DD")]
    Ymd,
    #[serde(rename = "DD-MM-YYYY")]
    DmyDash,
}

impl DateFormat {
    pub fn parse(s: &str) -> Option<DateFormat> {
        match s.to_ascii_uppercase().as_str() {
            "DD/MM/YYYY" => Some(DateFormat::Dmy),
            "MM/DD/YYYY" => Some(DateFormat::Mdy),
            "YYYY-MM-DD" => Some(DateFormat::Ymd),
            "DD-MM-YYYY" => Some(DateFormat::DmyDash),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateFormat::Dmy => "DD/MM/YYYY",
            DateFormat::Mdy => "MM/DD/YYYY",
            DateFormat::Ymd => "YYYY-MM-DD",
            DateFormat::DmyDash => "DD-MM-YYYY",
        }
    }

    pub const ALL: [DateFormat; 4] = [
        DateFormat::Dmy,
        DateFormat::Mdy,
        DateFormat::Ymd,
        DateFormat::DmyDash,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "US")]
    Us,
}

impl NumberFormat {
    pub fn parse(s: &str) -> Option<NumberFormat> {
        match s.to_ascii_uppercase().as_str() {
            "EU" => Some(NumberFormat::Eu),
            "US" => Some(NumberFormat::Us),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NumberFormat::Eu => "EU",
            NumberFormat::Us => "US",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountType {
    #[serde(rename = "NET")]
    Net,
    #[serde(rename = "GROSS")]
    Gross,
}

impl AmountType {
    pub fn parse(s: &str) -> Option<AmountType> {
        match s.to_ascii_uppercase().as_str() {
            "NET" => Some(AmountType::Net),
            "GROSS" => Some(AmountType::Gross),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AmountType::Net => "NET",
            AmountType::Gross => "GROSS",
        }
    }
}

/// Locale and platform configuration threaded explicitly through every
/// parser call. Never a module-level default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    pub date_format: DateFormat,
    pub number_format: NumberFormat,
    pub amount_type: AmountType,
    pub platform: Platform,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            date_format: DateFormat::Dmy,
            number_format: NumberFormat::Eu,
            amount_type: AmountType::Net,
            platform: Platform::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Logical reservation fields assignable to source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    GuestName,
    CheckIn,
    CheckOut,
    Amount,
    ConfirmationCode,
    Nights,
    CleaningFee,
    Commission,
    Status,
    Listing,
}

pub const REQUIRED_FIELDS: [Field; 4] =
    [Field::GuestName, Field::CheckIn, Field::CheckOut, Field::Amount];

pub const OPTIONAL_FIELDS: [Field; 6] = [
    Field::ConfirmationCode,
    Field::Nights,
    Field::CleaningFee,
    Field::Commission,
    Field::Status,
    Field::Listing,
];

impl Field {
    pub fn key(&self) -> &'static str {
        match self {
            Field::GuestName => "guest",
            Field::CheckIn => "checkin",
            Field::CheckOut => "checkout",
            Field::Amount => "amount",
            Field::ConfirmationCode => "code",
            Field::Nights => "nights",
            Field::CleaningFee => "cleaning",
            Field::Commission => "commission",
            Field::Status => "status",
            Field::Listing => "listing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::GuestName => "Guest name",
            Field::CheckIn => "Check-in",
            Field::CheckOut => "Check-out",
            Field::Amount => "Amount",
            Field::ConfirmationCode => "Confirmation code",
            Field::Nights => "Nights",
            Field::CleaningFee => "Cleaning fee",
            Field::Commission => "Commission",
            Field::Status => "Status",
            Field::Listing => "Listing",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        REQUIRED_FIELDS
            .iter()
            .chain(OPTIONAL_FIELDS.iter())
            .find(|f| f.key() == key)
            .copied()
    }
}

/// Field-to-column-index assignment. Complete iff all four required
/// fields point at valid, distinct columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub guest_name: usize,
    pub check_in: usize,
    pub check_out: usize,
    pub amount: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nights: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaning_fee: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<usize>,
}

impl ColumnMapping {
    pub fn new(guest_name: usize, check_in: usize, check_out: usize, amount: usize) -> Self {
        Self {
            guest_name,
            check_in,
            check_out,
            amount,
            confirmation_code: None,
            nights: None,
            cleaning_fee: None,
            commission: None,
            status: None,
            listing: None,
        }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::GuestName => Some(self.guest_name),
            Field::CheckIn => Some(self.check_in),
            Field::CheckOut => Some(self.check_out),
            Field::Amount => Some(self.amount),
            Field::ConfirmationCode => self.confirmation_code,
            Field::Nights => self.nights,
            Field::CleaningFee => self.cleaning_fee,
            Field::Commission => self.commission,
            Field::Status => self.status,
            Field::Listing => self.listing,
        }
    }

    pub fn validate(&self, column_count: usize) -> Result<()> {
        for field in REQUIRED_FIELDS.iter().chain(OPTIONAL_FIELDS.iter()) {
            if let Some(idx) = self.get(*field) {
                if idx >= column_count {
                    return Err(CasonaError::Other(format!(
                        "Column {idx} for '{}' is out of range (file has {column_count} columns)",
                        field.label()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Work-in-progress assignment shared by both interactive mappers and the
/// --map flag parser. Enforces one column -> at most one field by clearing
/// any prior holder of a column on reassignment.
#[derive(Debug, Clone, Default)]
pub struct MappingDraft {
    assignments: Vec<(Field, usize)>,
}

impl MappingDraft {
    pub fn set(&mut self, field: Field, column: usize) {
        self.assignments.retain(|(f, c)| *f != field && *c != column);
        self.assignments.push((field, column));
    }

    pub fn clear(&mut self, field: Field) {
        self.assignments.retain(|(f, _)| *f != field);
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.assignments.iter().find(|(f, _)| *f == field).map(|(_, c)| *c)
    }

    pub fn column_field(&self, column: usize) -> Option<Field> {
        self.assignments.iter().find(|(_, c)| *c == column).map(|(f, _)| *f)
    }

    pub fn is_complete(&self) -> bool {
        REQUIRED_FIELDS.iter().all(|f| self.get(*f).is_some())
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        REQUIRED_FIELDS
            .iter()
            .filter(|f| self.get(**f).is_none())
            .copied()
            .collect()
    }

    pub fn build(&self) -> Option<ColumnMapping> {
        let mut mapping = ColumnMapping::new(
            self.get(Field::GuestName)?,
            self.get(Field::CheckIn)?,
            self.get(Field::CheckOut)?,
            self.get(Field::Amount)?,
        );
        mapping.confirmation_code = self.get(Field::ConfirmationCode);
        mapping.nights = self.get(Field::Nights);
        mapping.cleaning_fee = self.get(Field::CleaningFee);
        mapping.commission = self.get(Field::Commission);
        mapping.status = self.get(Field::Status);
        mapping.listing = self.get(Field::Listing);
        Some(mapping)
    }
}

// ---------------------------------------------------------------------------
// Auto-detection
// ---------------------------------------------------------------------------

const GUEST_VARIANTS: &[&str] = &[
    "guest name",
    "guest name(s)",
    "guest",
    "hu\u{e9}sped",
    "huesped",
    "nombre",
    "name",
    "cliente",
    "traveler",
    "booked by",
];

const CHECK_IN_VARIANTS: &[&str] = &[
    "check-in",
    "checkin",
    "check in",
    "start date",
    "arrival",
    "llegada",
    "entrada",
    "fecha de inicio",
    "fecha entrada",
];

const CHECK_OUT_VARIANTS: &[&str] = &[
    "check-out",
    "checkout",
    "check out",
    "end date",
    "departure",
    "salida",
    "fecha de salida",
    "fecha salida",
];

const AMOUNT_VARIANTS: &[&str] = &[
    "amount",
    "importe",
    "total",
    "price",
    "precio",
    "earnings",
    "payout",
    "monto",
    "ganancias",
];

fn find_column(headers: &[String], variants: &[&str]) -> Option<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let h = header.to_lowercase();
        if variants.iter().any(|v| h == *v || h.contains(v)) {
            return Some(idx);
        }
    }
    None
}

/// Attempt a complete required-field mapping from header names alone.
/// All-or-nothing: a partial detection returns None so the user is never
/// shown a mapping with a silently defaulted field.
pub fn auto_detect_columns(headers: &[String]) -> Option<ColumnMapping> {
    let guest = find_column(headers, GUEST_VARIANTS)?;
    let check_in = find_column(headers, CHECK_IN_VARIANTS)?;
    let check_out = find_column(headers, CHECK_OUT_VARIANTS)?;
    let amount = find_column(headers, AMOUNT_VARIANTS)?;

    let mut indices = [guest, check_in, check_out, amount];
    indices.sort_unstable();
    if indices.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    Some(ColumnMapping::new(guest, check_in, check_out, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(h: &[&str]) -> Vec<String> {
        h.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_auto_detect_spanish_headers() {
        let h = headers(&["Hu\u{e9}sped", "Check-in", "Check-out", "Importe"]);
        let m = auto_detect_columns(&h).unwrap();
        assert_eq!(m.guest_name, 0);
        assert_eq!(m.check_in, 1);
        assert_eq!(m.check_out, 2);
        assert_eq!(m.amount, 3);
    }

    #[test]
    fn test_auto_detect_any_order() {
        let h = headers(&["Total", "Departure", "Arrival", "Guest"]);
        let m = auto_detect_columns(&h).unwrap();
        assert_eq!(m.amount, 0);
        assert_eq!(m.check_out, 1);
        assert_eq!(m.check_in, 2);
        assert_eq!(m.guest_name, 3);
    }

    #[test]
    fn test_auto_detect_all_or_nothing() {
        // No amount column anywhere
        let h = headers(&["Guest", "Check-in", "Check-out", "Notes"]);
        assert!(auto_detect_columns(&h).is_none());
    }

    #[test]
    fn test_auto_detect_rejects_colliding_columns() {
        // "Entrada/Salida" would satisfy check-in before check-out gets a
        // chance at a distinct column.
        let h = headers(&["Guest", "Entrada", "Importe"]);
        assert!(auto_detect_columns(&h).is_none());
    }

    #[test]
    fn test_draft_one_column_one_field() {
        let mut draft = MappingDraft::default();
        draft.set(Field::GuestName, 0);
        draft.set(Field::CheckIn, 0);
        assert_eq!(draft.get(Field::GuestName), None);
        assert_eq!(draft.get(Field::CheckIn), Some(0));
    }

    #[test]
    fn test_draft_reassigning_field_frees_old_column() {
        let mut draft = MappingDraft::default();
        draft.set(Field::Amount, 3);
        draft.set(Field::Amount, 5);
        assert_eq!(draft.get(Field::Amount), Some(5));
        assert_eq!(draft.column_field(3), None);
    }

    #[test]
    fn test_draft_completion_gate() {
        let mut draft = MappingDraft::default();
        draft.set(Field::GuestName, 0);
        draft.set(Field::CheckIn, 1);
        draft.set(Field::CheckOut, 2);
        assert!(!draft.is_complete());
        assert_eq!(draft.missing_fields(), vec![Field::Amount]);
        draft.set(Field::Amount, 3);
        assert!(draft.is_complete());
        assert!(draft.build().is_some());
    }

    #[test]
    fn test_mapping_validate_out_of_range() {
        let m = ColumnMapping::new(0, 1, 2, 9);
        assert!(m.validate(4).is_err());
        assert!(ColumnMapping::new(0, 1, 2, 3).validate(4).is_ok());
    }

    #[test]
    fn test_mapping_json_field_names() {
        let mut m = ColumnMapping::new(0, 1, 2, 3);
        m.listing = Some(4);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["guestName"], 0);
        assert_eq!(json["checkIn"], 1);
        assert_eq!(json["listing"], 4);
        assert!(json.get("nights").is_none());
    }

    #[test]
    fn test_config_json_shape() {
        let config = ImportConfig::default();
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["dateFormat"], "DD/MM/YYYY");
        assert_eq!(json["numberFormat"], "EU");
        assert_eq!(json["amountType"], "NET");
        assert_eq!(json["platform"], "OTHER");
    }
}
