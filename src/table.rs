use std::path::Path;

use crate::error::{CasonaError, Result};

/// An imported file reduced to header + data rows. Every row has exactly
/// `headers.len()` columns; ragged source rows are padded or truncated.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Split one line into fields. Both `,` and `;` act as delimiters; a
/// double-quoted field may contain either, and `""` decodes to a literal
/// quote. Unmatched quotes are tolerated: whatever accumulated is emitted.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' | ';' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Parse full file text into a RawTable. Blank lines are dropped before
/// tokenization; the first remaining line is the header row.
pub fn parse_table(text: &str) -> Result<RawTable> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| CasonaError::Other("File is empty".to_string()))?;
    let headers = tokenize_line(header_line);
    let width = headers.len();

    let rows = lines
        .map(|line| {
            let mut fields = tokenize_line(line);
            fields.resize(width, String::new());
            fields
        })
        .collect();

    Ok(RawTable { headers, rows })
}

/// Read a CSV or spreadsheet file into a RawTable. Spreadsheets are
/// flattened to text cells before tokenization.
pub fn read_table(file_path: &Path) -> Result<RawTable> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => {
            let bytes = std::fs::read(file_path)?;
            let text = String::from_utf8_lossy(&bytes);
            parse_table(&text)
        }
        #[cfg(feature = "xlsx")]
        "xls" | "xlsx" => read_spreadsheet(file_path),
        _ => Err(CasonaError::UnsupportedFile(ext)),
    }
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet(file_path: &Path) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| CasonaError::Other(format!("Failed to open spreadsheet: {e}")))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| CasonaError::Other("Spreadsheet has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| CasonaError::Other(format!("Failed to read sheet: {e}")))?;

    let mut all_rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::String(s) => s.trim().to_string(),
                    Data::Float(f) => {
                        if f.fract() == 0.0 {
                            format!("{}", *f as i64)
                        } else {
                            format!("{f}")
                        }
                    }
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
                    _ => String::new(),
                })
                .collect()
        })
        .filter(|row: &Vec<String>| row.iter().any(|c| !c.is_empty()))
        .collect();

    if all_rows.is_empty() {
        return Err(CasonaError::Other("Spreadsheet is empty".to_string()));
    }
    let headers = all_rows.remove(0);
    let width = headers.len();
    for row in &mut all_rows {
        row.resize(width, String::new());
    }
    Ok(RawTable { headers, rows: all_rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_comma() {
        assert_eq!(
            tokenize_line("John Smith,01/02/2024,100"),
            vec!["John Smith", "01/02/2024", "100"]
        );
    }

    #[test]
    fn test_tokenize_semicolon() {
        assert_eq!(tokenize_line("a;b;c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenize_mixed_delimiters() {
        assert_eq!(tokenize_line("a,b;c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenize_quoted_delimiter_preserved() {
        assert_eq!(
            tokenize_line("\"Smith, John\",01/02/2024,100"),
            vec!["Smith, John", "01/02/2024", "100"]
        );
    }

    #[test]
    fn test_tokenize_escaped_quote() {
        assert_eq!(
            tokenize_line("\"The \"\"Blue\"\" House\",5"),
            vec!["The \"Blue\" House", "5"]
        );
    }

    #[test]
    fn test_tokenize_trims_whitespace() {
        assert_eq!(tokenize_line("  a  , b ,c  "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenize_unmatched_quote_lenient() {
        assert_eq!(tokenize_line("\"unterminated,field"), vec!["unterminated,field"]);
    }

    #[test]
    fn test_parse_table_filters_blank_lines() {
        let table = parse_table("a,b\n\n1,2\n\n3,4\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_parse_table_pads_and_truncates_ragged_rows() {
        let table = parse_table("a,b,c\n1,2\n1,2,3,4\n").unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_parse_table_empty_file() {
        assert!(parse_table("\n\n").is_err());
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(45667.0), "2025-01-10");
    }
}
