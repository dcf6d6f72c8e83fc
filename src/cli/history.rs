use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::outcome::ImportOutcome;
use crate::settings::get_data_dir;

pub fn run() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let mut stmt = conn.prepare(
        "SELECT id, filename, platform, import_date, date_range_start, date_range_end, summary \
         FROM imports ORDER BY import_date DESC, id DESC",
    )?;
    let rows: Vec<(i64, String, String, String, Option<String>, Option<String>, Option<String>)> =
        stmt.query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "File", "Platform", "When", "Dates", "Imported", "Skipped", "Errors"]);
    for (id, filename, platform, when, start, end, summary) in rows {
        // Summaries written by older releases use a different JSON shape;
        // from_json understands all of them.
        let outcome = summary
            .as_deref()
            .and_then(|s| ImportOutcome::from_json(s).ok())
            .unwrap_or_default();
        let dates = match (start, end) {
            (Some(s), Some(e)) if s != e => format!("{s} .. {e}"),
            (Some(s), _) => s,
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(filename),
            Cell::new(platform),
            Cell::new(when),
            Cell::new(dates),
            Cell::new(outcome.imported),
            Cell::new(outcome.skipped),
            Cell::new(outcome.errors.len()),
        ]);
    }
    println!("Imports\n{table}");
    Ok(())
}
