use std::path::PathBuf;

use chrono::Local;

use crate::db::{find_unit_id, get_connection};
use crate::error::{CasonaError, Result};
use crate::settings::get_data_dir;

pub fn run(output: Option<&str>, unit: Option<&str>) -> Result<()> {
    let data_dir = get_data_dir();
    let conn = get_connection(&data_dir.join("casona.db"))?;

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let stamp = Local::now().format("%Y%m%d");
            data_dir.join("exports").join(format!("reservations-{stamp}.csv"))
        }
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut sql = String::from(
        "SELECT u.name, r.guest_name, r.check_in, r.check_out, r.nights, r.amount, \
         r.cleaning_fee, r.commission, r.confirmation_code, r.status, r.platform \
         FROM reservations r JOIN units u ON u.id = r.unit_id",
    );
    let unit_id = match unit {
        Some(name) => {
            sql.push_str(" WHERE r.unit_id = ?1");
            Some(
                find_unit_id(&conn, name)
                    .ok_or_else(|| CasonaError::UnknownUnit(name.to_string()))?,
            )
        }
        None => None,
    };
    sql.push_str(" ORDER BY r.check_in");

    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, f64>(5)?,
            row.get::<_, f64>(6)?,
            row.get::<_, f64>(7)?,
            row.get::<_, String>(8)?,
            row.get::<_, String>(9)?,
            row.get::<_, String>(10)?,
        ))
    };
    let rows: Vec<_> = match unit_id {
        Some(id) => stmt.query_map([id], map_row)?.collect::<std::result::Result<_, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<std::result::Result<_, _>>()?,
    };

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "unit", "guest_name", "check_in", "check_out", "nights", "amount", "cleaning_fee",
        "commission", "confirmation_code", "status", "platform",
    ])?;
    let count = rows.len();
    for (unit_name, guest, check_in, check_out, nights, amount, cleaning, commission, code, status, platform) in rows {
        writer.write_record([
            unit_name,
            guest,
            check_in,
            check_out,
            nights.to_string(),
            format!("{amount:.2}"),
            format!("{cleaning:.2}"),
            format!("{commission:.2}"),
            code,
            status,
            platform,
        ])?;
    }
    writer.flush()?;

    println!("Exported {count} reservations to {}", path.display());
    Ok(())
}
