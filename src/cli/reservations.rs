use comfy_table::{Cell, Table};

use crate::db::{find_unit_id, get_connection};
use crate::error::{CasonaError, Result};
use crate::fmt::money;
use crate::settings::get_data_dir;

pub fn list(unit: Option<&str>, status: Option<&str>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;

    let mut sql = String::from(
        "SELECT u.name, r.guest_name, r.check_in, r.check_out, r.nights, r.amount, \
         r.confirmation_code, r.status, r.platform \
         FROM reservations r JOIN units u ON u.id = r.unit_id WHERE 1=1",
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(name) = unit {
        let unit_id =
            find_unit_id(&conn, name).ok_or_else(|| CasonaError::UnknownUnit(name.to_string()))?;
        sql.push_str(" AND r.unit_id = ?");
        params.push(Box::new(unit_id));
    }
    if let Some(s) = status {
        sql.push_str(" AND r.status = ?");
        params.push(Box::new(s.to_string()));
    }
    sql.push_str(" ORDER BY r.check_in DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<(String, String, String, String, i64, f64, String, String, String)> = stmt
        .query_map(rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())), |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut total = 0.0;
    let mut table = Table::new();
    table.set_header(vec!["Unit", "Guest", "Check-in", "Check-out", "Nights", "Amount", "Code", "Status", "Platform"]);
    for (unit_name, guest, check_in, check_out, nights, amount, code, res_status, platform) in rows {
        if res_status != "Cancelada" {
            total += amount;
        }
        table.add_row(vec![
            Cell::new(unit_name),
            Cell::new(guest),
            Cell::new(check_in),
            Cell::new(check_out),
            Cell::new(nights),
            Cell::new(money(amount)),
            Cell::new(code),
            Cell::new(res_status),
            Cell::new(platform),
        ]);
    }
    println!("Reservations\n{table}");
    println!("Total (excluding cancelled): {}", money(total));
    Ok(())
}
