use comfy_table::{Cell, Table};

use crate::db::{get_connection, load_units};
use crate::error::Result;
use crate::settings::get_data_dir;

pub fn add(name: &str, code: Option<&str>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    conn.execute(
        "INSERT INTO units (name, code) VALUES (?1, ?2)",
        rusqlite::params![name, code],
    )?;
    println!("Added unit: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let units = load_units(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Code", "Reservations"]);
    for unit in units {
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM reservations WHERE unit_id = ?1",
            [unit.id],
            |r| r.get(0),
        )?;
        table.add_row(vec![
            Cell::new(unit.id),
            Cell::new(unit.name),
            Cell::new(unit.code.unwrap_or_default()),
            Cell::new(count),
        ]);
    }
    println!("Billing units\n{table}");
    Ok(())
}
