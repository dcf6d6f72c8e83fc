use comfy_table::{Cell, Table};

use crate::db::{find_unit_id, get_connection, save_alias};
use crate::error::{CasonaError, Result};
use crate::settings::get_data_dir;

pub fn add(listing: &str, unit: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let unit_id = find_unit_id(&conn, unit)
        .ok_or_else(|| CasonaError::UnknownUnit(unit.to_string()))?;
    save_alias(&conn, unit_id, listing)?;
    println!("'{listing}' now maps to unit '{unit}'");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let mut stmt = conn.prepare(
        "SELECT a.id, a.listing_name, u.name FROM unit_aliases a \
         JOIN units u ON u.id = a.unit_id ORDER BY u.name, a.listing_name",
    )?;
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Listing name", "Unit"]);
    for (id, listing, unit) in rows {
        table.add_row(vec![Cell::new(id), Cell::new(listing), Cell::new(unit)]);
    }
    println!("Aliases\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let deleted = conn.execute("DELETE FROM unit_aliases WHERE id = ?1", [id])?;
    if deleted == 0 {
        println!("No alias with ID {id}.");
    } else {
        println!("Deleted alias {id}.");
    }
    Ok(())
}
