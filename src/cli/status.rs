use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::{format_bytes, money};
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("casona.db");

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Mapper:     {}", settings.mapper);
    println!("Formats:    {} dates, {} numbers", settings.date_format, settings.number_format);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;

        let units: i64 = conn.query_row("SELECT count(*) FROM units", [], |r| r.get(0))?;
        let aliases: i64 = conn.query_row("SELECT count(*) FROM unit_aliases", [], |r| r.get(0))?;
        let reservations: i64 =
            conn.query_row("SELECT count(*) FROM reservations", [], |r| r.get(0))?;
        let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;
        let templates: i64 = conn.query_row("SELECT count(*) FROM templates", [], |r| r.get(0))?;
        let revenue: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM reservations WHERE status != 'Cancelada'",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Units:         {units}");
        println!("Aliases:       {aliases}");
        println!("Reservations:  {reservations}");
        println!("Imports:       {imports}");
        println!("Templates:     {templates}");
        println!("Revenue:       {}", money(revenue));
    } else {
        println!();
        println!("Database not found. Run `casona init` to set up.");
    }

    Ok(())
}
