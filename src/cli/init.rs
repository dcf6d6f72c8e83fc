use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;
    std::fs::create_dir_all(dir.join("exports"))?;

    let db_path = dir.join("casona.db");
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("Initialized casona at {}", dir.display());
    println!();
    println!("Next steps:");
    println!("  casona units add 'Casa Azul' --code CA");
    println!("  casona import reservations.csv");
    Ok(())
}
