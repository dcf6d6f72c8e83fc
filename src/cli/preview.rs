use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::importer::plan_import;
use crate::preview::build_preview;
use crate::settings::get_data_dir;
use crate::table::read_table;

use super::import::config_from_flags;
use super::templates::find_template;

pub fn run(
    file: &str,
    template: Option<&str>,
    map: &[String],
    date_format: Option<&str>,
    number_format: Option<&str>,
    rows: usize,
) -> Result<()> {
    let table = read_table(&PathBuf::from(file))?;

    let manual = if let Some(mapping) = super::parse_map_args(map)? {
        Some((mapping, config_from_flags(date_format, number_format, None)?))
    } else if let Some(name) = template {
        let conn = get_connection(&get_data_dir().join("casona.db"))?;
        let t = find_template(&conn, name)?;
        Some((t.mapping, t.config))
    } else {
        None
    };

    let plan = match plan_import(&table, manual) {
        Ok(plan) => plan,
        Err(crate::error::CasonaError::MappingIncomplete(_)) => {
            let mapping = crate::mapping::auto_detect_columns(&table.headers).ok_or_else(|| {
                crate::error::CasonaError::MappingIncomplete(
                    "columns not recognized; pass --map or --template".to_string(),
                )
            })?;
            plan_import(
                &table,
                Some((mapping, config_from_flags(date_format, number_format, None)?)),
            )?
        }
        Err(e) => return Err(e),
    };
    println!("Detected format: {}", plan.kind.name());

    let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);

    let mut out = Table::new();
    out.set_header(vec!["Row", "Guest", "Check-in", "Check-out", "Nights", "Amount", "Status", "Listing", "Problems"]);
    for r in preview.rows.iter().take(rows) {
        out.add_row(vec![
            Cell::new(r.row_index + 2),
            Cell::new(&r.guest_name),
            Cell::new(r.check_in.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(r.check_out.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(r.nights),
            Cell::new(money(r.amount)),
            Cell::new(&r.status),
            Cell::new(r.listing.clone().unwrap_or_default()),
            Cell::new(r.errors.join("; ")),
        ]);
    }
    println!("{out}");
    if preview.rows.len() > rows {
        println!("... and {} more rows", preview.rows.len() - rows);
    }

    println!(
        "{} valid, {} with errors, {} nights, {} total",
        preview.stats.valid.to_string().green(),
        preview.stats.invalid,
        preview.stats.total_nights,
        money(preview.stats.total_amount).green(),
    );
    println!("(preview only, nothing was imported)");
    Ok(())
}
