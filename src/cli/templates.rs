use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{CasonaError, Result};
use crate::mapping::{ColumnMapping, ImportConfig};
use crate::models::ImportTemplate;
use crate::settings::get_data_dir;

pub fn load_templates(conn: &Connection) -> Result<Vec<ImportTemplate>> {
    let mut stmt = conn.prepare("SELECT id, name, mapping, config FROM templates ORDER BY name")?;
    let raw: Vec<(i64, String, String, String)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut templates = Vec::with_capacity(raw.len());
    for (id, name, mapping, config) in raw {
        templates.push(ImportTemplate {
            id,
            name,
            mapping: serde_json::from_str(&mapping)?,
            config: serde_json::from_str(&config)?,
        });
    }
    Ok(templates)
}

pub fn find_template(conn: &Connection, name: &str) -> Result<ImportTemplate> {
    load_templates(conn)?
        .into_iter()
        .find(|t| t.name == name)
        .ok_or_else(|| CasonaError::UnknownTemplate(name.to_string()))
}

/// Persist a template, replacing any previous one with the same name.
pub fn save_template(
    conn: &Connection,
    name: &str,
    mapping: &ColumnMapping,
    config: &ImportConfig,
) -> Result<()> {
    conn.execute(
        "INSERT INTO templates (name, mapping, config) VALUES (?1, ?2, ?3) \
         ON CONFLICT(name) DO UPDATE SET mapping = excluded.mapping, config = excluded.config",
        rusqlite::params![
            name,
            serde_json::to_string(mapping)?,
            serde_json::to_string(config)?,
        ],
    )?;
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let templates = load_templates(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Date format", "Numbers", "Platform"]);
    for t in templates {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.name),
            Cell::new(t.config.date_format.label()),
            Cell::new(t.config.number_format.label()),
            Cell::new(t.config.platform),
        ]);
    }
    println!("Templates\n{table}");
    Ok(())
}

pub fn show(name: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let t = find_template(&conn, name)?;
    println!("Template: {}", t.name);
    println!("Mapping:  {}", serde_json::to_string_pretty(&t.mapping)?);
    println!(
        "Config:   {} dates, {} numbers, {} amounts, platform {}",
        t.config.date_format.label(),
        t.config.number_format.label(),
        t.config.amount_type.label(),
        t.config.platform,
    );
    Ok(())
}

pub fn save(
    name: &str,
    map: &[String],
    date_format: Option<&str>,
    number_format: Option<&str>,
    amount_type: Option<&str>,
) -> Result<()> {
    let mapping = super::parse_map_args(map)?
        .ok_or_else(|| CasonaError::MappingIncomplete("no --map flags given".to_string()))?;
    let config = super::import::config_from_flags(date_format, number_format, amount_type)?;

    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    save_template(&conn, name, &mapping, &config)?;
    println!("Saved template '{name}'.");
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("casona.db"))?;
    let deleted = conn.execute("DELETE FROM templates WHERE name = ?1", [name])?;
    if deleted == 0 {
        return Err(CasonaError::UnknownTemplate(name.to_string()));
    }
    println!("Deleted template '{name}'.");
    Ok(())
}
