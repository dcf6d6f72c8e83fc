use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::{find_unit_id, get_connection, load_aliases, load_units, save_alias};
use crate::error::{CasonaError, Result};
use crate::fmt::money;
use crate::importer::{
    commit_import, compute_checksum, plan_import, ImportOptions, PlannedImport,
};
use crate::mapping::{AmountType, ColumnMapping, DateFormat, ImportConfig, NumberFormat};
use crate::matcher::{collect_listings, ListingMapping};
use crate::models::{BillingUnit, ParsedReservation};
use crate::outcome::ImportOutcome;
use crate::preview::build_preview;
use crate::settings::{get_data_dir, load_settings};
use crate::table::read_table;
use crate::tui::run_screen;

use super::listing_screen::ListingScreen;
use super::mapper_form::FormMapper;
use super::mapper_grid::GridMapper;
use super::templates::{find_template, save_template};

pub struct ImportArgs {
    pub file: String,
    pub unit: Option<String>,
    pub template: Option<String>,
    pub mapper: Option<String>,
    pub map: Vec<String>,
    pub date_format: Option<String>,
    pub number_format: Option<String>,
    pub amount_type: Option<String>,
    pub replace: bool,
    pub allow_duplicates: bool,
    pub yes: bool,
}

/// Import config from settings defaults plus CLI overrides.
pub(crate) fn config_from_flags(
    date_format: Option<&str>,
    number_format: Option<&str>,
    amount_type: Option<&str>,
) -> Result<ImportConfig> {
    let settings = load_settings();
    let mut config = ImportConfig {
        date_format: DateFormat::parse(&settings.date_format).unwrap_or(DateFormat::Dmy),
        number_format: NumberFormat::parse(&settings.number_format).unwrap_or(NumberFormat::Eu),
        ..ImportConfig::default()
    };
    if let Some(s) = date_format {
        config.date_format = DateFormat::parse(s)
            .ok_or_else(|| CasonaError::Other(format!("Unknown date format '{s}'")))?;
    }
    if let Some(s) = number_format {
        config.number_format = NumberFormat::parse(s)
            .ok_or_else(|| CasonaError::Other(format!("Unknown number format '{s}'")))?;
    }
    if let Some(s) = amount_type {
        config.amount_type = AmountType::parse(s)
            .ok_or_else(|| CasonaError::Other(format!("Unknown amount type '{s}'")))?;
    }
    Ok(config)
}

/// Non-interactive mapping sources, in precedence order: --map flags,
/// then a named template.
fn manual_mapping(
    conn: &Connection,
    args: &ImportArgs,
) -> Result<Option<(ColumnMapping, ImportConfig)>> {
    if let Some(mapping) = super::parse_map_args(&args.map)? {
        let config = config_from_flags(
            args.date_format.as_deref(),
            args.number_format.as_deref(),
            args.amount_type.as_deref(),
        )?;
        return Ok(Some((mapping, config)));
    }
    if let Some(name) = &args.template {
        let t = find_template(conn, name)?;
        return Ok(Some((t.mapping, t.config)));
    }
    Ok(None)
}

/// Run the interactive mapper the user configured. Returns None when the
/// user cancelled, along with an optional template name to save under.
fn run_mapper(
    conn: &Connection,
    args: &ImportArgs,
    headers: Vec<String>,
    rows: &[Vec<String>],
) -> Result<Option<(ColumnMapping, ImportConfig, Option<String>)>> {
    let variant = args
        .mapper
        .clone()
        .unwrap_or_else(|| load_settings().mapper);
    let config = config_from_flags(
        args.date_format.as_deref(),
        args.number_format.as_deref(),
        args.amount_type.as_deref(),
    )?;

    match variant.as_str() {
        "grid" => {
            let mut screen = GridMapper::new(headers, rows);
            Ok(run_screen(&mut screen)?.map(|mapping| (mapping, config, None)))
        }
        "form" => {
            let templates = super::templates::load_templates(conn)?;
            let mut screen = FormMapper::new(headers, rows, config, templates);
            Ok(run_screen(&mut screen)?
                .map(|result| (result.mapping, result.config, result.save_template)))
        }
        other => Err(CasonaError::Other(format!(
            "Unknown mapper '{other}' (expected form or grid)"
        ))),
    }
}

fn print_preview(parsed: &[ParsedReservation], stats: &crate::preview::PreviewStats) {
    let mut table = Table::new();
    table.set_header(vec!["Row", "Guest", "Check-in", "Check-out", "Nights", "Amount", "Status", "Problems"]);
    for r in parsed.iter().take(10) {
        table.add_row(vec![
            Cell::new(r.row_index + 2),
            Cell::new(&r.guest_name),
            Cell::new(r.check_in.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(r.check_out.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(r.nights),
            Cell::new(money(r.amount)),
            Cell::new(&r.status),
            Cell::new(r.errors.join("; ")),
        ]);
    }
    println!("{table}");
    if parsed.len() > 10 {
        println!("... and {} more rows", parsed.len() - 10);
    }
    println!(
        "{} valid, {} with errors, {} nights, {} total",
        stats.valid.to_string().green(),
        if stats.invalid > 0 {
            stats.invalid.to_string().red()
        } else {
            stats.invalid.to_string().normal()
        },
        stats.total_nights,
        money(stats.total_amount).green(),
    );
}

/// Route every distinct listing name to a unit. Suggestions at or above
/// the confidence threshold resolve silently; anything else opens the
/// assignment screen (or fails under --yes).
fn resolve_listings(
    conn: &Connection,
    parsed: &[ParsedReservation],
    units: &[BillingUnit],
    yes: bool,
) -> Result<Option<HashMap<String, i64>>> {
    let names: Vec<String> = parsed
        .iter()
        .filter(|r| r.is_valid())
        .filter_map(|r| r.listing.clone())
        .collect();
    if names.is_empty() {
        return Ok(Some(HashMap::new()));
    }

    let aliases = load_aliases(conn)?;
    let listings = collect_listings(&names, units, &aliases);

    if listings.iter().all(|l| !l.needs_manual_assignment) {
        let routing = listings
            .iter()
            .map(|l| (l.name.clone(), l.suggested_unit_id.unwrap_or_default()))
            .collect();
        return Ok(Some(routing));
    }

    if yes {
        let first = listings
            .iter()
            .find(|l| l.needs_manual_assignment)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        return Err(CasonaError::UnassignedListing(first));
    }

    let mut screen = ListingScreen::new(listings, units.to_vec());
    let Some(mappings) = run_screen(&mut screen)? else {
        return Ok(None);
    };

    let mut routing = HashMap::new();
    for ListingMapping { listing_name, unit_id, save_as_alias } in mappings {
        if save_as_alias {
            save_alias(conn, unit_id, &listing_name)?;
        }
        routing.insert(listing_name, unit_id);
    }
    Ok(Some(routing))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_outcome(outcome: &ImportOutcome) {
    println!(
        "{} imported, {} skipped (duplicates)",
        outcome.imported.to_string().green(),
        outcome.skipped
    );
    for e in &outcome.errors {
        println!("  {} row {}: {}", "!".red(), e.row, e.reason);
    }
}

pub fn run(args: ImportArgs) -> Result<()> {
    let file_path = PathBuf::from(&args.file);
    let mut conn = get_connection(&get_data_dir().join("casona.db"))?;

    let table = read_table(&file_path)?;
    let manual = manual_mapping(&conn, &args)?;

    let mut pending_template: Option<String> = None;
    let plan: PlannedImport = match plan_import(&table, manual) {
        Ok(plan) => plan,
        // Header names first, interactive mapper as the fallback.
        Err(CasonaError::MappingIncomplete(_)) => {
            if let Some(mapping) = crate::mapping::auto_detect_columns(&table.headers) {
                let config = config_from_flags(
                    args.date_format.as_deref(),
                    args.number_format.as_deref(),
                    args.amount_type.as_deref(),
                )?;
                plan_import(&table, Some((mapping, config)))?
            } else if args.yes {
                return Err(CasonaError::MappingIncomplete(
                    "columns not recognized; pass --map or --template".to_string(),
                ));
            } else {
                let Some((mapping, config, template_name)) =
                    run_mapper(&conn, &args, table.headers.clone(), &table.rows)?
                else {
                    println!("Import cancelled.");
                    return Ok(());
                };
                pending_template = template_name;
                plan_import(&table, Some((mapping, config)))?
            }
        }
        Err(e) => return Err(e),
    };

    if let Some(name) = &pending_template {
        save_template(&conn, name, &plan.mapping, &plan.config)?;
        println!("Saved template '{name}'.");
    }

    println!("Detected format: {}", plan.kind.name());
    let preview = build_preview(&plan.rows, &plan.mapping, &plan.config, None);
    print_preview(&preview.rows, &preview.stats);

    if preview.stats.valid == 0 {
        return Err(CasonaError::Other("No valid rows to import".to_string()));
    }

    let units = load_units(&conn)?;
    let fallback_unit = match &args.unit {
        Some(name) => Some(
            find_unit_id(&conn, name).ok_or_else(|| CasonaError::UnknownUnit(name.clone()))?,
        ),
        None => None,
    };

    let Some(routing) = resolve_listings(&conn, &preview.rows, &units, args.yes)? else {
        println!("Import cancelled.");
        return Ok(());
    };

    if !args.yes && !confirm(&format!("Import {} reservations?", preview.stats.valid))? {
        println!("Import cancelled.");
        return Ok(());
    }

    let checksum = compute_checksum(&file_path)?;
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| args.file.clone());
    let opts = ImportOptions { replace: args.replace, allow_duplicates: args.allow_duplicates };

    let result = commit_import(
        &mut conn,
        &filename,
        &checksum,
        plan.config.platform,
        &preview.rows,
        &routing,
        fallback_unit,
        &opts,
    )?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }
    print_outcome(&result.outcome);
    Ok(())
}
