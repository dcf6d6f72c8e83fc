use std::path::PathBuf;

use chrono::{Duration, Local, NaiveDate};
use rusqlite::Connection;

use crate::db::{get_connection, init_db, save_alias};
use crate::error::Result;
use crate::preview::synthesize_code;
use crate::settings::load_settings;

const DEMO_UNITS: &[(&str, &str)] = &[
    ("Casa Azul", "CA"),
    ("Loft Centro", "LC"),
    ("Atico Mirador", "AM"),
];

const DEMO_ALIASES: &[(&str, &str)] = &[
    ("Casa Azul - Centro Historico", "Casa Azul"),
    ("Bright loft in the old town", "Loft Centro"),
];

const GUESTS: &[&str] = &[
    "Ana Garcia",
    "John Smith",
    "Marie Dubois",
    "Luca Rossi",
    "Emma Johansson",
    "Pedro Almeida",
    "Sophie Muller",
    "Tom Evans",
];

const PLATFORMS: &[&str] = &["AIRBNB", "BOOKING", "DIRECT"];

const STAY_NIGHTS: &[i64] = &[2, 3, 4, 5, 7];
const NIGHTLY_RATES: &[f64] = &[85.0, 95.0, 110.0, 120.0, 140.0];

/// Build a year of deterministic reservations across the demo units.
fn generate_reservations(units: &[(i64, &str)]) -> Vec<(i64, String, NaiveDate, NaiveDate, i64, f64, String)> {
    let today = Local::now().date_naive();
    let start = today - Duration::days(365);
    let mut out = Vec::new();

    for (u, (unit_id, _)) in units.iter().enumerate() {
        let mut cursor = start + Duration::days(u as i64 * 3);
        let mut i = u;
        while cursor < today {
            let nights = STAY_NIGHTS[i % STAY_NIGHTS.len()];
            let rate = NIGHTLY_RATES[(i + u) % NIGHTLY_RATES.len()];
            let guest = GUESTS[i % GUESTS.len()];
            let check_out = cursor + Duration::days(nights);
            let platform = PLATFORMS[i % PLATFORMS.len()];
            out.push((
                *unit_id,
                guest.to_string(),
                cursor,
                check_out,
                nights,
                rate * nights as f64,
                platform.to_string(),
            ));
            // Gap of a few days between stays
            cursor = check_out + Duration::days(2 + (i % 4) as i64);
            i += 1;
        }
    }
    out
}

fn insert_demo_data(conn: &Connection) -> Result<usize> {
    let mut unit_ids = Vec::new();
    for (name, code) in DEMO_UNITS {
        conn.execute(
            "INSERT INTO units (name, code) VALUES (?1, ?2)",
            rusqlite::params![name, code],
        )?;
        unit_ids.push((conn.last_insert_rowid(), *name));
    }

    for (listing, unit_name) in DEMO_ALIASES {
        let unit_id = unit_ids
            .iter()
            .find(|(_, n)| n == unit_name)
            .map(|(id, _)| *id)
            .unwrap_or(unit_ids[0].0);
        save_alias(conn, unit_id, listing)?;
    }

    let reservations = generate_reservations(&unit_ids);
    let count = reservations.len();
    for (unit_id, guest, check_in, check_out, nights, amount, platform) in &reservations {
        let status = if *check_out < Local::now().date_naive() {
            "Completada"
        } else {
            "Confirmada"
        };
        conn.execute(
            "INSERT INTO reservations (unit_id, guest_name, check_in, check_out, nights, amount, \
             confirmation_code, status, platform) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                unit_id,
                guest,
                check_in.to_string(),
                check_out.to_string(),
                nights,
                amount,
                synthesize_code(guest, Some(*check_in)),
                status,
                platform,
            ],
        )?;
    }
    Ok(count)
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = PathBuf::from(&settings.data_dir).join("casona.db");

    if !db_path.exists() {
        eprintln!("No database found. Run `casona init` first.");
        std::process::exit(1);
    }

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    // Idempotency guard
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM units WHERE name = ?1)",
        [DEMO_UNITS[0].0],
        |r| r.get(0),
    )?;
    if exists {
        println!("Demo data already loaded (unit '{}' exists).", DEMO_UNITS[0].0);
        return Ok(());
    }

    let count = insert_demo_data(&conn)?;

    println!("Demo data loaded!");
    println!("  Units:        {}", DEMO_UNITS.len());
    println!("  Aliases:      {}", DEMO_ALIASES.len());
    println!("  Reservations: {count}");
    println!();
    println!("Try these next:");
    println!("  casona units list");
    println!("  casona reservations");
    println!("  casona status");
    println!("  casona export");
    Ok(())
}
