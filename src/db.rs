use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::{BillingUnit, UnitAlias};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS units (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    code TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS unit_aliases (
    id INTEGER PRIMARY KEY,
    unit_id INTEGER NOT NULL,
    listing_name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (unit_id) REFERENCES units(id)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    platform TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT,
    summary TEXT
);

CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY,
    unit_id INTEGER NOT NULL,
    guest_name TEXT NOT NULL,
    check_in TEXT NOT NULL,
    check_out TEXT NOT NULL,
    nights INTEGER NOT NULL,
    amount REAL NOT NULL,
    cleaning_fee REAL DEFAULT 0,
    commission REAL DEFAULT 0,
    confirmation_code TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Confirmada',
    platform TEXT NOT NULL DEFAULT 'OTHER',
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (unit_id) REFERENCES units(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS templates (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    mapping TEXT NOT NULL,
    config TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn load_units(conn: &Connection) -> Result<Vec<BillingUnit>> {
    let mut stmt = conn.prepare("SELECT id, name, code FROM units ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BillingUnit {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_aliases(conn: &Connection) -> Result<Vec<UnitAlias>> {
    let mut stmt =
        conn.prepare("SELECT id, unit_id, listing_name FROM unit_aliases ORDER BY listing_name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(UnitAlias {
                id: row.get(0)?,
                unit_id: row.get(1)?,
                listing_name: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_unit_id(conn: &Connection, name: &str) -> Option<i64> {
    conn.query_row("SELECT id FROM units WHERE name = ?1", [name], |r| r.get(0))
        .ok()
}

/// Remember that a listing name maps to a billing unit. Replaces any
/// previous owner of the same listing name.
pub fn save_alias(conn: &Connection, unit_id: i64, listing_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO unit_aliases (unit_id, listing_name) VALUES (?1, ?2) \
         ON CONFLICT(listing_name) DO UPDATE SET unit_id = excluded.unit_id",
        rusqlite::params![unit_id, listing_name],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["units", "unit_aliases", "reservations", "imports", "templates"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_save_alias_reassigns_owner() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO units (name) VALUES ('Casa Azul')", []).unwrap();
        conn.execute("INSERT INTO units (name) VALUES ('Casa Roja')", []).unwrap();
        let azul = find_unit_id(&conn, "Casa Azul").unwrap();
        let roja = find_unit_id(&conn, "Casa Roja").unwrap();

        save_alias(&conn, azul, "Cozy flat downtown").unwrap();
        save_alias(&conn, roja, "Cozy flat downtown").unwrap();

        let aliases = load_aliases(&conn).unwrap();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].unit_id, roja);
    }

    #[test]
    fn test_load_units_sorted() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO units (name, code) VALUES ('Zarzal', 'Z1')", []).unwrap();
        conn.execute("INSERT INTO units (name) VALUES ('Abeto')", []).unwrap();
        let units = load_units(&conn).unwrap();
        assert_eq!(units[0].name, "Abeto");
        assert_eq!(units[1].code.as_deref(), Some("Z1"));
    }
}
