use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};

use crate::dimension::Dimension;
use crate::entity::{Metro, State};
use crate::util::ensure_directory;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

pub const ENTITY_SCHEMA: &str = "
CREATE TABLE metros (
  slug TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  cbsa TEXT NOT NULL,
  state_abbr TEXT,
  population INTEGER,
  wagedex_area TEXT
);
CREATE TABLE states (
  slug TEXT PRIMARY KEY,
  abbr TEXT NOT NULL,
  name TEXT NOT NULL,
  fips TEXT
);
CREATE TABLE counties (
  slug TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  state_abbr TEXT NOT NULL,
  state_name TEXT NOT NULL,
  fips TEXT NOT NULL,
  population INTEGER
);
CREATE TABLE popular_comparisons (
  slug_a TEXT NOT NULL,
  slug_b TEXT NOT NULL,
  level TEXT NOT NULL,
  PRIMARY KEY (slug_a, slug_b)
);
CREATE INDEX idx_metros_cbsa ON metros(cbsa);
CREATE INDEX idx_metros_state ON metros(state_abbr);
CREATE INDEX idx_counties_fips ON counties(fips);
CREATE INDEX idx_counties_state ON counties(state_abbr);
";

pub fn life_scores_schema() -> String {
    let score_columns: Vec<String> = Dimension::ALL
        .iter()
        .map(|dimension| format!("  {} REAL,", dimension.score_column()))
        .collect();

    format!(
        "CREATE TABLE life_scores (
  slug TEXT PRIMARY KEY,
  type TEXT NOT NULL,
  name TEXT NOT NULL,
{}
  composite_score REAL NOT NULL,
  grade TEXT NOT NULL
);
CREATE INDEX idx_life_scores_type_composite ON life_scores(type, composite_score DESC);
",
        score_columns.join("\n")
    )
}

pub fn open_compare_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_metadata(&connection)?;
    Ok(connection)
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_metadata(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
        ",
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Drops and recreates the entity and comparison tables inside `tx`.
pub fn recreate_entity_tables(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "
        DROP TABLE IF EXISTS popular_comparisons;
        DROP TABLE IF EXISTS counties;
        DROP TABLE IF EXISTS states;
        DROP TABLE IF EXISTS metros;
        ",
    )
    .context("failed to drop entity tables")?;
    tx.execute_batch(ENTITY_SCHEMA)
        .context("failed to create entity tables")?;
    Ok(())
}

pub fn recreate_life_scores_table(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch("DROP TABLE IF EXISTS life_scores;")
        .context("failed to drop life_scores")?;
    tx.execute_batch(&life_scores_schema())
        .context("failed to create life_scores")?;
    Ok(())
}

pub fn table_exists(connection: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

pub fn load_metros(connection: &Connection) -> Result<Vec<Metro>> {
    let mut statement = connection
        .prepare(
            "
            SELECT slug, name, cbsa, state_abbr, population, wagedex_area
            FROM metros
            ORDER BY name COLLATE NOCASE, slug
            ",
        )
        .context("failed to read metros; run `join` first")?;

    let mut rows = statement.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(Metro {
            slug: row.get(0)?,
            name: row.get(1)?,
            cbsa: row.get(2)?,
            state_abbr: row.get(3)?,
            population: row.get(4)?,
            wagedex_area: row.get(5)?,
        });
    }

    Ok(out)
}

pub fn load_states(connection: &Connection) -> Result<Vec<State>> {
    let mut statement = connection
        .prepare(
            "
            SELECT slug, abbr, name, fips
            FROM states
            ORDER BY name COLLATE NOCASE, slug
            ",
        )
        .context("failed to read states; run `join` first")?;

    let mut rows = statement.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(State {
            slug: row.get(0)?,
            abbr: row.get(1)?,
            name: row.get(2)?,
            fips: row.get(3)?,
        });
    }

    Ok(out)
}

pub fn count_by_column(
    connection: &Connection,
    table_name: &str,
    column: &str,
) -> Result<Vec<(String, i64)>> {
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM {table_name} GROUP BY {column} ORDER BY {column}"
    );
    let mut statement = connection.prepare(&sql)?;
    let rows = statement.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
