use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::ExportArgs;
use crate::store::{ENTITY_SCHEMA, life_scores_schema, table_exists};
use crate::util::{ensure_directory, resolve_db_path};

const SCHEMA_FILE: &str = "00-schema.sql";

/// Tables in load order; foreign keys are by slug only, so order is cosmetic.
const SEED_TABLES: [(&str, &str); 5] = [
    ("metros", "01-metros.sql"),
    ("states", "02-states.sql"),
    ("counties", "03-counties.sql"),
    ("popular_comparisons", "04-comparisons.sql"),
    ("life_scores", "05-life-scores.sql"),
];

pub fn run(args: ExportArgs) -> Result<()> {
    if args.batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }

    let db_path = resolve_db_path(&args.data_root, args.db_path.as_ref());
    let seed_dir = args
        .seed_dir
        .clone()
        .unwrap_or_else(|| args.data_root.join("data").join("seed"));

    if !db_path.is_file() {
        bail!(
            "compare database missing at {}; run `join` first",
            db_path.display()
        );
    }

    let connection = Connection::open_with_flags(
        &db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open {}", db_path.display()))?;

    info!(db = %db_path.display(), seed_dir = %seed_dir.display(), "starting export");

    let written = export_seed(&connection, &seed_dir, args.batch_size)?;
    info!(files = written.len(), "export completed");

    Ok(())
}

/// Writes the schema file plus one file per non-empty table and returns the
/// paths written.
pub(crate) fn export_seed(
    connection: &Connection,
    seed_dir: &Path,
    batch_size: usize,
) -> Result<Vec<PathBuf>> {
    ensure_directory(seed_dir)?;

    let mut written = Vec::new();

    let schema_path = seed_dir.join(SCHEMA_FILE);
    fs::write(&schema_path, seed_schema())
        .with_context(|| format!("failed to write {}", schema_path.display()))?;
    info!(path = %schema_path.display(), "wrote schema");
    written.push(schema_path);

    for (table_name, file_name) in SEED_TABLES {
        let path = seed_dir.join(file_name);

        let rendered = if table_exists(connection, table_name)? {
            render_table(connection, table_name, batch_size)?
        } else {
            warn!(table = table_name, "table missing from compare database");
            None
        };

        let Some((row_count, body)) = rendered else {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove stale {}", path.display()))?;
            }
            continue;
        };

        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        info!(table = table_name, rows = row_count, path = %path.display(), "wrote seed file");
        written.push(path);
    }

    Ok(written)
}

fn seed_schema() -> String {
    let schema = format!("{}\n{}", ENTITY_SCHEMA.trim(), life_scores_schema().trim());
    let schema = schema
        .replace("CREATE TABLE ", "CREATE TABLE IF NOT EXISTS ")
        .replace("CREATE INDEX ", "CREATE INDEX IF NOT EXISTS ");
    format!("{schema}\n")
}

/// Renders `DELETE` plus batched `INSERT` statements; `None` for an empty table.
fn render_table(
    connection: &Connection,
    table_name: &str,
    batch_size: usize,
) -> Result<Option<(usize, String)>> {
    let mut statement = connection
        .prepare(&format!("SELECT * FROM {table_name} ORDER BY rowid"))
        .with_context(|| format!("failed to read {table_name}"))?;
    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect();

    let mut tuples = Vec::new();
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            cells.push(sql_literal(row.get_ref(index)?)?);
        }
        tuples.push(format!("({})", cells.join(",")));
    }

    if tuples.is_empty() {
        return Ok(None);
    }

    let mut lines = vec![
        format!("-- {table_name}: {} rows", tuples.len()),
        format!("DELETE FROM {table_name};"),
    ];
    for batch in tuples.chunks(batch_size) {
        lines.push(format!(
            "INSERT INTO {table_name} ({}) VALUES\n{};",
            columns.join(","),
            batch.join(",\n")
        ));
    }

    Ok(Some((tuples.len(), lines.join("\n") + "\n")))
}

fn sql_literal(value: ValueRef<'_>) -> Result<String> {
    let literal = match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).context("non-UTF-8 text value")?;
            format!("'{}'", text.replace('\'', "''"))
        }
        ValueRef::Blob(_) => bail!("blob values are not exported"),
    };
    Ok(literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "plaincompare-export-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn compare_db() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute_batch(ENTITY_SCHEMA).unwrap();
        connection
            .execute_batch(
                "
                INSERT INTO metros VALUES
                  ('coeur-d-alene-id', 'Coeur d''Alene, ID', '17660', 'ID', NULL, '0017660'),
                  ('boise-id', 'Boise, ID', '14260', 'ID', 764718, NULL);
                INSERT INTO states VALUES ('idaho', 'ID', 'Idaho', '16');
                INSERT INTO popular_comparisons VALUES ('boise-id', 'coeur-d-alene-id', 'metro');
                ",
            )
            .unwrap();
        connection.execute_batch(&life_scores_schema()).unwrap();
        connection
            .execute_batch(
                "INSERT INTO life_scores(slug, type, name, cost_score, composite_score, grade)
                 VALUES ('idaho', 'state', 'Idaho', 62.5, 50.0, 'D');",
            )
            .unwrap();
        connection
    }

    #[test]
    fn writes_schema_and_non_empty_tables_only() {
        let dir = scratch_dir("files");
        let written = export_seed(&compare_db(), &dir, 500).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "00-schema.sql",
                "01-metros.sql",
                "02-states.sql",
                "04-comparisons.sql",
                "05-life-scores.sql"
            ]
        );
        assert!(!dir.join("03-counties.sql").exists());

        let schema = fs::read_to_string(dir.join(SCHEMA_FILE)).unwrap();
        assert!(schema.contains("CREATE TABLE IF NOT EXISTS popular_comparisons"));
        assert!(schema.contains("CREATE INDEX IF NOT EXISTS idx_life_scores_type_composite"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rows_are_quoted_and_null_preserved() {
        let dir = scratch_dir("quote");
        export_seed(&compare_db(), &dir, 500).unwrap();

        let metros = fs::read_to_string(dir.join("01-metros.sql")).unwrap();
        let mut lines = metros.lines();
        assert_eq!(lines.next(), Some("-- metros: 2 rows"));
        assert_eq!(lines.next(), Some("DELETE FROM metros;"));
        assert!(metros.contains("'Coeur d''Alene, ID'"));
        assert!(metros.contains("'ID',NULL,'0017660')"));
        assert!(metros.contains("'ID',764718,NULL)"));

        let scores = fs::read_to_string(dir.join("05-life-scores.sql")).unwrap();
        assert!(scores.contains("62.5,NULL"));
        assert!(scores.contains(",50,'D')"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn batches_split_inserts() {
        let dir = scratch_dir("batch");
        export_seed(&compare_db(), &dir, 1).unwrap();

        let metros = fs::read_to_string(dir.join("01-metros.sql")).unwrap();
        assert_eq!(metros.matches("INSERT INTO metros").count(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn emptied_table_removes_stale_file() {
        let dir = scratch_dir("stale");
        let connection = compare_db();
        export_seed(&connection, &dir, 500).unwrap();
        assert!(dir.join("04-comparisons.sql").exists());

        connection.execute_batch("DELETE FROM popular_comparisons;").unwrap();
        export_seed(&connection, &dir, 500).unwrap();
        assert!(!dir.join("04-comparisons.sql").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
