use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::score::types::ScoreRunManifest;
use crate::config::load_sources_config;
use crate::dimension::Dimension;
use crate::model::{JoinRunManifest, SourceInventoryManifest};
use crate::store::{count_by_column, count_rows, table_exists};
use crate::util::{manifest_dir, resolve_db_path};

#[derive(Debug, Default, PartialEq)]
struct DatabaseSummary {
    table_counts: Vec<(&'static str, i64)>,
    comparisons_by_level: Vec<(String, i64)>,
    scores_by_type: Vec<(String, i64)>,
    grades: Vec<(String, i64)>,
    dimension_coverage: Vec<(Dimension, i64)>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let data_root = &args.source.data_root;
    let manifests = manifest_dir(data_root);
    let db_path = resolve_db_path(data_root, args.db_path.as_ref());

    info!(data_root = %data_root.display(), "status requested");

    let config = load_sources_config(&args.source)?;
    for (kind, path) in config.entries() {
        if path.is_file() {
            info!(source = kind.as_str(), path = %path.display(), "source available");
        } else {
            warn!(source = kind.as_str(), path = %path.display(), "source missing");
        }
    }

    let inventory_path = manifests.join("source_inventory.json");
    if inventory_path.exists() {
        let inventory: SourceInventoryManifest = read_manifest(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            source_count = inventory.source_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_manifest(&manifests, "join_run_")? {
        Some(path) => {
            let join: JoinRunManifest = read_manifest(&path)?;
            info!(
                run_id = %join.run_id,
                status = %join.status,
                updated_at = %join.updated_at,
                metros = join.counts.metros,
                states = join.counts.states,
                counties = join.counts.counties,
                warnings = join.warnings.len(),
                "latest join run"
            );
        }
        None => warn!(dir = %manifests.display(), "no join run manifest"),
    }

    match latest_manifest(&manifests, "score_run_")? {
        Some(path) => {
            let score: ScoreRunManifest = read_manifest(&path)?;
            info!(
                run_id = %score.run_id,
                status = %score.status,
                updated_at = %score.updated_at,
                rows_written = score.rows_written,
                "latest score run"
            );
            for population in &score.populations {
                info!(
                    entity_type = population.entity_type.as_str(),
                    entities = population.entities,
                    no_data = population.no_data_entities,
                    "scored population"
                );
            }
        }
        None => warn!(dir = %manifests.display(), "no score run manifest"),
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "compare database missing");
        return Ok(());
    }

    let connection = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let summary = database_summary(&connection)?;

    for (table_name, rows) in &summary.table_counts {
        info!(table = *table_name, rows = *rows, "table rows");
    }
    for (level, rows) in &summary.comparisons_by_level {
        info!(level = %level, rows = *rows, "popular comparisons");
    }
    for (entity_type, rows) in &summary.scores_by_type {
        info!(entity_type = %entity_type, rows = *rows, "life scores");
    }
    for (grade, rows) in &summary.grades {
        info!(grade = %grade, rows = *rows, "grade distribution");
    }
    for (dimension, rows) in &summary.dimension_coverage {
        info!(dimension = dimension.label(), rows = *rows, "dimension coverage");
    }

    Ok(())
}

fn read_manifest<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn database_summary(connection: &Connection) -> Result<DatabaseSummary> {
    let mut summary = DatabaseSummary::default();

    for table_name in ["metros", "states", "counties", "popular_comparisons", "life_scores"] {
        if table_exists(connection, table_name)? {
            let rows = count_rows(connection, &format!("SELECT COUNT(*) FROM {table_name}"))?;
            summary.table_counts.push((table_name, rows));
        }
    }

    if table_exists(connection, "popular_comparisons")? {
        summary.comparisons_by_level = count_by_column(connection, "popular_comparisons", "level")?;
    }

    if table_exists(connection, "life_scores")? {
        summary.scores_by_type = count_by_column(connection, "life_scores", "type")?;
        summary.grades = count_by_column(connection, "life_scores", "grade")?;
        for dimension in Dimension::ALL {
            let covered = count_rows(
                connection,
                &format!("SELECT COUNT({}) FROM life_scores", dimension.score_column()),
            )?;
            summary.dimension_coverage.push((dimension, covered));
        }
    }

    Ok(summary)
}

/// Run manifests carry a compact UTC timestamp, so the lexically greatest
/// name is the newest.
fn latest_manifest(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix) && name.ends_with(".json"));
        if matches && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::commands::score::types::PopulationSummary;
    use crate::entity::EntityKind;
    use crate::store::{ENTITY_SCHEMA, life_scores_schema};
    use crate::util::write_json_pretty;

    #[test]
    fn summary_groups_comparisons_and_scores() {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute_batch(ENTITY_SCHEMA).unwrap();
        connection.execute_batch(&life_scores_schema()).unwrap();
        connection
            .execute_batch(
                "
                INSERT INTO popular_comparisons VALUES
                  ('a', 'b', 'metro'), ('a', 'c', 'metro'), ('ohio', 'texas', 'state');
                INSERT INTO life_scores(slug, type, name, cost_score, composite_score, grade) VALUES
                  ('a', 'metro', 'A', 10.0, 10.0, 'F'),
                  ('ohio', 'state', 'Ohio', NULL, 50.0, 'D');
                ",
            )
            .unwrap();

        let summary = database_summary(&connection).unwrap();

        assert_eq!(
            summary.comparisons_by_level,
            vec![("metro".to_string(), 2), ("state".to_string(), 1)]
        );
        assert_eq!(
            summary.scores_by_type,
            vec![("metro".to_string(), 1), ("state".to_string(), 1)]
        );
        assert_eq!(summary.grades, vec![("D".to_string(), 1), ("F".to_string(), 1)]);
        assert_eq!(summary.dimension_coverage[0], (Dimension::Cost, 1));
        assert_eq!(summary.dimension_coverage[1], (Dimension::Wages, 0));
        assert!(summary.table_counts.contains(&("counties", 0)));
    }

    #[test]
    fn summary_of_empty_database_is_empty() {
        let connection = Connection::open_in_memory().unwrap();
        assert_eq!(database_summary(&connection).unwrap(), DatabaseSummary::default());
    }

    #[test]
    fn latest_manifest_picks_newest_timestamp() {
        let dir = std::env::temp_dir().join(format!("plaincompare-status-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for name in [
            "join_run_20260101T000000Z.json",
            "join_run_20260301T000000Z.json",
            "score_run_20270101T000000Z.json",
        ] {
            fs::write(dir.join(name), "{}").unwrap();
        }

        let latest = latest_manifest(&dir, "join_run_").unwrap().unwrap();
        assert!(latest.ends_with("join_run_20260301T000000Z.json"));
        assert!(latest_manifest(&dir, "export_").unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn score_manifest_reads_back_typed() {
        let dir = std::env::temp_dir().join(format!(
            "plaincompare-status-score-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("score_run_20260101T000000Z.json");

        let manifest = ScoreRunManifest {
            manifest_version: 1,
            run_id: "score-20260101T000000Z".to_string(),
            db_schema_version: "0.1.0".to_string(),
            status: "completed".to_string(),
            started_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:01Z".to_string(),
            db_path: "compare.db".to_string(),
            rows_written: 7,
            populations: vec![PopulationSummary {
                entity_type: EntityKind::State,
                entities: 3,
                no_data_entities: 1,
                dimension_coverage: BTreeMap::from([(Dimension::Cost, 2)]),
                grade_counts: BTreeMap::from([("D".to_string(), 1)]),
                mean_composite: Some(50.0),
            }],
        };
        write_json_pretty(&path, &manifest).unwrap();

        let read: ScoreRunManifest = read_manifest(&path).unwrap();
        assert_eq!(read.rows_written, 7);
        assert_eq!(read.populations, manifest.populations);

        fs::write(&path, r#"{"run_id": "partial"}"#).unwrap();
        let err = read_manifest::<ScoreRunManifest>(&path).unwrap_err().to_string();
        assert!(err.contains("failed to parse"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
