use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use super::engine::{EntityMetrics, ScoredEntity, score_population};
use super::extract::MetricTables;
use super::types::{PopulationSummary, ScoreRunManifest};
use super::write::write_scores;
use crate::cli::ScoreArgs;
use crate::config::load_sources_config;
use crate::entity::EntityKind;
use crate::sources::SourceSet;
use crate::store::{DB_SCHEMA_VERSION, load_metros, load_states, open_compare_db, table_exists};
use crate::util::{manifest_dir, now_utc_string, resolve_db_path, utc_compact_string, write_json_pretty};

pub fn run(args: ScoreArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("score-{}", utc_compact_string(started_ts));

    let data_root = args.source.data_root.clone();
    let db_path = resolve_db_path(&data_root, args.db_path.as_ref());
    let score_manifest_path = args.score_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir(&data_root).join(format!("score_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(data_root = %data_root.display(), run_id = %run_id, "starting score");

    ensure_joined(&db_path)?;

    let config = load_sources_config(&args.source)?;
    let sources = SourceSet::open(&config)?;

    let mut connection = open_compare_db(&db_path)?;
    let scored = compute_scores(&connection, &sources)?;
    let rows_written = write_scores(&mut connection, &scored)?;

    let populations: Vec<PopulationSummary> = [EntityKind::Metro, EntityKind::State]
        .into_iter()
        .map(|kind| PopulationSummary::from_scored(kind, &scored))
        .collect();
    for population in &populations {
        info!(
            entity_type = population.entity_type.as_str(),
            entities = population.entities,
            no_data = population.no_data_entities,
            mean_composite = population.mean_composite.unwrap_or_default(),
            "scored population"
        );
    }

    let manifest = ScoreRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        db_path: db_path.display().to_string(),
        rows_written,
        populations,
    };
    write_json_pretty(&score_manifest_path, &manifest)?;

    info!(path = %score_manifest_path.display(), "wrote score run manifest");
    info!(rows = rows_written, "score completed");

    Ok(())
}

/// Reads joined entities and raw metrics, then scores metros and states
/// as separate populations. Does not write to the compare database.
pub(super) fn compute_scores(connection: &Connection, sources: &SourceSet) -> Result<Vec<ScoredEntity>> {
    check_join_tables(connection)?;

    let metros = load_metros(connection)?;
    let states = load_states(connection)?;
    let tables = MetricTables::load(sources)?;

    let metro_metrics: Vec<EntityMetrics> = metros
        .iter()
        .map(|metro| EntityMetrics {
            slug: metro.slug.clone(),
            name: metro.name.clone(),
            raw: tables.metro_metrics(metro),
        })
        .collect();
    let state_metrics: Vec<EntityMetrics> = states
        .iter()
        .map(|state| EntityMetrics {
            slug: state.slug.clone(),
            name: state.name.clone(),
            raw: tables.state_metrics(state),
        })
        .collect();

    let mut scored = score_population(EntityKind::Metro, &metro_metrics);
    scored.extend(score_population(EntityKind::State, &state_metrics));
    Ok(scored)
}

/// Checks the join output on a read-only connection, so a failed check
/// leaves the compare database untouched.
pub(super) fn ensure_joined(db_path: &Path) -> Result<()> {
    if !db_path.is_file() {
        bail!(
            "compare database missing at {}; run `join` first",
            db_path.display()
        );
    }

    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    check_join_tables(&connection)
}

fn check_join_tables(connection: &Connection) -> Result<()> {
    for table_name in ["metros", "states"] {
        if !table_exists(connection, table_name)? {
            bail!("compare database has no {table_name} table; run `join` first");
        }
    }
    Ok(())
}
