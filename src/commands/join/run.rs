use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use super::comparisons::{
    PRIORITY_METROS, PRIORITY_STATES, all_pairs, filter_known, top_counties_by_population,
};
use super::entities::{KeyChecks, enrich_states, load_canonical_states, load_counties, load_metros};
use super::lookups::JoinLookups;
use super::write::write_join_output;
use crate::cli::JoinArgs;
use crate::config::load_sources_config;
use crate::entity::{County, EntityKind, Metro, PopularComparison, State};
use crate::model::{JoinCounts, JoinRunManifest};
use crate::sources::SourceSet;
use crate::store::{DB_SCHEMA_VERSION, open_compare_db};
use crate::util::{manifest_dir, now_utc_string, resolve_db_path, utc_compact_string, write_json_pretty};

pub fn run(args: JoinArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("join-{}", utc_compact_string(started_ts));

    let data_root = args.source.data_root.clone();
    let db_path = resolve_db_path(&data_root, args.db_path.as_ref());
    let join_manifest_path = args.join_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir(&data_root).join(format!("join_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(data_root = %data_root.display(), run_id = %run_id, "starting join");

    let config = load_sources_config(&args.source)?;
    let sources = SourceSet::open(&config)?;

    let mut output = build_join(&sources, args.top_counties)?;

    let mut connection = open_compare_db(&db_path)?;
    let inserted = write_join_output(
        &mut connection,
        &output.metros,
        &output.states,
        &output.counties,
        &output.comparisons,
    )?;
    output.counts.metro_comparisons = inserted.metro;
    output.counts.state_comparisons = inserted.state;
    output.counts.county_comparisons = inserted.county;

    info!(
        metros = output.counts.metros,
        states = output.counts.states,
        counties = output.counts.counties,
        comparisons = inserted.metro + inserted.state + inserted.county,
        "join completed"
    );

    let manifest = JoinRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        db_path: db_path.display().to_string(),
        top_counties: args.top_counties,
        counts: output.counts,
        warnings: output.warnings,
    };
    write_json_pretty(&join_manifest_path, &manifest)?;
    info!(path = %join_manifest_path.display(), "wrote join run manifest");

    Ok(())
}

pub(super) struct JoinOutput {
    pub(super) metros: Vec<Metro>,
    pub(super) states: Vec<State>,
    pub(super) counties: Vec<County>,
    pub(super) comparisons: Vec<PopularComparison>,
    pub(super) counts: JoinCounts,
    pub(super) warnings: Vec<String>,
}

/// Reads every source and assembles the join in memory; writes nothing.
pub(super) fn build_join(sources: &SourceSet, top_counties: usize) -> Result<JoinOutput> {
    let checks = KeyChecks::new()?;
    let mut warnings = Vec::new();

    let canonical_states = load_canonical_states(&sources.cost)?;
    let lookups = JoinLookups::build(&sources.wage, &sources.crime, &canonical_states)?;
    info!(
        wage_metro_areas = lookups.wage_metro_area_count(),
        "built join lookup tables"
    );

    let metros = load_metros(&sources.cost, &lookups, &checks, &mut warnings)?;
    let states = enrich_states(canonical_states, &lookups, &checks, &mut warnings);
    let counties = load_counties(&sources.childcare, &lookups, &checks, &mut warnings)?;

    let malformed_keys = warnings.len();
    if malformed_keys > 0 {
        warn!(count = malformed_keys, "entities with malformed identity or join keys");
    }

    let metro_slugs: HashSet<&str> = metros.iter().map(|m| m.slug.as_str()).collect();
    let state_slugs: HashSet<&str> = states.iter().map(|s| s.slug.as_str()).collect();

    let priority_metros = filter_known(&PRIORITY_METROS, &metro_slugs);
    let priority_states = filter_known(&PRIORITY_STATES, &state_slugs);
    for (level, filter) in [
        (EntityKind::Metro, &priority_metros),
        (EntityKind::State, &priority_states),
    ] {
        info!(
            level = level.as_str(),
            kept = filter.kept.len(),
            dropped = filter.dropped.len(),
            "filtered priority list"
        );
        if !filter.dropped.is_empty() {
            warn!(
                level = level.as_str(),
                count = filter.dropped.len(),
                slugs = %filter.dropped.join(","),
                "priority entries missing from joined entities"
            );
        }
    }
    let county_slugs = top_counties_by_population(&counties, top_counties);

    let mut comparisons: Vec<PopularComparison> = Vec::new();
    comparisons.extend(all_pairs(&priority_metros.kept, EntityKind::Metro)?);
    comparisons.extend(all_pairs(&priority_states.kept, EntityKind::State)?);
    comparisons.extend(all_pairs(&county_slugs, EntityKind::County)?);

    let counts = JoinCounts {
        metros: metros.len(),
        metros_with_wage_area: metros.iter().filter(|m| m.wagedex_area.is_some()).count(),
        states: states.len(),
        states_with_fips: states.iter().filter(|s| s.fips.is_some()).count(),
        counties: counties.len(),
        unknown_priority_metros: priority_metros.dropped.len(),
        unknown_priority_states: priority_states.dropped.len(),
        malformed_keys,
        ..JoinCounts::default()
    };

    Ok(JoinOutput {
        metros,
        states,
        counties,
        comparisons,
        counts,
        warnings,
    })
}
