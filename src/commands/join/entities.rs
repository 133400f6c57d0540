use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use tracing::warn;

use super::lookups::JoinLookups;
use crate::entity::{County, EntityKind, Metro, Named, State, sort_by_name};

/// Format checks for identity and join keys. A mismatch is reported, not
/// fatal: the canonical source stays authoritative for identity.
pub(super) struct KeyChecks {
    slug: Regex,
    cbsa: Regex,
    fips: Regex,
}

impl KeyChecks {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            slug: Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").context("failed to compile slug regex")?,
            cbsa: Regex::new(r"^\d{5}$").context("failed to compile CBSA regex")?,
            fips: Regex::new(r"^\d{2}(?:\d{3})?$").context("failed to compile FIPS regex")?,
        })
    }

    fn check(
        &self,
        warnings: &mut Vec<String>,
        kind: EntityKind,
        slug: &str,
        key: Option<JoinKey<'_>>,
    ) {
        if !self.slug.is_match(slug) {
            warnings.push(format!("{} slug is not URL-safe: {slug:?}", kind.as_str()));
        }

        let Some(key) = key else {
            return;
        };
        let (key_name, value, pattern) = match key {
            JoinKey::Cbsa(value) => ("cbsa", value, &self.cbsa),
            JoinKey::Fips(value) => ("fips", value, &self.fips),
        };
        if !pattern.is_match(value) {
            warnings.push(format!(
                "{} {slug} has malformed {key_name}: {value:?}",
                kind.as_str()
            ));
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum JoinKey<'a> {
    Cbsa(&'a str),
    Fips(&'a str),
}

pub(super) fn load_canonical_states(cost: &Connection) -> Result<Vec<State>> {
    let mut statement = cost
        .prepare("SELECT abbr, name, slug FROM states")
        .context("failed to read cost states")?;
    let rows = statement.query_map([], |row| {
        Ok(State {
            abbr: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            fips: None,
        })
    })?;

    let mut states = Vec::new();
    for row in rows {
        states.push(row?);
    }
    sort_by_name(&mut states);
    ensure_unique_slugs(EntityKind::State, &states)?;
    Ok(states)
}

pub(super) fn enrich_states(
    states: Vec<State>,
    lookups: &JoinLookups,
    checks: &KeyChecks,
    warnings: &mut Vec<String>,
) -> Vec<State> {
    states
        .into_iter()
        .map(|state| {
            let fips = lookups.fips_for(&state.abbr);
            checks.check(
                warnings,
                EntityKind::State,
                &state.slug,
                fips.as_deref().map(JoinKey::Fips),
            );
            State { fips, ..state }
        })
        .collect()
}

pub(super) fn load_metros(
    cost: &Connection,
    lookups: &JoinLookups,
    checks: &KeyChecks,
    warnings: &mut Vec<String>,
) -> Result<Vec<Metro>> {
    let mut statement = cost
        .prepare("SELECT CAST(cbsa AS TEXT), name, slug, state_abbr FROM msas")
        .context("failed to read cost metros")?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut metros = Vec::new();
    for row in rows {
        let (cbsa, name, slug, state_abbr) = row?;
        checks.check(warnings, EntityKind::Metro, &slug, Some(JoinKey::Cbsa(&cbsa)));

        metros.push(Metro {
            wagedex_area: lookups.wagedex_area_for(&cbsa),
            slug,
            name,
            cbsa,
            state_abbr,
            population: None,
        });
    }

    sort_by_name(&mut metros);
    ensure_unique_slugs(EntityKind::Metro, &metros)?;
    Ok(metros)
}

pub(super) fn load_counties(
    childcare: &Connection,
    lookups: &JoinLookups,
    checks: &KeyChecks,
    warnings: &mut Vec<String>,
) -> Result<Vec<County>> {
    let mut statement = childcare
        .prepare(
            "SELECT CAST(fips AS TEXT), name, state, slug, NULLIF(population, 0) FROM counties",
        )
        .context("failed to read childcare counties")?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<i64>>(4)?,
        ))
    })?;

    let mut counties = Vec::new();
    let mut unnamed_states = 0_usize;
    for row in rows {
        let (fips, name, state_abbr, slug, population) = row?;
        checks.check(warnings, EntityKind::County, &slug, Some(JoinKey::Fips(&fips)));

        let state_name = match lookups.state_name_for(&state_abbr) {
            Some(state_name) => state_name.to_string(),
            None => {
                unnamed_states += 1;
                state_abbr.clone()
            }
        };

        counties.push(County {
            slug,
            name,
            state_abbr,
            state_name,
            fips,
            population,
        });
    }

    if unnamed_states > 0 {
        warn!(
            count = unnamed_states,
            "counties whose state is unknown to the cost source; using abbreviation as state name"
        );
    }

    sort_by_name(&mut counties);
    ensure_unique_slugs(EntityKind::County, &counties)?;
    Ok(counties)
}

pub(super) fn ensure_unique_slugs<T: Named>(kind: EntityKind, entities: &[T]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entities.len());
    let mut duplicates: Vec<&str> = entities
        .iter()
        .map(Named::slug)
        .filter(|slug| !seen.insert(*slug))
        .collect();

    if duplicates.is_empty() {
        return Ok(());
    }

    duplicates.sort_unstable();
    duplicates.dedup();
    bail!(
        "canonical {} source has duplicate slugs: {}",
        kind.as_str(),
        duplicates.join(", ")
    );
}
