use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::entity::{County, EntityKind, Metro, PopularComparison, State};
use crate::store::recreate_entity_tables;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct InsertedComparisons {
    pub(super) metro: usize,
    pub(super) state: usize,
    pub(super) county: usize,
}

/// Replaces every join table in one transaction. Nothing is visible to
/// readers until the commit; an error drops the transaction and rolls back.
pub(super) fn write_join_output(
    connection: &mut Connection,
    metros: &[Metro],
    states: &[State],
    counties: &[County],
    comparisons: &[PopularComparison],
) -> Result<InsertedComparisons> {
    let tx = connection.transaction()?;
    recreate_entity_tables(&tx)?;

    let mut inserted = InsertedComparisons::default();
    {
        let mut metro_statement = tx.prepare(
            "
            INSERT INTO metros(slug, name, cbsa, state_abbr, population, wagedex_area)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )?;
        for metro in metros {
            metro_statement
                .execute(params![
                    metro.slug,
                    metro.name,
                    metro.cbsa,
                    metro.state_abbr,
                    metro.population,
                    metro.wagedex_area,
                ])
                .with_context(|| format!("failed to insert metro {}", metro.slug))?;
        }

        let mut state_statement =
            tx.prepare("INSERT INTO states(slug, abbr, name, fips) VALUES(?1, ?2, ?3, ?4)")?;
        for state in states {
            state_statement
                .execute(params![state.slug, state.abbr, state.name, state.fips])
                .with_context(|| format!("failed to insert state {}", state.slug))?;
        }

        let mut county_statement = tx.prepare(
            "
            INSERT INTO counties(slug, name, state_abbr, state_name, fips, population)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )?;
        for county in counties {
            county_statement
                .execute(params![
                    county.slug,
                    county.name,
                    county.state_abbr,
                    county.state_name,
                    county.fips,
                    county.population,
                ])
                .with_context(|| format!("failed to insert county {}", county.slug))?;
        }

        let mut comparison_statement = tx.prepare(
            "INSERT OR IGNORE INTO popular_comparisons(slug_a, slug_b, level) VALUES(?1, ?2, ?3)",
        )?;
        for comparison in comparisons {
            let changed = comparison_statement.execute(params![
                comparison.slug_a,
                comparison.slug_b,
                comparison.level.as_str(),
            ])?;
            match comparison.level {
                EntityKind::Metro => inserted.metro += changed,
                EntityKind::State => inserted.state += changed,
                EntityKind::County => inserted.county += changed,
            }
        }
    }

    tx.commit().context("failed to commit join output")?;
    Ok(inserted)
}
