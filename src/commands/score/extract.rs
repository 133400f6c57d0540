use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::dimension::{Dimension, DimensionMap};
use crate::entity::{Metro, State};
use crate::sources::SourceSet;

// Raw metric per dimension. Keys are CBSA codes or wage-area codes for
// metros and state abbreviations (or state wage-area codes) for states.
//
//   cost       regional price parity, all items
//   rent       two-bedroom fair-market rent, latest year
//   wages      mean occupational median salary, areas with employment only
//   crime      violent crimes per 100k residents, latest year
//   schools    teachers per 100 students
//   childcare  annual center-based infant care price
//   enviro     share of water systems without a violation

const METRO_COST_SQL: &str = "SELECT CAST(cbsa AS TEXT), rpp_all FROM msas";

const METRO_RENT_SQL: &str = "
    SELECT CAST(f.cbsa_code AS TEXT), f.br2
    FROM fmr_metro f
    WHERE f.year = (SELECT MAX(f2.year) FROM fmr_metro f2 WHERE f2.cbsa_code = f.cbsa_code)
    ORDER BY f.cbsa_code, f.br2
";

const METRO_WAGES_SQL: &str = "
    SELECT CAST(area_code AS TEXT), CAST(AVG(a_median) AS INTEGER)
    FROM metro_wages
    WHERE a_median IS NOT NULL AND a_median > 0
    GROUP BY area_code
    HAVING SUM(tot_emp) > 0
";

const STATE_COST_SQL: &str = "SELECT abbr, rpp_all FROM states";

const STATE_RENT_SQL: &str = "
    SELECT s.state_abbr, CAST(AVG(fc.br2) AS INTEGER)
    FROM fmr_county fc
    JOIN counties c ON fc.fips = c.fips
    JOIN states s ON c.state_code = s.state_code
    WHERE fc.year = (SELECT MAX(year) FROM fmr_county)
    GROUP BY s.state_abbr
";

const STATE_CRIME_SQL: &str = "
    SELECT s.state_abbr, CAST(sc.violent_crime AS REAL) * 100000.0 / sc.population
    FROM state_crime sc
    JOIN states s ON sc.state_fips = s.state_fips
    WHERE sc.population > 0
      AND sc.year = (SELECT MAX(sc2.year) FROM state_crime sc2 WHERE sc2.state_fips = sc.state_fips)
    ORDER BY s.state_abbr
";

const STATE_WAGE_AREAS_SQL: &str = "
    SELECT CAST(area_code AS TEXT), slug, state_slug
    FROM areas
    WHERE area_type = 'state'
";

const STATE_WAGES_SQL: &str = "
    SELECT CAST(area_code AS TEXT), CAST(AVG(a_median) AS INTEGER)
    FROM state_wages
    WHERE a_median IS NOT NULL AND a_median > 0
    GROUP BY area_code
    HAVING SUM(tot_emp) > 0
";

const STATE_SCHOOLS_SQL: &str = "
    SELECT s.state_abbr, 100.0 / ROUND(AVG(sc.student_teacher_ratio), 1)
    FROM schools sc
    JOIN states s ON sc.state_fips = s.state_fips
    GROUP BY s.state_abbr
    HAVING AVG(sc.student_teacher_ratio) > 0
";

const STATE_CHILDCARE_SQL: &str = "SELECT abbr, avg_center_infant FROM states";

const STATE_ENVIRO_SQL: &str = "
    SELECT state_abbr,
           100.0 * num_water_systems / (num_water_systems + num_violations)
    FROM states
    WHERE num_water_systems + num_violations > 0
";

/// All raw-metric tables, loaded once per run and read-only afterwards.
pub(super) struct MetricTables {
    metro_cost: HashMap<String, f64>,
    metro_rent: HashMap<String, f64>,
    metro_wages: HashMap<String, f64>,
    state_cost: HashMap<String, f64>,
    state_rent: HashMap<String, f64>,
    state_crime: HashMap<String, f64>,
    state_wage_areas: StateWageAreas,
    state_wages: HashMap<String, f64>,
    state_schools: HashMap<String, f64>,
    state_childcare: HashMap<String, f64>,
    state_enviro: HashMap<String, f64>,
}

impl MetricTables {
    pub(super) fn load(sources: &SourceSet) -> Result<Self> {
        let tables = Self {
            metro_cost: load_metric(&sources.cost, METRO_COST_SQL, "metro cost")?,
            metro_rent: load_metric(&sources.rent, METRO_RENT_SQL, "metro rent")?,
            metro_wages: load_metric(&sources.wage, METRO_WAGES_SQL, "metro wages")?,
            state_cost: load_metric(&sources.cost, STATE_COST_SQL, "state cost")?,
            state_rent: load_metric(&sources.rent, STATE_RENT_SQL, "state rent")?,
            state_crime: load_metric(&sources.crime, STATE_CRIME_SQL, "state crime")?,
            state_wage_areas: StateWageAreas::load(&sources.wage)?,
            state_wages: load_metric(&sources.wage, STATE_WAGES_SQL, "state wages")?,
            state_schools: load_metric(&sources.schools, STATE_SCHOOLS_SQL, "state schools")?,
            state_childcare: load_metric(
                &sources.childcare,
                STATE_CHILDCARE_SQL,
                "state childcare",
            )?,
            state_enviro: load_metric(&sources.enviro, STATE_ENVIRO_SQL, "state enviro")?,
        };

        info!(
            metro_cost = tables.metro_cost.len(),
            metro_rent = tables.metro_rent.len(),
            metro_wages = tables.metro_wages.len(),
            state_cost = tables.state_cost.len(),
            state_crime = tables.state_crime.len(),
            state_wages = tables.state_wages.len(),
            "loaded raw metric tables"
        );

        Ok(tables)
    }

    /// Metros carry cost, rent and wages only.
    pub(super) fn metro_metrics(&self, metro: &Metro) -> DimensionMap<f64> {
        let mut raw = DimensionMap::default();
        raw.set(Dimension::Cost, self.metro_cost.get(&metro.cbsa).copied());
        raw.set(Dimension::Rent, self.metro_rent.get(&metro.cbsa).copied());
        raw.set(
            Dimension::Wages,
            metro
                .wagedex_area
                .as_ref()
                .and_then(|area| self.metro_wages.get(area))
                .copied(),
        );
        raw
    }

    pub(super) fn state_metrics(&self, state: &State) -> DimensionMap<f64> {
        let abbr = state.abbr.as_str();
        let mut raw = DimensionMap::default();
        raw.set(Dimension::Cost, self.state_cost.get(abbr).copied());
        raw.set(Dimension::Rent, self.state_rent.get(abbr).copied());
        raw.set(Dimension::Crime, self.state_crime.get(abbr).copied());
        raw.set(
            Dimension::Wages,
            self.state_wage_areas
                .area_for(state)
                .and_then(|area| self.state_wages.get(area))
                .copied(),
        );
        raw.set(Dimension::Schools, self.state_schools.get(abbr).copied());
        raw.set(Dimension::Childcare, self.state_childcare.get(abbr).copied());
        raw.set(Dimension::Enviro, self.state_enviro.get(abbr).copied());
        raw
    }
}

/// State wage-area resolution. Unlike metros, which translate the CBSA
/// code, states are matched by slug: the state's own slug first, then the
/// lowercased abbreviation against `slug` and `state_slug`.
#[derive(Debug, Default)]
pub(super) struct StateWageAreas {
    by_slug: HashMap<String, String>,
    by_state_slug: HashMap<String, String>,
}

impl StateWageAreas {
    fn load(wage: &Connection) -> Result<Self> {
        let mut statement = wage
            .prepare(STATE_WAGE_AREAS_SQL)
            .context("failed to read state wage areas")?;
        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut areas = Self::default();
        for row in rows {
            let (Some(area_code), slug, state_slug) = row? else {
                continue;
            };
            if let Some(slug) = slug {
                areas.by_slug.entry(slug).or_insert_with(|| area_code.clone());
            }
            if let Some(state_slug) = state_slug {
                areas.by_state_slug.entry(state_slug).or_insert(area_code);
            }
        }
        Ok(areas)
    }

    pub(super) fn area_for(&self, state: &State) -> Option<&str> {
        let abbr = state.abbr.to_ascii_lowercase();
        self.by_slug
            .get(&state.slug)
            .or_else(|| self.by_slug.get(&abbr))
            .or_else(|| self.by_state_slug.get(&abbr))
            .map(String::as_str)
    }
}

/// Runs a two-column `(key, value)` query. Rows with a NULL key, NULL value
/// or non-finite value are absent from the result; the first row wins for
/// a repeated key.
fn load_metric(connection: &Connection, sql: &str, label: &str) -> Result<HashMap<String, f64>> {
    let mut statement = connection
        .prepare(sql)
        .with_context(|| format!("failed to prepare {label} query"))?;
    let rows = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<f64>>(1)?,
            ))
        })
        .with_context(|| format!("failed to run {label} query"))?;

    let mut out = HashMap::new();
    for row in rows {
        let (key, value) = row.with_context(|| format!("failed to read {label} row"))?;
        if let (Some(key), Some(value)) = (key, value.filter(|value| value.is_finite())) {
            out.entry(key).or_insert(value);
        }
    }
    Ok(out)
}
