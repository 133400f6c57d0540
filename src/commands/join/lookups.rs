use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::entity::State;

/// Fixed CBSA to wage-area translation: two leading zeros in front of the
/// five-digit CBSA code.
pub(super) fn wagedex_area_code(cbsa: &str) -> String {
    format!("00{cbsa}")
}

/// Key-translation tables built once per run; read-only afterwards.
#[derive(Debug, Default)]
pub(super) struct JoinLookups {
    wage_metro_areas: HashSet<String>,
    crime_fips_by_abbr: HashMap<String, String>,
    state_names_by_abbr: HashMap<String, String>,
}

impl JoinLookups {
    pub(super) fn build(wage: &Connection, crime: &Connection, states: &[State]) -> Result<Self> {
        let wage_metro_areas = load_wage_metro_areas(wage)?;
        let crime_fips_by_abbr = load_crime_fips(crime)?;
        let state_names_by_abbr = states
            .iter()
            .map(|state| (state.abbr.clone(), state.name.clone()))
            .collect();

        Ok(Self {
            wage_metro_areas,
            crime_fips_by_abbr,
            state_names_by_abbr,
        })
    }

    pub(super) fn wagedex_area_for(&self, cbsa: &str) -> Option<String> {
        let area_code = wagedex_area_code(cbsa);
        self.wage_metro_areas
            .contains(&area_code)
            .then_some(area_code)
    }

    pub(super) fn fips_for(&self, abbr: &str) -> Option<String> {
        self.crime_fips_by_abbr.get(abbr).cloned()
    }

    pub(super) fn state_name_for(&self, abbr: &str) -> Option<&str> {
        self.state_names_by_abbr.get(abbr).map(String::as_str)
    }

    pub(super) fn wage_metro_area_count(&self) -> usize {
        self.wage_metro_areas.len()
    }
}

fn load_wage_metro_areas(wage: &Connection) -> Result<HashSet<String>> {
    let mut statement = wage
        .prepare("SELECT CAST(area_code AS TEXT) FROM areas WHERE area_type = 'metro'")
        .context("failed to read wage areas")?;
    let rows = statement.query_map([], |row| row.get::<_, Option<String>>(0))?;

    let mut out = HashSet::new();
    for row in rows {
        if let Some(code) = row? {
            out.insert(code);
        }
    }
    Ok(out)
}

fn load_crime_fips(crime: &Connection) -> Result<HashMap<String, String>> {
    let mut statement = crime
        .prepare("SELECT state_abbr, CAST(state_fips AS TEXT) FROM states")
        .context("failed to read crime states")?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
        ))
    })?;

    let mut out = HashMap::new();
    for row in rows {
        if let (Some(abbr), Some(fips)) = row? {
            out.insert(abbr, fips);
        }
    }
    Ok(out)
}
