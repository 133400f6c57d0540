use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::config::{SourceKind, SourcesConfig};

/// Read-only handles to every source database, opened once per run and
/// passed by reference to each phase.
pub struct SourceSet {
    pub cost: Connection,
    pub rent: Connection,
    pub crime: Connection,
    pub wage: Connection,
    pub schools: Connection,
    pub childcare: Connection,
    pub enviro: Connection,
}

impl SourceSet {
    /// Fails before opening anything if any configured source is missing.
    pub fn open(config: &SourcesConfig) -> Result<Self> {
        let missing: Vec<String> = config
            .entries()
            .filter(|(_, path)| !path.is_file())
            .map(|(kind, path)| format!("{} at {}", kind.as_str(), path.display()))
            .collect();
        if !missing.is_empty() {
            bail!("missing source databases: {}", missing.join(", "));
        }

        let sources = Self {
            cost: open_source(config, SourceKind::Cost)?,
            rent: open_source(config, SourceKind::Rent)?,
            crime: open_source(config, SourceKind::Crime)?,
            wage: open_source(config, SourceKind::Wage)?,
            schools: open_source(config, SourceKind::Schools)?,
            childcare: open_source(config, SourceKind::Childcare)?,
            enviro: open_source(config, SourceKind::Enviro)?,
        };

        info!(count = SourceKind::ALL.len(), "opened source databases");
        Ok(sources)
    }
}

fn open_source(config: &SourcesConfig, kind: SourceKind) -> Result<Connection> {
    let path = config.path(kind);
    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open {} source: {}", kind.as_str(), path.display()))?;

    // Opening is lazy; touch the schema so a corrupt file fails here.
    connection
        .query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
        .with_context(|| format!("{} source is not readable: {}", kind.as_str(), path.display()))?;

    Ok(connection)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory stand-ins for the seven source databases.

    use super::*;

    pub(crate) fn empty_sources() -> SourceSet {
        let cost = Connection::open_in_memory().unwrap();
        cost.execute_batch(
            "
            CREATE TABLE msas (cbsa TEXT, name TEXT, slug TEXT, state_abbr TEXT, rpp_all REAL);
            CREATE TABLE states (abbr TEXT, name TEXT, slug TEXT, rpp_all REAL);
            ",
        )
        .unwrap();

        let rent = Connection::open_in_memory().unwrap();
        rent.execute_batch(
            "
            CREATE TABLE fmr_metro (cbsa_code TEXT, br2 REAL, year INTEGER);
            CREATE TABLE fmr_county (fips TEXT, br2 REAL, year INTEGER);
            CREATE TABLE counties (fips TEXT, state_code TEXT);
            CREATE TABLE states (state_code TEXT, state_abbr TEXT);
            ",
        )
        .unwrap();

        let crime = Connection::open_in_memory().unwrap();
        crime
            .execute_batch(
                "
                CREATE TABLE states (state_abbr TEXT, state_fips TEXT);
                CREATE TABLE state_crime (
                  state_fips TEXT, violent_crime INTEGER, population INTEGER, year INTEGER
                );
                ",
            )
            .unwrap();

        let wage = Connection::open_in_memory().unwrap();
        wage.execute_batch(
            "
            CREATE TABLE areas (
              area_code TEXT, area_title TEXT, area_type TEXT, slug TEXT, state_slug TEXT
            );
            CREATE TABLE metro_wages (area_code TEXT, occ_code TEXT, tot_emp INTEGER, a_median REAL);
            CREATE TABLE state_wages (area_code TEXT, occ_code TEXT, tot_emp INTEGER, a_median REAL);
            ",
        )
        .unwrap();

        let schools = Connection::open_in_memory().unwrap();
        schools
            .execute_batch(
                "
                CREATE TABLE states (state_abbr TEXT, state_fips TEXT);
                CREATE TABLE schools (state_fips TEXT, student_teacher_ratio REAL);
                ",
            )
            .unwrap();

        let childcare = Connection::open_in_memory().unwrap();
        childcare
            .execute_batch(
                "
                CREATE TABLE states (abbr TEXT, name TEXT, slug TEXT, avg_center_infant REAL);
                CREATE TABLE counties (
                  fips TEXT, name TEXT, state TEXT, slug TEXT, population INTEGER
                );
                ",
            )
            .unwrap();

        let enviro = Connection::open_in_memory().unwrap();
        enviro
            .execute_batch(
                "
                CREATE TABLE states (
                  state_abbr TEXT, state_name TEXT, slug TEXT,
                  num_water_systems INTEGER, num_violations INTEGER
                );
                ",
            )
            .unwrap();

        SourceSet {
            cost,
            rent,
            crime,
            wage,
            schools,
            childcare,
            enviro,
        }
    }

    pub(crate) fn exec(connection: &Connection, sql: &str) {
        connection.execute_batch(sql).unwrap();
    }
}
