use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::SourceArgs;

/// The seven independently maintained regional-statistics databases.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SourceKind {
    Cost,
    Rent,
    Crime,
    Wage,
    Schools,
    Childcare,
    Enviro,
}

impl SourceKind {
    pub const ALL: [Self; 7] = [
        Self::Cost,
        Self::Rent,
        Self::Crime,
        Self::Wage,
        Self::Schools,
        Self::Childcare,
        Self::Enviro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Rent => "rent",
            Self::Crime => "crime",
            Self::Wage => "wage",
            Self::Schools => "schools",
            Self::Childcare => "childcare",
            Self::Enviro => "enviro",
        }
    }

    fn default_filename(self) -> &'static str {
        match self {
            Self::Cost => "plaincost.db",
            Self::Rent => "plainrent.db",
            Self::Crime => "plaincrime.db",
            Self::Wage => "wagedex.db",
            Self::Schools => "plainschools.db",
            Self::Childcare => "plainchildcare.db",
            Self::Enviro => "plainenviro.db",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcesConfig {
    pub cost: PathBuf,
    pub rent: PathBuf,
    pub crime: PathBuf,
    pub wage: PathBuf,
    pub schools: PathBuf,
    pub childcare: PathBuf,
    pub enviro: PathBuf,
}

impl SourcesConfig {
    pub fn under(sources_dir: &Path) -> Self {
        let path = |kind: SourceKind| sources_dir.join(kind.default_filename());
        Self {
            cost: path(SourceKind::Cost),
            rent: path(SourceKind::Rent),
            crime: path(SourceKind::Crime),
            wage: path(SourceKind::Wage),
            schools: path(SourceKind::Schools),
            childcare: path(SourceKind::Childcare),
            enviro: path(SourceKind::Enviro),
        }
    }

    pub fn path(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Cost => &self.cost,
            SourceKind::Rent => &self.rent,
            SourceKind::Crime => &self.crime,
            SourceKind::Wage => &self.wage,
            SourceKind::Schools => &self.schools,
            SourceKind::Childcare => &self.childcare,
            SourceKind::Enviro => &self.enviro,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (SourceKind, &Path)> {
        SourceKind::ALL.into_iter().map(|kind| (kind, self.path(kind)))
    }

    /// Relative paths in a config file are resolved against the file's directory.
    fn rebase(mut self, base: &Path) -> Self {
        for path in [
            &mut self.cost,
            &mut self.rent,
            &mut self.crime,
            &mut self.wage,
            &mut self.schools,
            &mut self.childcare,
            &mut self.enviro,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

pub fn load_sources_config(args: &SourceArgs) -> Result<SourcesConfig> {
    let Some(config_path) = args.sources_config.as_ref() else {
        return Ok(SourcesConfig::under(&args.data_root.join("sources")));
    };

    let raw = fs::read(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config: SourcesConfig = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;

    info!(path = %config_path.display(), "loaded sources config");

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.rebase(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_places_every_source_under_sources_dir() {
        let config = SourcesConfig::under(Path::new("/data/sources"));
        assert_eq!(config.wage, PathBuf::from("/data/sources/wagedex.db"));
        assert_eq!(config.entries().count(), 7);
        assert!(
            config
                .entries()
                .all(|(_, path)| path.starts_with("/data/sources"))
        );
    }

    #[test]
    fn config_file_paths_are_rebased_when_relative() {
        let dir = std::env::temp_dir().join(format!("plaincompare-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("sources.json");
        let body = serde_json::json!({
            "cost": "cost.db",
            "rent": "/abs/rent.db",
            "crime": "crime.db",
            "wage": "wage.db",
            "schools": "schools.db",
            "childcare": "childcare.db",
            "enviro": "enviro.db"
        });
        fs::write(&config_path, body.to_string()).unwrap();

        let args = SourceArgs {
            data_root: PathBuf::from(".cache/plaincompare"),
            sources_config: Some(config_path),
        };
        let config = load_sources_config(&args).unwrap();

        assert_eq!(config.cost, dir.join("cost.db"));
        assert_eq!(config.rent, PathBuf::from("/abs/rent.db"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
