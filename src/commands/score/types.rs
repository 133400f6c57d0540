use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::engine::ScoredEntity;
use crate::dimension::Dimension;
use crate::entity::EntityKind;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ScoreRunManifest {
    pub(crate) manifest_version: u32,
    pub(crate) run_id: String,
    pub(crate) db_schema_version: String,
    pub(crate) status: String,
    pub(crate) started_at: String,
    pub(crate) updated_at: String,
    pub(crate) db_path: String,
    pub(crate) rows_written: usize,
    pub(crate) populations: Vec<PopulationSummary>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct PopulationSummary {
    pub(crate) entity_type: EntityKind,
    pub(crate) entities: usize,
    pub(crate) no_data_entities: usize,
    pub(crate) dimension_coverage: BTreeMap<Dimension, usize>,
    pub(crate) grade_counts: BTreeMap<String, usize>,
    pub(crate) mean_composite: Option<f64>,
}

impl PopulationSummary {
    pub(super) fn from_scored(kind: EntityKind, scored: &[ScoredEntity]) -> Self {
        let members: Vec<&ScoredEntity> = scored.iter().filter(|entity| entity.kind == kind).collect();

        let mut dimension_coverage = BTreeMap::new();
        for dimension in Dimension::ALL {
            let covered = members
                .iter()
                .filter(|entity| entity.scores.get(dimension).is_some())
                .count();
            dimension_coverage.insert(dimension, covered);
        }

        let mut grade_counts = BTreeMap::new();
        for entity in &members {
            *grade_counts
                .entry(entity.grade.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mean_composite = (!members.is_empty()).then(|| {
            members.iter().map(|entity| entity.composite_score).sum::<f64>() / members.len() as f64
        });

        Self {
            entity_type: kind,
            entities: members.len(),
            no_data_entities: members
                .iter()
                .filter(|entity| entity.scores.present_count() == 0)
                .count(),
            dimension_coverage,
            grade_counts,
            mean_composite,
        }
    }
}
