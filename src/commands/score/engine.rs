use super::composite::{composite_score, dimension_score};
use super::grade::Grade;
use super::percentile::{Observation, percentile_ranks};
use crate::dimension::{Dimension, DimensionMap};
use crate::entity::EntityKind;

#[derive(Debug, Clone)]
pub(super) struct EntityMetrics {
    pub(super) slug: String,
    pub(super) name: String,
    pub(super) raw: DimensionMap<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ScoredEntity {
    pub(super) slug: String,
    pub(super) kind: EntityKind,
    pub(super) name: String,
    pub(super) scores: DimensionMap<f64>,
    pub(super) composite_score: f64,
    pub(super) grade: Grade,
}

/// Scores one entity type against itself. Output order follows `entities`.
pub(super) fn score_population(kind: EntityKind, entities: &[EntityMetrics]) -> Vec<ScoredEntity> {
    let mut scores: Vec<DimensionMap<f64>> = vec![DimensionMap::default(); entities.len()];

    for dimension in Dimension::ALL {
        let observations: Vec<Observation<'_>> = entities
            .iter()
            .map(|entity| Observation {
                slug: &entity.slug,
                value: entity.raw.value(dimension),
            })
            .collect();

        let ranks = percentile_ranks(&observations);
        for (entity_scores, rank) in scores.iter_mut().zip(ranks) {
            entity_scores.set(
                dimension,
                rank.map(|percentile| dimension_score(dimension, percentile)),
            );
        }
    }

    entities
        .iter()
        .zip(scores)
        .map(|(entity, scores)| {
            let composite = composite_score(&scores);
            ScoredEntity {
                slug: entity.slug.clone(),
                kind,
                name: entity.name.clone(),
                scores,
                composite_score: composite,
                grade: Grade::from_composite(composite),
            }
        })
        .collect()
}
