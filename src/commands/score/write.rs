use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, ToSql};

use super::engine::ScoredEntity;
use crate::dimension::Dimension;
use crate::store::recreate_life_scores_table;

fn insert_sql() -> String {
    let score_columns: Vec<&str> = Dimension::ALL
        .iter()
        .map(|dimension| dimension.score_column())
        .collect();
    let placeholders: Vec<String> = (1..=score_columns.len() + 5)
        .map(|index| format!("?{index}"))
        .collect();

    format!(
        "INSERT INTO life_scores(slug, type, name, {}, composite_score, grade) VALUES({})",
        score_columns.join(", "),
        placeholders.join(", ")
    )
}

/// `life_scores` is keyed by slug alone, so slugs must be unique across
/// entity types.
fn ensure_unique_slugs(scored: &[ScoredEntity]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(scored.len());
    for entity in scored {
        if let Some(previous) = seen.insert(&entity.slug, entity.kind.as_str()) {
            bail!(
                "slug {} appears as both {previous} and {}",
                entity.slug,
                entity.kind.as_str()
            );
        }
    }
    Ok(())
}

/// Replaces the whole score table in one transaction; readers keep seeing
/// the previous table until the commit.
pub(super) fn write_scores(connection: &mut Connection, scored: &[ScoredEntity]) -> Result<usize> {
    ensure_unique_slugs(scored)?;

    let tx = connection.transaction()?;
    recreate_life_scores_table(&tx)?;

    {
        let mut statement = tx.prepare(&insert_sql())?;
        for entity in scored {
            let scores: Vec<Option<f64>> = Dimension::ALL
                .iter()
                .map(|dimension| entity.scores.value(*dimension))
                .collect();
            let kind = entity.kind.as_str();
            let grade = entity.grade.as_str();

            let mut values: Vec<&dyn ToSql> = vec![
                &entity.slug as &dyn ToSql,
                &kind as &dyn ToSql,
                &entity.name as &dyn ToSql,
            ];
            values.extend(scores.iter().map(|score| score as &dyn ToSql));
            values.push(&entity.composite_score);
            values.push(&grade);

            statement
                .execute(values.as_slice())
                .with_context(|| format!("failed to insert life score for {}", entity.slug))?;
        }
    }

    tx.commit().context("failed to commit life scores")?;
    Ok(scored.len())
}
