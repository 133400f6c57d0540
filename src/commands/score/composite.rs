use crate::dimension::{Dimension, DimensionMap, Direction};
use crate::util::round_tenths;

/// Composite assigned when an entity has no dimension data at all.
pub(super) const NO_DATA_COMPOSITE: f64 = 50.0;

/// Turns a percentile into a score where higher is always better.
pub(super) fn dimension_score(dimension: Dimension, percentile: f64) -> f64 {
    match dimension.direction() {
        Direction::LowerIsBetter => 100.0 - percentile,
        Direction::HigherIsBetter => percentile,
    }
}

/// Weighted mean of the present scores, renormalized by the weights of the
/// dimensions that are present, rounded to one decimal. Weights stay integer
/// hundredths so the only inexact step is the final division.
pub(super) fn composite_score(scores: &DimensionMap<f64>) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum: u32 = 0;
    for (dimension, score) in scores.iter() {
        if let Some(score) = score {
            weighted_sum += score * f64::from(dimension.weight_hundredths());
            weight_sum += dimension.weight_hundredths();
        }
    }

    if weight_sum == 0 {
        return NO_DATA_COMPOSITE;
    }

    round_tenths(weighted_sum / f64::from(weight_sum))
}
