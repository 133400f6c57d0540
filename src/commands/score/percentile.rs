#[derive(Debug, Clone, Copy)]
pub(super) struct Observation<'a> {
    pub(super) slug: &'a str,
    pub(super) value: Option<f64>,
}

/// Percentile rank (0-100) of every present observation, aligned with the
/// input. Absent or non-finite values are left out of the population and
/// come back as `None`.
///
/// Ranks are positional: values are sorted ascending and the k-th of m
/// gets `k / (m - 1) * 100`. Equal values still receive distinct ranks,
/// ordered by slug. A population of one ranks at 100.
pub(super) fn percentile_ranks(observations: &[Observation<'_>]) -> Vec<Option<f64>> {
    let mut present: Vec<(usize, f64, &str)> = observations
        .iter()
        .enumerate()
        .filter_map(|(index, observation)| {
            observation
                .value
                .filter(|value| value.is_finite())
                .map(|value| (index, value, observation.slug))
        })
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.2.cmp(b.2)));

    let mut ranks = vec![None; observations.len()];
    let population = present.len();
    for (rank, (index, _, _)) in present.into_iter().enumerate() {
        ranks[index] = Some(if population <= 1 {
            100.0
        } else {
            rank as f64 * 100.0 / (population - 1) as f64
        });
    }

    ranks
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn observations<'a>(values: &[(&'a str, Option<f64>)]) -> Vec<Observation<'a>> {
        values
            .iter()
            .map(|&(slug, value)| Observation { slug, value })
            .collect()
    }

    #[test]
    fn min_maps_to_zero_and_max_to_hundred() {
        let input = observations(&[("b", Some(100.0)), ("a", Some(80.0)), ("c", Some(120.0))]);
        let ranks = percentile_ranks(&input);

        assert_eq!(ranks, vec![Some(50.0), Some(0.0), Some(100.0)]);
    }

    #[test]
    fn missing_values_are_excluded_from_population() {
        let input = observations(&[
            ("a", Some(3.0)),
            ("b", None),
            ("c", Some(1.0)),
            ("d", Some(f64::NAN)),
        ]);
        let ranks = percentile_ranks(&input);

        assert_eq!(ranks, vec![Some(100.0), None, Some(0.0), None]);
    }

    #[test]
    fn ranks_are_strictly_monotonic_in_raw_value() {
        let input = observations(&[
            ("a", Some(7.0)),
            ("b", Some(-2.0)),
            ("c", Some(3.5)),
            ("d", Some(12.0)),
            ("e", Some(0.0)),
        ]);
        let ranks = percentile_ranks(&input);

        let mut pairs: Vec<(f64, f64)> = input
            .iter()
            .zip(&ranks)
            .map(|(observation, rank)| (observation.value.unwrap(), rank.unwrap()))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        for window in pairs.windows(2) {
            assert!(window[0].1 < window[1].1);
        }
        assert!(ranks.iter().flatten().all(|rank| (0.0..=100.0).contains(rank)));
        assert_relative_eq!(ranks[2].unwrap(), 50.0);
    }

    #[test]
    fn ties_get_distinct_ranks_ordered_by_slug() {
        let input = observations(&[("zeta", Some(5.0)), ("alpha", Some(5.0)), ("mid", Some(1.0))]);
        let ranks = percentile_ranks(&input);

        assert_eq!(ranks, vec![Some(100.0), Some(50.0), Some(0.0)]);
    }

    #[test]
    fn single_value_ranks_at_hundred_and_empty_is_empty() {
        let single = observations(&[("only", Some(42.0)), ("gone", None)]);
        assert_eq!(percentile_ranks(&single), vec![Some(100.0), None]);

        let none = observations(&[("gone", None)]);
        assert_eq!(percentile_ranks(&none), vec![None]);
        assert!(percentile_ranks(&[]).is_empty());
    }

    #[test]
    fn whole_percent_ranks_are_exact() {
        let input: Vec<Observation<'_>> = (0..=100)
            .map(|k| Observation {
                slug: "x",
                value: Some(f64::from(k)),
            })
            .collect();
        let ranks = percentile_ranks(&input);

        for (k, rank) in ranks.iter().enumerate() {
            assert_eq!(*rank, Some(k as f64));
        }
    }
}
