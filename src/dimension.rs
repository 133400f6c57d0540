use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// One of the seven life-score dimensions, in fixed storage order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Cost,
    Wages,
    Rent,
    Crime,
    Schools,
    Childcare,
    Enviro,
}

impl Dimension {
    pub const ALL: [Self; 7] = [
        Self::Cost,
        Self::Wages,
        Self::Rent,
        Self::Crime,
        Self::Schools,
        Self::Childcare,
        Self::Enviro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Wages => "wages",
            Self::Rent => "rent",
            Self::Crime => "crime",
            Self::Schools => "schools",
            Self::Childcare => "childcare",
            Self::Enviro => "enviro",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cost => "Cost of Living",
            Self::Wages => "Wages",
            Self::Rent => "Rent",
            Self::Crime => "Safety",
            Self::Schools => "Schools",
            Self::Childcare => "Childcare",
            Self::Enviro => "Environment",
        }
    }

    /// Composite weight in hundredths; the seven weights sum to 100.
    pub fn weight_hundredths(self) -> u32 {
        match self {
            Self::Cost | Self::Wages => 20,
            Self::Rent | Self::Crime => 15,
            Self::Schools | Self::Childcare | Self::Enviro => 10,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::Cost | Self::Rent | Self::Crime | Self::Childcare => Direction::LowerIsBetter,
            Self::Wages | Self::Schools | Self::Enviro => Direction::HigherIsBetter,
        }
    }

    pub fn score_column(self) -> &'static str {
        match self {
            Self::Cost => "cost_score",
            Self::Wages => "wages_score",
            Self::Rent => "rent_score",
            Self::Crime => "crime_score",
            Self::Schools => "schools_score",
            Self::Childcare => "childcare_score",
            Self::Enviro => "enviro_score",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-dimension slots where `None` means no observation, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionMap<T> {
    slots: [Option<T>; 7],
}

impl<T> Default for DimensionMap<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None, None, None, None],
        }
    }
}

impl<T> DimensionMap<T> {
    pub fn get(&self, dimension: Dimension) -> Option<&T> {
        self.slots[dimension.index()].as_ref()
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<T>) {
        self.slots[dimension.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, Option<&T>)> {
        Dimension::ALL
            .into_iter()
            .map(|dimension| (dimension, self.get(dimension)))
    }

    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl DimensionMap<f64> {
    pub fn value(&self, dimension: Dimension) -> Option<f64> {
        self.get(dimension).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_hundred() {
        let total: u32 = Dimension::ALL.iter().map(|d| d.weight_hundredths()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn directionality_matches_dimension_semantics() {
        let lower: Vec<_> = Dimension::ALL
            .into_iter()
            .filter(|d| d.direction() == Direction::LowerIsBetter)
            .map(Dimension::as_str)
            .collect();
        assert_eq!(lower, vec!["cost", "rent", "crime", "childcare"]);
    }

    #[test]
    fn dimension_map_distinguishes_absent_from_zero() {
        let mut map = DimensionMap::default();
        map.set(Dimension::Rent, Some(0.0));

        assert_eq!(map.value(Dimension::Rent), Some(0.0));
        assert_eq!(map.value(Dimension::Cost), None);
        assert_eq!(map.present_count(), 1);
    }
}
