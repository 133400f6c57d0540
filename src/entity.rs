use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Metro,
    State,
    County,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metro => "metro",
            Self::State => "state",
            Self::County => "county",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metro {
    pub slug: String,
    pub name: String,
    pub cbsa: String,
    pub state_abbr: Option<String>,
    pub population: Option<i64>,
    pub wagedex_area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub slug: String,
    pub abbr: String,
    pub name: String,
    pub fips: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct County {
    pub slug: String,
    pub name: String,
    pub state_abbr: String,
    pub state_name: String,
    pub fips: String,
    pub population: Option<i64>,
}

/// Common view over joined entities for ordering and identity checks.
pub trait Named {
    fn slug(&self) -> &str;
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn slug(&self) -> &str {
                &self.slug
            }

            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(Metro, State, County);

/// Case-insensitive (ASCII) name order with slug as tie-break.
pub fn sort_by_name<T: Named>(entities: &mut [T]) {
    entities.sort_by(|a, b| {
        a.name()
            .to_ascii_lowercase()
            .cmp(&b.name().to_ascii_lowercase())
            .then_with(|| a.slug().cmp(b.slug()))
    });
}

/// An unordered pair of same-level slugs, stored smaller slug first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopularComparison {
    pub slug_a: String,
    pub slug_b: String,
    pub level: EntityKind,
}

impl PopularComparison {
    pub fn new(first: &str, second: &str, level: EntityKind) -> Result<Self> {
        let (slug_a, slug_b) = match first.cmp(second) {
            std::cmp::Ordering::Less => (first, second),
            std::cmp::Ordering::Greater => (second, first),
            std::cmp::Ordering::Equal => bail!("cannot compare {first} with itself"),
        };

        Ok(Self {
            slug_a: slug_a.to_string(),
            slug_b: slug_b.to_string(),
            level,
        })
    }
}
