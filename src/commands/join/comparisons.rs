use std::collections::{BTreeSet, HashSet};

use anyhow::Result;

use crate::entity::{County, EntityKind, PopularComparison};

/// The largest metros by population, by convention.
pub(super) const PRIORITY_METROS: [&str; 35] = [
    "new-york-newark-jersey-city-ny-nj",
    "los-angeles-long-beach-anaheim-ca",
    "chicago-naperville-elgin-il-in",
    "dallas-fort-worth-arlington-tx",
    "houston-pasadena-the-woodlands-tx",
    "washington-arlington-alexandria-dc-va-md-wv",
    "miami-fort-lauderdale-west-palm-beach-fl",
    "philadelphia-camden-wilmington-pa-nj-de-md",
    "atlanta-sandy-springs-roswell-ga",
    "phoenix-mesa-chandler-az",
    "boston-cambridge-newton-ma-nh",
    "san-francisco-oakland-fremont-ca",
    "riverside-san-bernardino-ontario-ca",
    "detroit-warren-dearborn-mi",
    "seattle-tacoma-bellevue-wa",
    "minneapolis-st-paul-bloomington-mn-wi",
    "san-diego-chula-vista-carlsbad-ca",
    "tampa-st-petersburg-clearwater-fl",
    "denver-aurora-centennial-co",
    "st-louis-mo-il",
    "baltimore-columbia-towson-md",
    "orlando-kissimmee-sanford-fl",
    "charlotte-concord-gastonia-nc-sc",
    "san-antonio-new-braunfels-tx",
    "portland-vancouver-hillsboro-or-wa",
    "sacramento-roseville-folsom-ca",
    "pittsburgh-pa",
    "austin-round-rock-san-marcos-tx",
    "las-vegas-henderson-north-las-vegas-nv",
    "nashville-davidson-murfreesboro-franklin-tn",
    "raleigh-cary-nc",
    "salt-lake-city-murray-ut",
    "indianapolis-carmel-greenwood-in",
    "columbus-oh",
    "kansas-city-mo-ks",
];

pub(super) const PRIORITY_STATES: [&str; 30] = [
    "california",
    "texas",
    "florida",
    "new-york",
    "pennsylvania",
    "illinois",
    "ohio",
    "georgia",
    "north-carolina",
    "michigan",
    "new-jersey",
    "virginia",
    "washington",
    "arizona",
    "massachusetts",
    "tennessee",
    "indiana",
    "maryland",
    "missouri",
    "wisconsin",
    "colorado",
    "minnesota",
    "south-carolina",
    "alabama",
    "louisiana",
    "kentucky",
    "oregon",
    "connecticut",
    "utah",
    "nevada",
];

#[derive(Debug, PartialEq, Eq)]
pub(super) struct PriorityFilter<'a> {
    pub(super) kept: Vec<&'a str>,
    pub(super) dropped: Vec<&'a str>,
}

/// Keeps priority entries that exist after the join, preserving list order.
pub(super) fn filter_known<'a>(priority: &[&'a str], known: &HashSet<&str>) -> PriorityFilter<'a> {
    let (kept, dropped): (Vec<&str>, Vec<&str>) = priority
        .iter()
        .copied()
        .partition(|slug| known.contains(slug));
    PriorityFilter { kept, dropped }
}

/// Most populous counties first; counties without a population never rank.
pub(super) fn top_counties_by_population(counties: &[County], limit: usize) -> Vec<&str> {
    let mut ranked: Vec<(i64, &str)> = counties
        .iter()
        .filter_map(|county| county.population.map(|population| (population, county.slug.as_str())))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked.into_iter().take(limit).map(|(_, slug)| slug).collect()
}

/// Every unordered pair of `slugs`, canonicalized and deduplicated.
pub(super) fn all_pairs(slugs: &[&str], level: EntityKind) -> Result<BTreeSet<PopularComparison>> {
    let mut pairs = BTreeSet::new();
    for (i, first) in slugs.iter().enumerate() {
        for second in &slugs[i + 1..] {
            if first == second {
                continue;
            }
            pairs.insert(PopularComparison::new(first, second, level)?);
        }
    }
    Ok(pairs)
}
