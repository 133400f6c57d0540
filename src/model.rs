use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub source: String,
    pub path: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_count: usize,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JoinCounts {
    pub metros: usize,
    pub metros_with_wage_area: usize,
    pub states: usize,
    pub states_with_fips: usize,
    pub counties: usize,
    pub metro_comparisons: usize,
    pub state_comparisons: usize,
    pub county_comparisons: usize,
    pub unknown_priority_metros: usize,
    pub unknown_priority_states: usize,
    pub malformed_keys: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub db_path: String,
    pub top_counties: usize,
    pub counts: JoinCounts,
    pub warnings: Vec<String>,
}
