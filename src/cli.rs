use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "plaincompare",
    version,
    about = "Regional comparison join and life-score pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify and fingerprint the seven source databases.
    Inventory(InventoryArgs),
    /// Build the unified entity tables and the popular-comparisons index.
    Join(JoinArgs),
    /// Compute per-dimension scores, composites and grades.
    Score(ScoreArgs),
    /// Export the compare database as SQL seed files.
    Export(ExportArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(long, default_value = ".cache/plaincompare")]
    pub data_root: PathBuf,

    /// JSON file mapping each source to its SQLite path.
    #[arg(long)]
    pub sources_config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct JoinArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub join_manifest_path: Option<PathBuf>,

    /// Number of most populous counties paired in the comparisons index.
    #[arg(long, default_value_t = 30)]
    pub top_counties: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub score_manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = ".cache/plaincompare")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub seed_dir: Option<PathBuf>,

    /// Rows per INSERT statement.
    #[arg(long, default_value_t = 500)]
    pub batch_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
