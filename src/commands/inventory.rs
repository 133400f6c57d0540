use std::fs;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::config::{SourcesConfig, load_sources_config};
use crate::model::{SourceEntry, SourceInventoryManifest};
use crate::util::{manifest_dir, now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let config = load_sources_config(&args.source)?;
    let manifest = build_manifest(&config)?;

    if args.dry_run {
        for entry in &manifest.sources {
            info!(
                source = %entry.source,
                path = %entry.path,
                size_bytes = entry.size_bytes,
                "source present"
            );
        }
        info!(
            source_count = manifest.source_count,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| manifest_dir(&args.source.data_root).join("source_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(source_count = manifest.source_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(config: &SourcesConfig) -> Result<SourceInventoryManifest> {
    let missing: Vec<String> = config
        .entries()
        .filter(|(_, path)| !path.is_file())
        .map(|(kind, path)| format!("{} at {}", kind.as_str(), path.display()))
        .collect();
    if !missing.is_empty() {
        bail!("missing source databases: {}", missing.join(", "));
    }

    let mut sources = Vec::new();
    for (kind, path) in config.entries() {
        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;

        sources.push(SourceEntry {
            source: kind.as_str().to_string(),
            path: path.display().to_string(),
            size_bytes: metadata.len(),
            sha256: sha256_file(path)?,
        });
    }

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_count: sources.len(),
        sources,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::SourceKind;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "plaincompare-inventory-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn fingerprints_every_source_in_fixed_order() {
        let dir = scratch_dir("ok");
        let config = SourcesConfig::under(&dir);
        for (kind, path) in config.entries() {
            fs::write(path, kind.as_str()).unwrap();
        }

        let manifest = build_manifest(&config).unwrap();

        assert_eq!(manifest.source_count, 7);
        let order: Vec<&str> = manifest.sources.iter().map(|entry| entry.source.as_str()).collect();
        let expected: Vec<&str> = SourceKind::ALL.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(order, expected);

        let cost = &manifest.sources[0];
        assert_eq!(cost.size_bytes, 4);
        assert_eq!(cost.sha256.len(), 64);
        assert_eq!(cost.sha256, sha256_file(&config.cost).unwrap());
        assert_ne!(cost.sha256, manifest.sources[1].sha256);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_sources_are_named() {
        let dir = scratch_dir("missing");
        let config = SourcesConfig::under(&dir);
        fs::write(&config.cost, b"x").unwrap();

        let err = build_manifest(&config).unwrap_err().to_string();
        assert!(err.contains("rent at"));
        assert!(err.contains("enviro at"));
        assert!(!err.contains("cost at"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
