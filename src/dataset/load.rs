use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::clusters::assign_derived_clusters;
use super::parse::{RawDataset, parse_dataset};

pub fn load_dataset(path: &Path) -> Result<RawDataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let mut dataset = parse_dataset(&raw)
        .with_context(|| format!("failed to parse dataset {}", path.display()))?;
    assign_derived_clusters(&mut dataset);

    info!(
        path = %path.display(),
        nodes = dataset.nodes.len(),
        links = dataset.links.len(),
        "loaded dataset"
    );
    Ok(dataset)
}
