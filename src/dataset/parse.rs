use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawNode {
    pub name: String,
    pub affiliation: String,
    #[serde(alias = "docs")]
    pub weight: f64,
    /// Cluster key when it differs from the affiliation (set by derived layouts).
    #[serde(default)]
    pub cluster: Option<String>,
}

impl RawNode {
    pub fn cluster_key(&self) -> &str {
        self.cluster.as_deref().unwrap_or(&self.affiliation)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawLink {
    pub source: String,
    pub target: String,
    #[serde(alias = "docs")]
    pub weight: f64,
}

/// Cluster metadata. Positions are fractions of the canvas size.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawCluster {
    pub color: String,
    pub x_pos: f32,
    pub y_pos: f32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawDataset {
    pub nodes: Vec<RawNode>,
    #[serde(alias = "edges")]
    pub links: Vec<RawLink>,
    #[serde(default)]
    pub clusters: Option<BTreeMap<String, RawCluster>>,
}

pub fn parse_dataset(raw: &str) -> Result<RawDataset> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GraphError};

    #[test]
    fn accepts_docs_as_weight_alias() {
        let dataset = parse_dataset(
            r##"{
                "nodes": [
                    {"name": "DUNN,WL", "affiliation": "Philip Morris", "docs": 12},
                    {"name": "TEAGUE,CE", "affiliation": "RJ Reynolds", "weight": 3}
                ],
                "links": [{"source": "DUNN,WL", "target": "TEAGUE,CE", "docs": 2}],
                "clusters": {
                    "Philip Morris": {"color": "#1f77b4", "x_pos": 0.2, "y_pos": 0.2}
                }
            }"##,
        )
        .expect("dataset parses");

        assert_eq!(dataset.nodes[0].weight, 12.0);
        assert_eq!(dataset.nodes[1].weight, 3.0);
        assert_eq!(dataset.links[0].weight, 2.0);
        assert_eq!(dataset.nodes[0].cluster_key(), "Philip Morris");
        assert_eq!(dataset.clusters.as_ref().map(|c| c.len()), Some(1));
    }

    #[test]
    fn missing_required_field_is_a_data_integrity_error() {
        let error = parse_dataset(r#"{"nodes": [{"name": "A", "weight": 1}], "links": []}"#)
            .expect_err("affiliation is required");

        assert!(matches!(error, GraphError::MalformedDataset(_)));
        assert_eq!(error.kind(), ErrorKind::DataIntegrity);
    }

    #[test]
    fn clusters_are_optional() {
        let dataset = parse_dataset(r#"{"nodes": [], "links": []}"#).expect("empty dataset parses");
        assert!(dataset.clusters.is_none());
    }
}
