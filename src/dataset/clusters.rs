use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::parse::{RawCluster, RawDataset};

pub const OTHERS_CLUSTER: &str = "Others";
pub const NO_POSITIONS_CLUSTER: &str = "No Positions Available";

const NO_POSITIONS_AFFILIATION: &str = "no positions available";
const MAX_NAMED_CLUSTERS: usize = 8;

const PALETTE: &[&str] = &[
    "#1f77b4", "#d62728", "#2ca02c", "#ff7f0e", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];
const OTHERS_COLOR: &str = "#bcbd22";
const NO_POSITIONS_COLOR: &str = "#7f7f7f";

/// Fills in a cluster table for datasets that ship without one.
///
/// The most common affiliations get their own cluster, the tail is merged into
/// [`OTHERS_CLUSTER`] and people without a known position go to
/// [`NO_POSITIONS_CLUSTER`]. Each cluster owns an arc of the unit circle
/// proportional to its share of nodes; its center sits in the middle of that
/// arc, mapped into the unit square of the canvas.
pub fn assign_derived_clusters(dataset: &mut RawDataset) {
    if dataset.clusters.is_some() {
        return;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut no_positions = 0usize;
    for node in &dataset.nodes {
        if node.affiliation.eq_ignore_ascii_case(NO_POSITIONS_AFFILIATION) {
            no_positions += 1;
        } else {
            *counts.entry(node.affiliation.as_str()).or_default() += 1;
        }
    }

    let mut ranked = counts.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut groups = Vec::new();
    let mut assignment: HashMap<String, String> = HashMap::new();
    for (index, (affiliation, count)) in ranked.iter().enumerate() {
        if index < MAX_NAMED_CLUSTERS {
            groups.push((affiliation.to_string(), *count, PALETTE[index % PALETTE.len()]));
            assignment.insert(affiliation.to_string(), affiliation.to_string());
        } else {
            assignment.insert(affiliation.to_string(), OTHERS_CLUSTER.to_owned());
        }
    }

    let others_count = ranked
        .iter()
        .skip(MAX_NAMED_CLUSTERS)
        .map(|(_, count)| *count)
        .sum::<usize>();
    if others_count > 0 {
        groups.push((OTHERS_CLUSTER.to_owned(), others_count, OTHERS_COLOR));
    }
    if no_positions > 0 {
        groups.push((NO_POSITIONS_CLUSTER.to_owned(), no_positions, NO_POSITIONS_COLOR));
    }

    let total = dataset.nodes.len().max(1) as f32;
    let mut cursor_degrees = 0.0_f32;
    let mut clusters = BTreeMap::new();
    for (name, count, color) in groups {
        let span = count as f32 / total * 360.0;
        let center = (cursor_degrees + span / 2.0).to_radians();
        cursor_degrees += span;

        clusters.insert(
            name,
            RawCluster {
                color: color.to_owned(),
                x_pos: 0.5 - 0.5 * center.sin(),
                y_pos: 0.5 - 0.5 * center.cos(),
            },
        );
    }

    for node in &mut dataset.nodes {
        let cluster = if node.affiliation.eq_ignore_ascii_case(NO_POSITIONS_AFFILIATION) {
            NO_POSITIONS_CLUSTER.to_owned()
        } else {
            assignment
                .get(&node.affiliation)
                .cloned()
                .unwrap_or_else(|| OTHERS_CLUSTER.to_owned())
        };
        node.cluster = Some(cluster);
    }

    debug!(clusters = clusters.len(), "derived cluster layout from affiliations");
    dataset.clusters = Some(clusters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawNode;

    fn node(name: &str, affiliation: &str) -> RawNode {
        RawNode {
            name: name.to_owned(),
            affiliation: affiliation.to_owned(),
            weight: 1.0,
            cluster: None,
        }
    }

    #[test]
    fn two_equal_groups_sit_on_opposite_sides() {
        let mut dataset = RawDataset {
            nodes: vec![node("a", "North"), node("b", "North"), node("c", "South"), node("d", "South")],
            links: Vec::new(),
            clusters: None,
        };

        assign_derived_clusters(&mut dataset);
        let clusters = dataset.clusters.expect("clusters assigned");

        // First group is centered at 90 degrees, the second at 270 degrees.
        let north = &clusters["North"];
        let south = &clusters["South"];
        assert!((north.x_pos - 0.0).abs() < 1e-5);
        assert!((north.y_pos - 0.5).abs() < 1e-5);
        assert!((south.x_pos - 1.0).abs() < 1e-5);
        assert!((south.y_pos - 0.5).abs() < 1e-5);
    }

    #[test]
    fn tail_affiliations_merge_into_others() {
        let mut nodes = Vec::new();
        for group in 0..10 {
            for member in 0..(12 - group) {
                nodes.push(node(&format!("p{group}-{member}"), &format!("Org {group}")));
            }
        }
        nodes.push(node("nobody", "no positions available"));
        let mut dataset = RawDataset {
            nodes,
            links: Vec::new(),
            clusters: None,
        };

        assign_derived_clusters(&mut dataset);
        let clusters = dataset.clusters.as_ref().expect("clusters assigned");

        assert_eq!(clusters.len(), MAX_NAMED_CLUSTERS + 2);
        assert!(clusters.contains_key(OTHERS_CLUSTER));
        assert!(clusters.contains_key(NO_POSITIONS_CLUSTER));
        let tail = dataset
            .nodes
            .iter()
            .find(|node| node.affiliation == "Org 9")
            .expect("tail node present");
        assert_eq!(tail.cluster_key(), OTHERS_CLUSTER);
        let nobody = dataset
            .nodes
            .iter()
            .find(|node| node.name == "nobody")
            .expect("unpositioned node present");
        assert_eq!(nobody.cluster_key(), NO_POSITIONS_CLUSTER);
    }

    #[test]
    fn existing_cluster_table_is_kept() {
        let mut dataset = RawDataset {
            nodes: vec![node("a", "North")],
            links: Vec::new(),
            clusters: Some(BTreeMap::new()),
        };

        assign_derived_clusters(&mut dataset);

        assert_eq!(dataset.clusters.as_ref().map(BTreeMap::len), Some(0));
        assert_eq!(dataset.nodes[0].cluster, None);
    }
}
