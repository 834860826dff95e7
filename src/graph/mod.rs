mod adjacency;

use std::collections::{BTreeMap, HashMap};

use eframe::egui::{Color32, Vec2, vec2};

use crate::dataset::{RawCluster, RawDataset, RawLink, RawNode};
use crate::error::{GraphError, Result};
use crate::focus::{Degree, Visibility};
use crate::util::parse_hex_color;

pub use adjacency::AdjacencyIndex;

pub const NEUTRAL_COLOR: Color32 = Color32::from_rgb(150, 150, 150);

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub affiliation: String,
    pub cluster: Option<usize>,
    pub weight: f32,
    pub radius: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Fixed position while the node is held by a drag.
    pub pinned: Option<Vec2>,
    /// Gravity target remembered from the last drag release.
    pub anchor: Option<Vec2>,
    pub degree: Degree,
    pub visibility: Visibility,
}

#[derive(Clone, Debug)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
    pub degree: Degree,
    pub visibility: Visibility,
}

impl Link {
    pub fn other(&self, index: usize) -> Option<usize> {
        if self.source == index {
            Some(self.target)
        } else if self.target == index {
            Some(self.source)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cluster {
    pub name: String,
    pub color: Color32,
    /// Gravity center as a fraction of the canvas size.
    pub anchor: Vec2,
    pub members: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct GraphModel {
    nodes: Vec<Node>,
    links: Vec<Link>,
    clusters: Vec<Cluster>,
    index_by_name: HashMap<String, usize>,
    adjacency: AdjacencyIndex,
    link_paint_order: Vec<usize>,
    max_weight: f32,
    max_link_weight: f32,
}

/// Sub-linear node size with a floor so weightless nodes stay clickable.
pub fn node_radius(weight: f32, min_radius: f32) -> f32 {
    weight.max(0.0).cbrt().max(min_radius)
}

/// Weights are laid out in `f32`; values that do not survive the narrowing are rejected.
fn layout_weight(weight: f64) -> Option<f32> {
    let narrowed = weight as f32;
    (narrowed.is_finite() && narrowed >= 0.0).then_some(narrowed)
}

impl GraphModel {
    pub fn build(dataset: &RawDataset, min_radius: f32) -> Result<Self> {
        let empty = BTreeMap::new();
        let clusters = dataset.clusters.as_ref().unwrap_or(&empty);
        Self::from_parts(&dataset.nodes, &dataset.links, clusters, min_radius)
    }

    pub fn from_parts(
        raw_nodes: &[RawNode],
        raw_links: &[RawLink],
        raw_clusters: &BTreeMap<String, RawCluster>,
        min_radius: f32,
    ) -> Result<Self> {
        let mut clusters = Vec::with_capacity(raw_clusters.len());
        let mut cluster_by_name = HashMap::with_capacity(raw_clusters.len());
        for (name, raw) in raw_clusters {
            let color = parse_hex_color(&raw.color).ok_or_else(|| {
                GraphError::InvalidClusterColor {
                    name: name.clone(),
                    color: raw.color.clone(),
                }
            })?;
            if !(raw.x_pos.is_finite() && raw.y_pos.is_finite()) {
                return Err(GraphError::MalformedDataset(format!(
                    "cluster `{name}` has a non-finite position"
                )));
            }
            cluster_by_name.insert(name.as_str(), clusters.len());
            clusters.push(Cluster {
                name: name.clone(),
                color,
                anchor: vec2(raw.x_pos, raw.y_pos),
                members: Vec::new(),
            });
        }

        let mut nodes = Vec::with_capacity(raw_nodes.len());
        let mut index_by_name = HashMap::with_capacity(raw_nodes.len());
        for (index, raw) in raw_nodes.iter().enumerate() {
            if raw.name.trim().is_empty() {
                return Err(GraphError::EmptyName(index));
            }
            let weight = layout_weight(raw.weight).ok_or_else(|| GraphError::InvalidWeight {
                name: raw.name.clone(),
                weight: raw.weight,
            })?;
            if index_by_name.insert(raw.name.clone(), index).is_some() {
                return Err(GraphError::DuplicateNode(raw.name.clone()));
            }

            let cluster = cluster_by_name.get(raw.cluster_key()).copied();
            if let Some(cluster) = cluster {
                clusters[cluster].members.push(index);
            }

            nodes.push(Node {
                name: raw.name.clone(),
                affiliation: raw.affiliation.clone(),
                cluster,
                weight,
                radius: node_radius(weight, min_radius),
                position: Vec2::ZERO,
                velocity: Vec2::ZERO,
                pinned: None,
                anchor: None,
                degree: Degree::Background,
                visibility: Visibility::Visible,
            });
        }

        let mut links = Vec::with_capacity(raw_links.len());
        for (index, raw) in raw_links.iter().enumerate() {
            let resolve = |name: &str| {
                index_by_name
                    .get(name)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownEndpoint {
                        link: index,
                        name: name.to_owned(),
                    })
            };
            let source = resolve(&raw.source)?;
            let target = resolve(&raw.target)?;
            let weight = layout_weight(raw.weight).ok_or(GraphError::InvalidLinkWeight {
                link: index,
                weight: raw.weight,
            })?;

            links.push(Link {
                source,
                target,
                weight,
                degree: Degree::Background,
                visibility: Visibility::Visible,
            });
        }

        let max_weight = nodes.iter().map(|node| node.weight).fold(0.0_f32, f32::max);
        let max_link_weight = links.iter().map(|link| link.weight).fold(0.0_f32, f32::max);
        let adjacency = AdjacencyIndex::rebuild(nodes.len(), &links);
        let link_paint_order = (0..links.len()).collect();

        Ok(Self {
            nodes,
            links,
            clusters,
            index_by_name,
            adjacency,
            link_paint_order,
            max_weight,
            max_link_weight,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.node_index(name).map(|index| &self.nodes[index])
    }

    /// Exact name first, then a case-insensitive match. Returns the canonical name.
    pub fn find_name(&self, query: &str) -> Option<&str> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some(node) = self.node(query) {
            return Some(node.name.as_str());
        }
        let lowered = query.to_lowercase();
        self.nodes
            .iter()
            .find(|node| node.name.to_lowercase() == lowered)
            .map(|node| node.name.as_str())
    }

    pub fn adjacency(&self) -> &AdjacencyIndex {
        &self.adjacency
    }

    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency.contains(a, b)
    }

    pub fn cluster_of(&self, index: usize) -> Option<&Cluster> {
        self.nodes
            .get(index)
            .and_then(|node| node.cluster)
            .and_then(|cluster| self.clusters.get(cluster))
    }

    pub fn cluster_color(&self, index: usize) -> Color32 {
        self.cluster_of(index)
            .map(|cluster| cluster.color)
            .unwrap_or(NEUTRAL_COLOR)
    }

    pub fn same_cluster(&self, a: usize, b: usize) -> bool {
        match (self.nodes[a].cluster, self.nodes[b].cluster) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    pub fn max_weight(&self) -> f32 {
        self.max_weight
    }

    pub fn max_link_weight(&self) -> f32 {
        self.max_link_weight
    }

    /// Link indices in the order they should be painted, least focused first.
    pub fn link_paint_order(&self) -> &[usize] {
        &self.link_paint_order
    }

    pub(crate) fn set_link_paint_order(&mut self, order: Vec<usize>) {
        debug_assert_eq!(order.len(), self.links.len());
        self.link_paint_order = order;
    }

    /// Links touching the node, strongest first.
    pub fn strongest_links(&self, index: usize, limit: usize) -> Vec<(usize, f32)> {
        let mut related = self
            .links
            .iter()
            .filter_map(|link| link.other(index).map(|other| (other, link.weight)))
            .filter(|(other, _)| *other != index)
            .collect::<Vec<_>>();
        related.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        related.truncate(limit);
        related
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;

    pub(crate) fn raw_node(name: &str, affiliation: &str, weight: f64) -> RawNode {
        RawNode {
            name: name.to_owned(),
            affiliation: affiliation.to_owned(),
            weight,
            cluster: None,
        }
    }

    pub(crate) fn raw_link(source: &str, target: &str, weight: f64) -> RawLink {
        RawLink {
            source: source.to_owned(),
            target: target.to_owned(),
            weight,
        }
    }

    pub(crate) fn raw_cluster(color: &str, x_pos: f32, y_pos: f32) -> RawCluster {
        RawCluster {
            color: color.to_owned(),
            x_pos,
            y_pos,
        }
    }

    /// Nodes A, B, C with links A-B (5) and B-C (1).
    pub(crate) fn abc_dataset() -> RawDataset {
        RawDataset {
            nodes: vec![
                raw_node("A", "Left", 8.0),
                raw_node("B", "Left", 27.0),
                raw_node("C", "Right", 0.0),
            ],
            links: vec![raw_link("A", "B", 5.0), raw_link("B", "C", 1.0)],
            clusters: Some(BTreeMap::from([
                ("Left".to_owned(), raw_cluster("#1f77b4", 0.2, 0.5)),
                ("Right".to_owned(), raw_cluster("#d62728", 0.8, 0.5)),
            ])),
        }
    }

    #[test]
    fn resolves_link_endpoints_to_member_nodes() {
        let model = GraphModel::build(&abc_dataset(), 5.0).expect("valid dataset");

        for link in model.links() {
            assert!(link.source < model.node_count());
            assert!(link.target < model.node_count());
        }
        assert_eq!(model.nodes()[model.links()[0].source].name, "A");
        assert_eq!(model.nodes()[model.links()[0].target].name, "B");
        assert!(model.is_adjacent(0, 1));
        assert!(model.is_adjacent(1, 0));
        assert!(!model.is_adjacent(0, 2));
        assert_eq!(model.adjacency().neighbors(1), &[0, 2]);
        assert_eq!(model.max_weight(), 27.0);
        assert_eq!(model.max_link_weight(), 5.0);
    }

    #[test]
    fn unknown_endpoint_fails_the_whole_build() {
        let mut dataset = abc_dataset();
        dataset.links.push(raw_link("A", "Z", 1.0));

        let error = GraphModel::build(&dataset, 5.0).expect_err("unknown endpoint");

        assert_eq!(
            error,
            GraphError::UnknownEndpoint {
                link: 2,
                name: "Z".to_owned()
            }
        );
        assert_eq!(error.kind(), ErrorKind::DataIntegrity);
    }

    #[test]
    fn weights_beyond_f32_range_are_rejected() {
        let mut dataset = abc_dataset();
        dataset.nodes[0].weight = 1e300;
        assert!(matches!(
            GraphModel::build(&dataset, 5.0),
            Err(GraphError::InvalidWeight { weight, .. }) if weight == 1e300
        ));

        let mut dataset = abc_dataset();
        dataset.links[0].weight = 1e300;
        assert_eq!(
            GraphModel::build(&dataset, 5.0).expect_err("overflowing link weight"),
            GraphError::InvalidLinkWeight {
                link: 0,
                weight: 1e300
            }
        );

        let mut dataset = abc_dataset();
        dataset.nodes[1].weight = f64::from(f32::MAX);
        let model = GraphModel::build(&dataset, 5.0).expect("largest f32 weight is accepted");
        assert!(model.nodes().iter().all(|node| node.radius.is_finite()));
        assert!(model.max_weight().is_finite());
    }

    #[test]
    fn duplicate_and_invalid_nodes_are_rejected() {
        let mut dataset = abc_dataset();
        dataset.nodes.push(raw_node("A", "Left", 1.0));
        assert_eq!(
            GraphModel::build(&dataset, 5.0).expect_err("duplicate"),
            GraphError::DuplicateNode("A".to_owned())
        );

        let mut dataset = abc_dataset();
        dataset.nodes[2].weight = f64::NAN;
        assert!(matches!(
            GraphModel::build(&dataset, 5.0),
            Err(GraphError::InvalidWeight { .. })
        ));

        let mut dataset = abc_dataset();
        dataset.nodes[0].name = "  ".to_owned();
        assert_eq!(
            GraphModel::build(&dataset, 5.0).expect_err("empty name"),
            GraphError::EmptyName(0)
        );
    }

    #[test]
    fn radius_is_cube_root_with_floor() {
        assert_eq!(node_radius(0.0, 5.0), 5.0);
        assert!((node_radius(27.0, 2.0) - 3.0).abs() < 1e-5);
        assert!((node_radius(1000.0, 5.0) - 10.0).abs() < 1e-4);
        assert!(node_radius(2000.0, 5.0) > node_radius(1000.0, 5.0));
    }

    #[test]
    fn unknown_affiliation_falls_back_to_neutral_style() {
        let mut dataset = abc_dataset();
        dataset.nodes.push(raw_node("D", "Elsewhere", 1.0));
        let model = GraphModel::build(&dataset, 5.0).expect("valid dataset");

        let index = model.node_index("D").expect("D exists");
        assert_eq!(model.nodes()[index].cluster, None);
        assert_eq!(model.cluster_color(index), NEUTRAL_COLOR);
        assert_eq!(model.clusters()[0].members, vec![0, 1]);
    }

    #[test]
    fn find_name_ignores_case() {
        let model = GraphModel::build(&abc_dataset(), 5.0).expect("valid dataset");
        assert_eq!(model.find_name("b"), Some("B"));
        assert_eq!(model.find_name(" A "), Some("A"));
        assert_eq!(model.find_name("nobody"), None);
        assert_eq!(model.find_name(""), None);
    }

    #[test]
    fn strongest_links_are_sorted_by_weight() {
        let model = GraphModel::build(&abc_dataset(), 5.0).expect("valid dataset");
        assert_eq!(model.strongest_links(1, 5), vec![(0, 5.0), (2, 1.0)]);
        assert_eq!(model.strongest_links(1, 1), vec![(0, 5.0)]);
    }
}
