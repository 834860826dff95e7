mod color;

use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Vec2, vec2};

use crate::focus::{Degree, Visibility};
use crate::graph::GraphModel;

use color::{dim_color, link_color, node_fill, weight_share};

const LABEL_GAP: f32 = 4.0;
/// Unfocused nodes below this radius are drawn without a label.
const LABEL_MIN_RADIUS: f32 = 9.0;
const CENTER_STROKE: Color32 = Color32::from_rgb(245, 206, 93);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimitiveId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Center,
    Neighbor,
    /// Not part of the focused neighborhood while something is focused.
    Background,
    Neutral,
}

impl Emphasis {
    fn from_degree(degree: Degree, focused: bool) -> Self {
        match (focused, degree) {
            (false, _) => Self::Neutral,
            (true, Degree::Center) => Self::Center,
            (true, Degree::Neighbor) => Self::Neighbor,
            (true, Degree::Background) => Self::Background,
        }
    }

    pub fn is_focused(self) -> bool {
        matches!(self, Self::Center | Self::Neighbor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelPlacement {
    Beside,
    Above,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodePrimitive {
    pub id: PrimitiveId,
    pub node: usize,
    pub name: String,
    pub position: Vec2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Option<(f32, Color32)>,
    pub emphasis: Emphasis,
    pub label: Option<LabelPlacement>,
}

impl NodePrimitive {
    pub fn label_anchor(&self) -> Option<Vec2> {
        self.label.map(|placement| match placement {
            LabelPlacement::Beside => self.position + vec2(self.radius + LABEL_GAP, 0.0),
            LabelPlacement::Above => self.position - vec2(0.0, self.radius + LABEL_GAP),
        })
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (point - self.position).length_sq() <= self.radius * self.radius
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkPrimitive {
    pub id: PrimitiveId,
    pub link: usize,
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterLabel {
    pub cluster: usize,
    pub text: String,
    pub position: Vec2,
    pub color: Color32,
}

type LinkKey = (String, String, usize);

/// Live primitives for the current model, rebuilt by [`Bindings::sync`] and
/// repositioned every tick by [`Bindings::sync_positions`].
#[derive(Debug, Default)]
pub struct Bindings {
    node_ids: HashMap<String, PrimitiveId>,
    link_ids: HashMap<LinkKey, PrimitiveId>,
    next_id: u64,
    nodes: Vec<NodePrimitive>,
    links: Vec<LinkPrimitive>,
    labels: Vec<ClusterLabel>,
}

impl Bindings {
    pub fn new(model: &GraphModel) -> Self {
        let mut bindings = Self::default();
        bindings.sync(model);
        bindings
    }

    pub fn nodes(&self) -> &[NodePrimitive] {
        &self.nodes
    }

    pub fn links(&self) -> &[LinkPrimitive] {
        &self.links
    }

    pub fn cluster_labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    pub fn node_id(&self, name: &str) -> Option<PrimitiveId> {
        self.node_ids.get(name).copied()
    }

    pub fn node_primitive(&self, name: &str) -> Option<&NodePrimitive> {
        self.nodes.iter().find(|primitive| primitive.name == name)
    }

    fn allocate(next_id: &mut u64) -> PrimitiveId {
        let id = PrimitiveId(*next_id);
        *next_id += 1;
        id
    }

    /// Rebuilds every primitive from degree, visibility and weight.
    pub fn sync(&mut self, model: &GraphModel) {
        let focused = model
            .nodes()
            .iter()
            .any(|node| node.degree == Degree::Center);

        self.node_ids
            .retain(|name, _| model.node_index(name).is_some());
        let mut order = (0..model.node_count())
            .filter(|&index| model.nodes()[index].visibility == Visibility::Visible)
            .collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            let (left, right) = (&model.nodes()[a], &model.nodes()[b]);
            right
                .degree
                .cmp(&left.degree)
                .then_with(|| left.weight.total_cmp(&right.weight))
                .then_with(|| a.cmp(&b))
        });

        self.nodes.clear();
        for index in order {
            let node = &model.nodes()[index];
            let next_id = &mut self.next_id;
            let id = *self
                .node_ids
                .entry(node.name.clone())
                .or_insert_with(|| Self::allocate(next_id));

            let emphasis = Emphasis::from_degree(node.degree, focused);
            let fill = node_fill(model.cluster_color(index), node.weight, model.max_weight());
            let (fill, stroke) = match emphasis {
                Emphasis::Center => (fill, Some((2.5, CENTER_STROKE))),
                Emphasis::Neighbor => (fill, Some((1.0, Color32::WHITE))),
                Emphasis::Background => (dim_color(fill, 0.35), None),
                Emphasis::Neutral => (fill, None),
            };
            let label = if emphasis.is_focused() {
                Some(LabelPlacement::Beside)
            } else if node.radius >= LABEL_MIN_RADIUS && emphasis == Emphasis::Neutral {
                Some(LabelPlacement::Above)
            } else {
                None
            };

            self.nodes.push(NodePrimitive {
                id,
                node: index,
                name: node.name.clone(),
                position: node.position,
                radius: node.radius,
                fill,
                stroke,
                emphasis,
                label,
            });
        }

        let mut seen = HashMap::<(usize, usize), usize>::new();
        let mut keys = vec![None; model.link_count()];
        for (index, link) in model.links().iter().enumerate() {
            let ordinal = seen.entry((link.source, link.target)).or_insert(0);
            keys[index] = Some((
                model.nodes()[link.source].name.clone(),
                model.nodes()[link.target].name.clone(),
                *ordinal,
            ));
            *ordinal += 1;
        }
        let live = keys.iter().flatten().collect::<HashSet<_>>();
        self.link_ids.retain(|key, _| live.contains(key));

        self.links.clear();
        for &index in model.link_paint_order() {
            let link = &model.links()[index];
            if !link.visibility.is_visible() {
                continue;
            }
            let Some(key) = keys[index].take() else {
                continue;
            };
            let next_id = &mut self.next_id;
            let id = *self
                .link_ids
                .entry(key)
                .or_insert_with(|| Self::allocate(next_id));

            let emphasis = Emphasis::from_degree(link.degree, focused);
            let base_width = 0.6 + 2.4 * weight_share(link.weight, model.max_link_weight());
            let width = if emphasis.is_focused() {
                base_width * 1.6 + 0.8
            } else {
                base_width
            };

            self.links.push(LinkPrimitive {
                id,
                link: index,
                from: model.nodes()[link.source].position,
                to: model.nodes()[link.target].position,
                width,
                color: link_color(emphasis.is_focused(), emphasis == Emphasis::Background),
            });
        }

        self.update_cluster_labels(model);
    }

    pub fn sync_positions(&mut self, model: &GraphModel) {
        let nodes = model.nodes();
        for primitive in &mut self.nodes {
            if let Some(node) = nodes.get(primitive.node) {
                primitive.position = node.position;
            }
        }
        let links = model.links();
        for primitive in &mut self.links {
            if let Some(link) = links.get(primitive.link) {
                primitive.from = nodes[link.source].position;
                primitive.to = nodes[link.target].position;
            }
        }
        self.update_cluster_labels(model);
    }

    /// Cluster labels sit at the centroid of their members' current positions.
    fn update_cluster_labels(&mut self, model: &GraphModel) {
        self.labels.clear();
        for (cluster_index, cluster) in model.clusters().iter().enumerate() {
            if cluster.members.is_empty() {
                continue;
            }
            let sum = cluster
                .members
                .iter()
                .fold(Vec2::ZERO, |sum, &member| sum + model.nodes()[member].position);
            self.labels.push(ClusterLabel {
                cluster: cluster_index,
                text: cluster.name.clone(),
                position: sum / cluster.members.len() as f32,
                color: cluster.color,
            });
        }
    }

    /// Topmost visible node under `point` (canvas coordinates).
    pub fn hit_test(&self, point: Vec2) -> Option<&NodePrimitive> {
        self.nodes
            .iter()
            .rev()
            .filter(|primitive| primitive.contains(point))
            .min_by(|a, b| {
                (point - a.position)
                    .length_sq()
                    .total_cmp(&(point - b.position).length_sq())
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::focus::{FocusState, Threshold, resolve};
    use crate::graph::tests::abc_dataset;

    fn model() -> GraphModel {
        let mut model = GraphModel::build(&abc_dataset(), 5.0).expect("valid dataset");
        for (index, node) in model.nodes_mut().iter_mut().enumerate() {
            node.position = vec2(100.0 + index as f32 * 100.0, 100.0);
        }
        model
    }

    #[test]
    fn primitive_ids_follow_names_across_syncs() {
        let mut model = model();
        let mut bindings = Bindings::new(&model);
        let ids = ["A", "B", "C"].map(|name| bindings.node_id(name));

        resolve(&mut model, &FocusState::center("A"), Threshold::Everything);
        bindings.sync(&model);

        assert_eq!(["A", "B", "C"].map(|name| bindings.node_id(name)), ids);
        assert_eq!(bindings.nodes().last().map(|node| node.name.as_str()), Some("A"));
    }

    #[test]
    fn ids_survive_a_reordered_dataset() {
        let model = model();
        let mut bindings = Bindings::new(&model);
        let id_b = bindings.node_id("B");

        let mut reversed = abc_dataset();
        reversed.nodes.reverse();
        let reordered = GraphModel::build(&reversed, 5.0).expect("valid dataset");
        bindings.sync(&reordered);

        assert_eq!(bindings.node_id("B"), id_b);
        assert_eq!(bindings.node_primitive("B").map(|node| node.node), Some(1));
        assert_eq!(bindings.node_primitive("A").map(|node| node.node), Some(2));
    }

    #[test]
    fn hidden_elements_are_not_bound_or_hit() {
        let mut model = model();
        resolve(&mut model, &FocusState::center("A"), Threshold::Neighbors);
        let bindings = Bindings::new(&model);

        let names = bindings
            .nodes()
            .iter()
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(bindings.links().len(), 1);
        assert!(bindings.hit_test(vec2(300.0, 100.0)).is_none());
        assert_eq!(
            bindings.hit_test(vec2(101.0, 100.0)).map(|node| node.name.as_str()),
            Some("A")
        );
    }

    #[test]
    fn focused_links_are_wider_and_labels_move_beside() {
        let mut model = model();
        resolve(&mut model, &FocusState::center("A"), Threshold::Everything);
        let bindings = Bindings::new(&model);

        let focused = bindings.links().iter().find(|link| link.link == 0).expect("A-B bound");
        let background = bindings.links().iter().find(|link| link.link == 1).expect("B-C bound");
        assert!(focused.width > background.width);
        // Focused links paint after background links.
        assert_eq!(bindings.links().last().map(|link| link.link), Some(0));

        let center = bindings.node_primitive("A").expect("A bound");
        assert_eq!(center.emphasis, Emphasis::Center);
        assert_eq!(center.label, Some(LabelPlacement::Beside));
        assert_eq!(
            bindings.node_primitive("C").map(|node| node.emphasis),
            Some(Emphasis::Background)
        );
    }

    #[test]
    fn positions_and_cluster_labels_follow_ticks() {
        let mut model = model();
        let mut bindings = Bindings::new(&model);

        model.nodes_mut()[0].position = vec2(0.0, 0.0);
        model.nodes_mut()[1].position = vec2(20.0, 40.0);
        bindings.sync_positions(&model);

        assert_eq!(
            bindings.node_primitive("A").map(|node| node.position),
            Some(vec2(0.0, 0.0))
        );
        let left = &bindings.cluster_labels()[0];
        assert_eq!(left.text, "Left");
        assert_eq!(left.position, vec2(10.0, 20.0));
        let link = bindings.links().iter().find(|link| link.link == 0).expect("A-B bound");
        assert_eq!((link.from, link.to), (vec2(0.0, 0.0), vec2(20.0, 40.0)));
    }
}
