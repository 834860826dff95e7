//! Focus resolution: which nodes and links are the center, its neighborhood, or background.

use tracing::debug;

use crate::graph::GraphModel;

/// Position of a node or link relative to the focused node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Degree {
    Center,
    Neighbor,
    #[default]
    Background,
}

impl Degree {
    pub fn rank(self) -> u8 {
        match self {
            Self::Center => 0,
            Self::Neighbor => 1,
            Self::Background => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }
}

/// Highest degree rank that stays visible while a center is focused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Threshold {
    CenterOnly,
    #[default]
    Neighbors,
    Everything,
}

impl Threshold {
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::CenterOnly),
            1 => Some(Self::Neighbors),
            2 => Some(Self::Everything),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::CenterOnly => 0,
            Self::Neighbors => 1,
            Self::Everything => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CenterOnly => "Center only",
            Self::Neighbors => "Neighbors",
            Self::Everything => "Everything",
        }
    }

    fn visibility(self, degree: Degree) -> Visibility {
        if degree.rank() <= self.rank() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }
}

/// At most one focused node, by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FocusState {
    #[default]
    None,
    Center(String),
}

impl FocusState {
    pub fn center(name: impl Into<String>) -> Self {
        Self::Center(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Center(name) => Some(name.as_str()),
        }
    }
}

/// Recomputes degree and visibility of every node and link from the focus.
///
/// The result depends only on the model's structure, `focus` and `threshold`,
/// so calling it repeatedly with the same inputs is a no-op. A center name
/// missing from the model resolves exactly like [`FocusState::None`].
/// Returns the index of the resolved center.
pub fn resolve(model: &mut GraphModel, focus: &FocusState, threshold: Threshold) -> Option<usize> {
    let center = focus.name().and_then(|name| {
        let index = model.node_index(name);
        if index.is_none() {
            debug!(name, "focus target is not in the current dataset");
        }
        index
    });

    for node in model.nodes_mut() {
        node.degree = Degree::Background;
        node.visibility = Visibility::Visible;
    }
    for link in model.links_mut() {
        link.degree = Degree::Background;
        link.visibility = Visibility::Visible;
    }

    let Some(center) = center else {
        let order = (0..model.link_count()).collect();
        model.set_link_paint_order(order);
        return None;
    };

    let mut neighbors = Vec::new();
    for link in model.links_mut() {
        if let Some(other) = link.other(center) {
            link.degree = Degree::Neighbor;
            neighbors.push(other);
        }
    }

    let nodes = model.nodes_mut();
    for index in neighbors {
        nodes[index].degree = Degree::Neighbor;
    }
    nodes[center].degree = Degree::Center;

    for node in model.nodes_mut() {
        node.visibility = threshold.visibility(node.degree);
    }
    for link in model.links_mut() {
        link.visibility = threshold.visibility(link.degree);
    }

    let mut order = (0..model.link_count()).collect::<Vec<_>>();
    let links = model.links();
    order.sort_by_key(|&index| std::cmp::Reverse(links[index].degree.rank()));
    model.set_link_paint_order(order);

    Some(center)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::tests::abc_dataset;

    fn snapshot(model: &GraphModel) -> (Vec<(Degree, Visibility)>, Vec<(Degree, Visibility)>) {
        (
            model
                .nodes()
                .iter()
                .map(|node| (node.degree, node.visibility))
                .collect(),
            model
                .links()
                .iter()
                .map(|link| (link.degree, link.visibility))
                .collect(),
        )
    }

    fn model() -> GraphModel {
        GraphModel::build(&abc_dataset(), 5.0).expect("valid dataset")
    }

    #[test]
    fn no_focus_shows_everything_as_background() {
        let mut model = model();
        assert_eq!(resolve(&mut model, &FocusState::None, Threshold::CenterOnly), None);

        let (nodes, links) = snapshot(&model);
        assert!(nodes.iter().all(|entry| *entry == (Degree::Background, Visibility::Visible)));
        assert!(links.iter().all(|entry| *entry == (Degree::Background, Visibility::Visible)));
        assert_eq!(model.link_paint_order(), &[0, 1]);
    }

    #[test]
    fn focus_marks_center_and_direct_neighbors() {
        let mut model = model();
        assert_eq!(resolve(&mut model, &FocusState::center("A"), Threshold::Neighbors), Some(0));

        let (nodes, links) = snapshot(&model);
        assert_eq!(
            nodes,
            vec![
                (Degree::Center, Visibility::Visible),
                (Degree::Neighbor, Visibility::Visible),
                (Degree::Background, Visibility::Hidden),
            ]
        );
        assert_eq!(
            links,
            vec![
                (Degree::Neighbor, Visibility::Visible),
                (Degree::Background, Visibility::Hidden),
            ]
        );
        // Focused link paints last.
        assert_eq!(model.link_paint_order(), &[1, 0]);
    }

    #[test]
    fn threshold_everything_keeps_background_visible() {
        let mut model = model();
        resolve(&mut model, &FocusState::center("A"), Threshold::Everything);
        assert!(model.nodes().iter().all(|node| node.visibility.is_visible()));
        assert_eq!(model.nodes()[2].degree, Degree::Background);
    }

    #[test]
    fn center_only_hides_neighbors() {
        let mut model = model();
        resolve(&mut model, &FocusState::center("B"), Threshold::CenterOnly);
        let visible = model
            .nodes()
            .iter()
            .filter(|node| node.visibility.is_visible())
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(visible, vec!["B"]);
    }

    #[test]
    fn unknown_center_equals_no_focus() {
        let mut expected = model();
        resolve(&mut expected, &FocusState::None, Threshold::Neighbors);

        let mut model = model();
        assert_eq!(resolve(&mut model, &FocusState::center("Z"), Threshold::Neighbors), None);
        assert_eq!(snapshot(&model), snapshot(&expected));
    }

    #[test]
    fn resolve_is_idempotent_and_round_trips() {
        let mut model = model();
        resolve(&mut model, &FocusState::None, Threshold::Neighbors);
        let unfocused = snapshot(&model);

        resolve(&mut model, &FocusState::center("C"), Threshold::Neighbors);
        let focused = snapshot(&model);
        resolve(&mut model, &FocusState::center("C"), Threshold::Neighbors);
        assert_eq!(snapshot(&model), focused);

        resolve(&mut model, &FocusState::None, Threshold::Neighbors);
        assert_eq!(snapshot(&model), unfocused);
    }

    #[test]
    fn threshold_rank_round_trips() {
        for rank in 0..=2 {
            let threshold = Threshold::from_rank(rank).expect("supported rank");
            assert_eq!(threshold.rank(), rank);
        }
        assert_eq!(Threshold::from_rank(3), None);
    }
}
