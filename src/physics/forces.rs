use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::config::ForceTable;
use crate::graph::GraphModel;

use super::quadtree::QuadTree;

/// The named forces a simulation sums every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceKind {
    Repulsion,
    LinkAttraction,
    ClusterGravity,
    Collision,
    Centering,
}

pub const DEFAULT_FORCES: [ForceKind; 5] = [
    ForceKind::Repulsion,
    ForceKind::LinkAttraction,
    ForceKind::ClusterGravity,
    ForceKind::Collision,
    ForceKind::Centering,
];

/// Per-tick inputs shared by every force.
pub(super) struct ForceFrame<'a> {
    pub(super) alpha: f32,
    pub(super) table: &'a ForceTable,
    pub(super) positions: &'a [Vec2],
    /// Positions advanced by the current velocity.
    pub(super) predicted: &'a [Vec2],
    pub(super) targets: &'a [Vec2],
    pub(super) canvas_center: Vec2,
    pub(super) collision_cap: f32,
}

impl ForceKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Repulsion => "charge",
            Self::LinkAttraction => "link",
            Self::ClusterGravity => "gravity",
            Self::Collision => "collision",
            Self::Centering => "center",
        }
    }

    /// Adds this force's velocity change for every node into `deltas`.
    pub(super) fn apply(self, model: &GraphModel, frame: &ForceFrame<'_>, deltas: &mut [Vec2]) {
        match self {
            Self::Repulsion => apply_repulsion(frame, deltas),
            Self::LinkAttraction => apply_link_attraction(model, frame, deltas),
            Self::ClusterGravity => apply_cluster_gravity(model, frame, deltas),
            Self::Collision => apply_collision(model, frame, deltas),
            Self::Centering => apply_centering(model, frame, deltas),
        }
    }
}

/// Deterministic unit vector for coincident points.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

#[derive(Clone, Copy)]
struct RepulsionParams {
    strength: f32,
    distance_min_sq: f32,
    distance_max_sq: f32,
    theta: f32,
}

fn repulsion_between(
    point: Vec2,
    other: Vec2,
    weight: f32,
    params: RepulsionParams,
    pair: (usize, usize),
) -> Vec2 {
    let delta = point - other;
    let distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq <= 1e-8 {
        return fallback_direction(pair.0, pair.1) * (weight / params.distance_min_sq.sqrt());
    }

    let distance_sq = if distance_sq < params.distance_min_sq {
        (params.distance_min_sq * distance_sq).sqrt()
    } else {
        distance_sq
    };
    delta * (weight / distance_sq)
}

fn accumulate_repulsion(
    tree: &QuadTree,
    cell: usize,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    delta: &mut Vec2,
) {
    let node = tree.cell(cell);
    let point = positions[index];

    if node.is_leaf() {
        for &other in tree.bodies(cell) {
            if other != index {
                *delta += repulsion_between(
                    point,
                    positions[other],
                    params.strength,
                    params,
                    (index, other),
                );
            }
        }
        return;
    }

    let distance = (point - node.centroid).length().max(1e-4);
    if node.count > 1 && !node.contains(point) && node.square.width() / distance < params.theta {
        *delta += repulsion_between(
            point,
            node.centroid,
            params.strength * node.count as f32,
            params,
            (index, usize::MAX),
        );
        return;
    }

    for child in node.children.clone() {
        accumulate_repulsion(tree, child, index, positions, params, delta);
    }
}

fn apply_repulsion(frame: &ForceFrame<'_>, deltas: &mut [Vec2]) {
    let strength = -frame.table.charge_strength * frame.alpha;
    if strength == 0.0 {
        return;
    }
    let Some(tree) = QuadTree::build(frame.positions, |_| 0.0) else {
        return;
    };

    let params = RepulsionParams {
        strength,
        distance_min_sq: frame.table.charge_distance_min.powi(2),
        distance_max_sq: frame.table.charge_distance_max.powi(2),
        theta: frame.table.theta,
    };
    for (index, delta) in deltas.iter_mut().enumerate() {
        accumulate_repulsion(&tree, QuadTree::ROOT, index, frame.positions, params, delta);
    }
}

fn apply_link_attraction(model: &GraphModel, frame: &ForceFrame<'_>, deltas: &mut [Vec2]) {
    let table = frame.table;
    if table.link_strength == 0.0 {
        return;
    }
    let max_weight = model.max_link_weight();
    let adjacency = model.adjacency();

    for link in model.links() {
        let (source, target) = (link.source, link.target);
        if source == target {
            continue;
        }

        let source_links = adjacency.link_count(source).max(1) as f32;
        let target_links = adjacency.link_count(target).max(1) as f32;
        let weight_factor = if max_weight > 0.0 {
            (link.weight / max_weight).sqrt()
        } else {
            1.0
        };
        let mut strength = table.link_strength * weight_factor / source_links.min(target_links);
        if model.same_cluster(source, target) {
            strength *= table.same_cluster_link_factor;
        }

        let delta = frame.predicted[target] - frame.predicted[source];
        let distance = delta.length();
        if distance <= 1e-6 {
            continue;
        }

        let stretch = (distance - table.link_distance) / distance * frame.alpha * strength;
        let correction = delta * stretch;
        let bias = source_links / (source_links + target_links);
        deltas[target] -= correction * bias;
        deltas[source] += correction * (1.0 - bias);
    }
}

fn apply_cluster_gravity(model: &GraphModel, frame: &ForceFrame<'_>, deltas: &mut [Vec2]) {
    let table = frame.table;
    for (index, node) in model.nodes().iter().enumerate() {
        if node.pinned.is_some() {
            continue;
        }
        let strength = if node.anchor.is_some() {
            table.anchor_gravity_strength
        } else {
            table.gravity_strength
        };
        deltas[index] += (frame.targets[index] - frame.positions[index]) * strength * frame.alpha;
    }
}

fn push_apart(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        fallback_direction(from, to)
    };

    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = to_sq / (from_sq + to_sq).max(f32::EPSILON);
    let push = direction * ((reach - distance) * strength);
    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

/// Visits every pair of bodies stored under cells `a` and `b` whose circles
/// may overlap. `a == b` visits the pairs inside one cell once.
fn collide_cells(
    tree: &QuadTree,
    a: usize,
    b: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let (cell_a, cell_b) = (tree.cell(a), tree.cell(b));
    if a != b && cell_a.gap(cell_b) >= cell_a.reach + cell_b.reach {
        return;
    }

    if a == b {
        if cell_a.is_leaf() {
            let bodies = tree.bodies(a);
            for (offset, &from) in bodies.iter().enumerate() {
                for &to in &bodies[offset + 1..] {
                    push_apart(from, to, positions, radii, strength, deltas);
                }
            }
            return;
        }
        let children = cell_a.children.clone();
        for first in children.clone() {
            for second in first..children.end {
                collide_cells(tree, first, second, positions, radii, strength, deltas);
            }
        }
        return;
    }

    match (cell_a.is_leaf(), cell_b.is_leaf()) {
        (true, true) => {
            for &from in tree.bodies(a) {
                for &to in tree.bodies(b) {
                    push_apart(from, to, positions, radii, strength, deltas);
                }
            }
        }
        (false, leaf_b) if leaf_b || cell_a.square.width() >= cell_b.square.width() => {
            for child in cell_a.children.clone() {
                collide_cells(tree, child, b, positions, radii, strength, deltas);
            }
        }
        _ => {
            for child in cell_b.children.clone() {
                collide_cells(tree, a, child, positions, radii, strength, deltas);
            }
        }
    }
}

/// Collision radius of a node: its drawn radius plus padding, capped by the fair-share radius.
pub(super) fn collision_radius(radius: f32, padding: f32, cap: f32) -> f32 {
    (radius + padding).min(cap).max(0.0)
}

fn apply_collision(model: &GraphModel, frame: &ForceFrame<'_>, deltas: &mut [Vec2]) {
    let table = frame.table;
    if table.collision_strength == 0.0 {
        return;
    }

    let radii = model
        .nodes()
        .iter()
        .map(|node| collision_radius(node.radius, table.collision_padding, frame.collision_cap))
        .collect::<Vec<_>>();
    let Some(tree) = QuadTree::build(frame.predicted, |index| radii[index]) else {
        return;
    };
    if tree.cell(QuadTree::ROOT).reach <= 0.0 {
        return;
    }

    collide_cells(
        &tree,
        QuadTree::ROOT,
        QuadTree::ROOT,
        frame.predicted,
        &radii,
        table.collision_strength,
        deltas,
    );
}

fn apply_centering(model: &GraphModel, frame: &ForceFrame<'_>, deltas: &mut [Vec2]) {
    let strength = frame.table.center_strength * frame.alpha;
    if strength == 0.0 || frame.positions.is_empty() {
        return;
    }

    let centroid =
        frame.positions.iter().fold(Vec2::ZERO, |sum, position| sum + *position)
            / frame.positions.len() as f32;
    let shift = (frame.canvas_center - centroid) * strength;
    for (delta, node) in deltas.iter_mut().zip(model.nodes()) {
        if node.pinned.is_none() {
            *delta += shift;
        }
    }
}
