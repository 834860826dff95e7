use std::ops::Range;

use eframe::egui::{Rect, Vec2, pos2, vec2};

const LEAF_BODIES: usize = 8;
const MAX_DEPTH: u8 = 12;

/// A square of the tree with the aggregates the forces read.
#[derive(Clone, Debug)]
pub(super) struct Cell {
    pub(super) square: Rect,
    pub(super) centroid: Vec2,
    pub(super) count: usize,
    /// Largest body radius below this cell, zero when radii are not tracked.
    pub(super) reach: f32,
    pub(super) children: Range<usize>,
    bodies: Range<usize>,
}

impl Cell {
    fn empty(square: Rect) -> Self {
        Self {
            square,
            centroid: square.center().to_vec2(),
            count: 0,
            reach: 0.0,
            children: 0..0,
            bodies: 0..0,
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(super) fn contains(&self, point: Vec2) -> bool {
        self.square.contains(point.to_pos2())
    }

    /// Shortest distance between the two squares, zero when they touch.
    pub(super) fn gap(&self, other: &Self) -> f32 {
        let (a, b) = (self.square, other.square);
        let dx = (a.min.x - b.max.x).max(b.min.x - a.max.x).max(0.0);
        let dy = (a.min.y - b.max.y).max(b.min.y - a.max.y).max(0.0);
        vec2(dx, dy).length()
    }
}

/// Arena quadtree over node positions. Cell 0 is the root; the children of a
/// cell are stored next to each other.
pub(super) struct QuadTree {
    cells: Vec<Cell>,
    order: Vec<usize>,
}

impl QuadTree {
    pub(super) const ROOT: usize = 0;

    /// Builds the tree, recording `radius(index)` as each body's reach.
    /// Returns `None` for empty or non-finite input.
    pub(super) fn build(positions: &[Vec2], radius: impl Fn(usize) -> f32) -> Option<Self> {
        let square = bounding_square(positions)?;
        let mut tree = Self {
            cells: vec![Cell::empty(square)],
            order: (0..positions.len()).collect(),
        };
        tree.fill(Self::ROOT, 0..positions.len(), positions, &radius, 0);
        Some(tree)
    }

    pub(super) fn cell(&self, cell: usize) -> &Cell {
        &self.cells[cell]
    }

    /// Node indices stored under `cell`.
    pub(super) fn bodies(&self, cell: usize) -> &[usize] {
        &self.order[self.cells[cell].bodies.clone()]
    }

    fn fill(
        &mut self,
        cell: usize,
        bodies: Range<usize>,
        positions: &[Vec2],
        radius: &impl Fn(usize) -> f32,
        depth: u8,
    ) {
        let members = &self.order[bodies.clone()];
        let sum = members.iter().fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        let reach = members.iter().map(|&index| radius(index)).fold(0.0_f32, f32::max);
        let count = members.len();

        let square = self.cells[cell].square;
        self.cells[cell] = Cell {
            square,
            centroid: sum / count.max(1) as f32,
            count,
            reach,
            children: 0..0,
            bodies: bodies.clone(),
        };
        if count <= LEAF_BODIES || depth >= MAX_DEPTH {
            return;
        }

        let center = square.center().to_vec2();
        self.order[bodies.clone()].sort_by_key(|&index| quadrant(center, positions[index]));

        let mut runs = Vec::with_capacity(4);
        let mut start = bodies.start;
        while start < bodies.end {
            let current = quadrant(center, positions[self.order[start]]);
            let end = (start..bodies.end)
                .find(|&at| quadrant(center, positions[self.order[at]]) != current)
                .unwrap_or(bodies.end);
            runs.push((current, start..end));
            start = end;
        }
        // Coincident bodies cannot be separated by splitting.
        if runs.len() <= 1 {
            return;
        }

        let first = self.cells.len();
        self.cells
            .extend(runs.iter().map(|(quadrant, _)| Cell::empty(child_square(square, *quadrant))));
        self.cells[cell].children = first..first + runs.len();
        for (offset, (_, run)) in runs.into_iter().enumerate() {
            self.fill(first + offset, run, positions, radius, depth + 1);
        }
    }
}

fn quadrant(center: Vec2, point: Vec2) -> usize {
    usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
}

fn child_square(square: Rect, quadrant: usize) -> Rect {
    let center = square.center();
    let min = pos2(
        if quadrant & 1 == 0 { square.min.x } else { center.x },
        if quadrant & 2 == 0 { square.min.y } else { center.y },
    );
    Rect::from_min_size(min, square.size() * 0.5)
}

fn bounding_square(points: &[Vec2]) -> Option<Rect> {
    if !points.iter().all(|point| point.is_finite()) {
        return None;
    }
    let first = points.first()?.to_pos2();
    let mut bounds = Rect::from_min_max(first, first);
    for point in points {
        bounds.extend_with(point.to_pos2());
    }

    let side = bounds.width().max(bounds.height()).max(1.0) + 2.0;
    Some(Rect::from_center_size(bounds.center(), Vec2::splat(side)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 7) as f32 * 10.0, (index / 7) as f32 * 10.0))
            .collect()
    }

    #[test]
    fn children_partition_the_parent() {
        let positions = grid(40);
        let tree = QuadTree::build(&positions, |_| 0.0).expect("finite points");
        let root = tree.cell(QuadTree::ROOT);

        assert_eq!(root.count, 40);
        assert!(!root.is_leaf());
        let child_count = root.children.clone().map(|child| tree.cell(child).count).sum::<usize>();
        assert_eq!(child_count, 40);
        for child in root.children.clone() {
            for &index in tree.bodies(child) {
                assert!(tree.cell(child).contains(positions[index]));
            }
        }
        for position in &positions {
            assert!(root.contains(*position));
        }
    }

    #[test]
    fn reach_is_the_largest_radius_below() {
        let positions = grid(30);
        let tree = QuadTree::build(&positions, |index| if index == 17 { 9.0 } else { 2.0 })
            .expect("finite points");

        assert_eq!(tree.cell(QuadTree::ROOT).reach, 9.0);
        let holder = tree
            .cell(QuadTree::ROOT)
            .children
            .clone()
            .find(|&child| tree.bodies(child).contains(&17))
            .expect("17 is stored");
        assert_eq!(tree.cell(holder).reach, 9.0);
        assert!(
            tree.cell(QuadTree::ROOT)
                .children
                .clone()
                .filter(|&child| child != holder)
                .all(|child| tree.cell(child).reach == 2.0)
        );
    }

    #[test]
    fn non_finite_or_empty_input_does_not_build() {
        assert!(QuadTree::build(&[vec2(f32::NAN, 0.0)], |_| 0.0).is_none());
        assert!(QuadTree::build(&[vec2(1.0, 2.0), vec2(3.0, f32::INFINITY)], |_| 0.0).is_none());
        assert!(QuadTree::build(&[], |_| 0.0).is_none());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 20];
        let tree = QuadTree::build(&positions, |_| 0.0).expect("finite points");
        assert!(tree.cell(QuadTree::ROOT).is_leaf());
        assert_eq!(tree.bodies(QuadTree::ROOT).len(), 20);
        assert_eq!(tree.cell(QuadTree::ROOT).centroid, vec2(5.0, 5.0));
    }

    #[test]
    fn gap_is_zero_for_touching_cells() {
        let tree = QuadTree::build(&grid(40), |_| 0.0).expect("finite points");
        let children = tree.cell(QuadTree::ROOT).children.clone().collect::<Vec<_>>();
        assert_eq!(tree.cell(children[0]).gap(tree.cell(children[1])), 0.0);
    }
}
