use std::collections::HashSet;

use super::Link;

/// Undirected adjacency derived from the link list.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyIndex {
    pairs: HashSet<(usize, usize)>,
    neighbors: Vec<Vec<usize>>,
    link_counts: Vec<usize>,
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl AdjacencyIndex {
    pub fn rebuild(node_count: usize, links: &[Link]) -> Self {
        let mut pairs = HashSet::with_capacity(links.len());
        let mut neighbors = vec![Vec::new(); node_count];
        let mut link_counts = vec![0usize; node_count];

        for link in links {
            if link.source >= node_count || link.target >= node_count {
                continue;
            }
            link_counts[link.source] += 1;
            link_counts[link.target] += 1;

            if pairs.insert(ordered(link.source, link.target)) {
                neighbors[link.source].push(link.target);
                if link.source != link.target {
                    neighbors[link.target].push(link.source);
                }
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
        }

        Self {
            pairs,
            neighbors,
            link_counts,
        }
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&ordered(a, b))
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of link endpoints attached to the node, duplicates included.
    pub fn link_count(&self, index: usize) -> usize {
        self.link_counts.get(index).copied().unwrap_or(0)
    }
}
