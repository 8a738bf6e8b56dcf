//! Node statistics feeding the degree and rank render modes.
//!
//! All ratios are zero-guarded: an empty graph or a graph without edges
//! yields `0.0` rather than a division by zero.

use crate::property::{NodeIndex, RenderingModel};

pub const PAGE_RANK_DAMPING: f32 = 0.85;
pub const PAGE_RANK_ITERATIONS: usize = 50;

/// `value / max` clamped to `[0, 1]`, or `0.0` when `max` is not positive.
pub fn ratio(value: f32, max: f32) -> f32 {
    if max > 0.0 && max.is_finite() && value.is_finite() {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Degree accumulator filled during a pipeline dry run.
#[derive(Debug, Clone, Default)]
pub struct DegreeCounter {
    degrees: Vec<u32>,
    max: u32,
}

impl DegreeCounter {
    pub fn reset(&mut self) {
        self.degrees.clear();
        self.max = 0;
    }

    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex) {
        self.bump(source);
        if target != source {
            self.bump(target);
        }
    }

    fn bump(&mut self, node: NodeIndex) {
        if self.degrees.len() <= node.0 {
            self.degrees.resize(node.0 + 1, 0);
        }
        self.degrees[node.0] += 1;
        self.max = self.max.max(self.degrees[node.0]);
    }

    pub fn degree(&self, node: NodeIndex) -> u32 {
        self.degrees.get(node.0).copied().unwrap_or(0)
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn ratio(&self, node: NodeIndex) -> f32 {
        ratio(self.degree(node) as f32, self.max as f32)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStatistics {
    pub degree: Vec<u32>,
    pub rank: Vec<f32>,
    pub max_degree: u32,
    pub max_rank: f32,
}

impl NodeStatistics {
    /// Degree and rank over the model's visible edges.
    pub fn compute(model: &RenderingModel) -> Self {
        let n = model.node_count();
        let links: Vec<(usize, usize)> = model
            .edges()
            .iter()
            .filter(|e| e.visible)
            .map(|e| (e.source.0, e.target.0))
            .collect();

        let mut degree = vec![0u32; n];
        for &(s, t) in &links {
            degree[s] += 1;
            if s != t {
                degree[t] += 1;
            }
        }
        let rank = page_rank(n, &links, PAGE_RANK_DAMPING, PAGE_RANK_ITERATIONS);

        let max_degree = degree.iter().copied().max().unwrap_or(0);
        let max_rank = rank.iter().copied().fold(0.0f32, f32::max);
        tracing::debug!(nodes = n, edges = links.len(), max_degree, "Computed node statistics");

        Self {
            degree,
            rank,
            max_degree,
            max_rank,
        }
    }

    pub fn degree_ratio(&self, node: NodeIndex) -> f32 {
        let value = self.degree.get(node.0).copied().unwrap_or(0);
        ratio(value as f32, self.max_degree as f32)
    }

    pub fn rank_ratio(&self, node: NodeIndex) -> f32 {
        let value = self.rank.get(node.0).copied().unwrap_or(0.0);
        ratio(value, self.max_rank)
    }

    /// Indices sorted by descending rank, ties by index.
    pub fn top_ranked(&self, limit: usize) -> Vec<NodeIndex> {
        let mut order: Vec<usize> = (0..self.rank.len()).collect();
        order.sort_by(|a, b| {
            self.rank[*b]
                .partial_cmp(&self.rank[*a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(b))
        });
        order.into_iter().take(limit).map(NodeIndex).collect()
    }
}

/// PageRank over directed `(source, target)` links.
///
/// Rank held by nodes without outgoing links is spread evenly over all nodes.
pub fn page_rank(
    node_count: usize,
    links: &[(usize, usize)],
    damping: f32,
    iterations: usize,
) -> Vec<f32> {
    if node_count == 0 {
        return Vec::new();
    }
    let n = node_count as f32;
    let mut out_degree = vec![0u32; node_count];
    for &(s, _) in links {
        out_degree[s] += 1;
    }

    let mut rank = vec![1.0 / n; node_count];
    let mut next = vec![0.0f32; node_count];
    for _ in 0..iterations {
        let dangling: f32 = rank
            .iter()
            .zip(&out_degree)
            .filter(|(_, d)| **d == 0)
            .map(|(r, _)| *r)
            .sum();
        let base = (1.0 - damping) / n + damping * dangling / n;
        next.iter_mut().for_each(|v| *v = base);
        for &(s, t) in links {
            next[t] += damping * rank[s] / out_degree[s] as f32;
        }
        std::mem::swap(&mut rank, &mut next);
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_is_zero_safe() {
        assert_eq!(ratio(3.0, 0.0), 0.0);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(f32::NAN, 2.0), 0.0);
        assert_eq!(ratio(1.0, 2.0), 0.5);
        assert_eq!(ratio(5.0, 2.0), 1.0);
    }

    #[test]
    fn test_degree_counter() {
        let mut counter = DegreeCounter::default();
        assert_eq!(counter.ratio(NodeIndex(4)), 0.0);
        counter.add_edge(NodeIndex(0), NodeIndex(1));
        counter.add_edge(NodeIndex(0), NodeIndex(2));
        counter.add_edge(NodeIndex(3), NodeIndex(3));
        assert_eq!(counter.degree(NodeIndex(0)), 2);
        assert_eq!(counter.degree(NodeIndex(3)), 1);
        assert_eq!(counter.max(), 2);
        assert_eq!(counter.ratio(NodeIndex(1)), 0.5);
        counter.reset();
        assert_eq!(counter.max(), 0);
        assert_eq!(counter.degree(NodeIndex(0)), 0);
    }

    #[test]
    fn test_page_rank_sums_to_one() {
        let links = [(0, 1), (1, 2), (2, 0), (3, 2)];
        let rank = page_rank(4, &links, PAGE_RANK_DAMPING, PAGE_RANK_ITERATIONS);
        let total: f32 = rank.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        // node 2 receives from two sources
        assert!(rank[2] > rank[1]);
        assert!(rank[3] < rank[0]);
    }

    #[test]
    fn test_page_rank_without_links_is_uniform() {
        let rank = page_rank(4, &[], PAGE_RANK_DAMPING, 10);
        for r in rank {
            assert!((r - 0.25).abs() < 1e-6);
        }
        assert!(page_rank(0, &[], PAGE_RANK_DAMPING, 10).is_empty());
    }
}
