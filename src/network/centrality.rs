//! Weighted centrality and cohesion measures over adjacency lists.
//!
//! Adjacency lists are indexed by node; each entry is `(neighbor, weight)`
//! with weights in (0, 1]. All functions are deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Error, Result, Stage};

/// PageRank damping factor.
pub const DAMPING: f64 = 0.85;
/// Per-node convergence tolerance.
pub const TOLERANCE: f64 = 1e-6;
/// Power-iteration cap.
pub const MAX_ITER: usize = 100;

const PATH_EPS: f64 = 1e-12;

/// Weighted PageRank.
///
/// Each undirected edge is walked in both directions; a node's outgoing
/// probability is proportional to edge weight. Isolated nodes redistribute
/// their rank uniformly. A graph without edges scores every node 0.
///
/// # Errors
///
/// [`Error::AlgorithmFailure`] if power iteration does not converge within
/// [`MAX_ITER`] iterations.
pub fn pagerank(adj: &[Vec<(usize, f64)>]) -> Result<Vec<f64>> {
    let n = adj.len();
    if n == 0 || adj.iter().all(Vec::is_empty) {
        return Ok(vec![0.0; n]);
    }

    let out_weight: Vec<f64> = adj
        .iter()
        .map(|nbrs| nbrs.iter().map(|&(_, w)| w).sum())
        .collect();
    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for _ in 0..MAX_ITER {
        let dangling: f64 = (0..n)
            .filter(|&i| out_weight[i] <= 0.0)
            .map(|i| rank[i])
            .sum();
        let base = DAMPING * dangling * uniform + (1.0 - DAMPING) * uniform;
        let mut next = vec![base; n];

        for (i, nbrs) in adj.iter().enumerate() {
            if out_weight[i] <= 0.0 {
                continue;
            }
            let share = DAMPING * rank[i] / out_weight[i];
            for &(j, w) in nbrs {
                next[j] += share * w;
            }
        }

        let err: f64 = next.iter().zip(rank.iter()).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if err < n as f64 * TOLERANCE {
            return Ok(rank);
        }
    }

    Err(Error::algorithm_failure(
        Stage::Analyze,
        format!("pagerank did not converge after {MAX_ITER} iterations"),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    dist: f64,
    node: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance, then node index
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Normalized betweenness centrality (Brandes, 2001).
///
/// Path length along an edge is `1 / weight`, so strong co-occurrence is a
/// short hop. Scores are scaled by `1 / ((n-1)(n-2))`, which for an
/// undirected graph maps to [0, 1].
pub fn betweenness(adj: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let n = adj.len();
    let mut centrality = vec![0.0; n];
    if adj.iter().all(Vec::is_empty) {
        return centrality;
    }

    for s in 0..n {
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![f64::INFINITY; n];
        let mut settled = vec![false; n];

        sigma[s] = 1.0;
        dist[s] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { dist: 0.0, node: s });

        while let Some(Frontier { dist: d, node: v }) = heap.pop() {
            if settled[v] || d > dist[v] + PATH_EPS {
                continue;
            }
            settled[v] = true;
            order.push(v);

            for &(w, weight) in &adj[v] {
                if settled[w] {
                    continue;
                }
                let alt = d + 1.0 / weight;
                if alt < dist[w] - PATH_EPS {
                    dist[w] = alt;
                    sigma[w] = sigma[v];
                    preds[w].clear();
                    preds[w].push(v);
                    heap.push(Frontier { dist: alt, node: w });
                } else if (alt - dist[w]).abs() <= PATH_EPS {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = order.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for c in &mut centrality {
            *c *= scale;
        }
    }
    centrality
}

/// Weighted clustering coefficient of every node.
///
/// With weights scaled by the graph's maximum weight (ŵ), node u of degree
/// k scores
///
/// ```text
/// c_u = 2 / (k(k-1)) · Σ_{v<w ∈ N(u)} (ŵ_uv ŵ_uw ŵ_vw)^(1/3)
/// ```
///
/// Nodes with degree below 2 score 0.
pub fn clustering(adj: &[Vec<(usize, f64)>]) -> Vec<f64> {
    let max_w = adj
        .iter()
        .flatten()
        .map(|&(_, w)| w)
        .fold(0.0, f64::max);
    if max_w <= 0.0 {
        return vec![0.0; adj.len()];
    }

    let weight = |a: usize, b: usize| -> Option<f64> {
        adj[a]
            .binary_search_by_key(&b, |&(j, _)| j)
            .ok()
            .map(|pos| adj[a][pos].1 / max_w)
    };

    adj.iter()
        .enumerate()
        .map(|(u, nbrs)| {
            let nbrs: Vec<(usize, f64)> = nbrs.iter().copied().filter(|&(v, _)| v != u).collect();
            let k = nbrs.len();
            if k < 2 {
                return 0.0;
            }
            let mut triangles = 0.0;
            for (x, &(v, w_uv)) in nbrs.iter().enumerate() {
                for &(w, w_uw) in &nbrs[x + 1..] {
                    if let Some(w_vw) = weight(v, w) {
                        triangles += ((w_uv / max_w) * (w_uw / max_w) * w_vw).cbrt();
                    }
                }
            }
            2.0 * triangles / (k * (k - 1)) as f64
        })
        .collect()
}

/// Mean of [`clustering`] over all nodes, 0 for an empty graph.
pub fn average_clustering(adj: &[Vec<(usize, f64)>]) -> f64 {
    if adj.is_empty() {
        return 0.0;
    }
    clustering(adj).iter().sum::<f64>() / adj.len() as f64
}

/// Edges present over edges possible; 0 with fewer than two nodes.
pub fn density(n_nodes: usize, n_edges: usize) -> f64 {
    if n_nodes < 2 {
        return 0.0;
    }
    2.0 * n_edges as f64 / (n_nodes * (n_nodes - 1)) as f64
}
