//! Skill co-occurrence network and its graph-theoretic insights.
//!
//! - **Hub skills**: highest weighted PageRank, skills many strong ties point to.
//! - **Bridge skills**: highest betweenness, skills on the shortest routes
//!   between otherwise separate parts of the graph.
//! - **Skill families**: greedy-modularity communities.
//! - **Density** and **average clustering** summarize how interlocked the
//!   skill base is.

pub mod centrality;
mod graph;

use serde::Serialize;
use tracing::debug;

pub use graph::{
    build_skill_graph, cooccurrence_similarity, SkillEdge, SkillGraph, DEFAULT_THRESHOLD,
};

use crate::community::{CommunityDetection, GreedyModularity};
use crate::error::Result;

/// A skill with a centrality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSkill {
    /// Skill name.
    pub skill: String,
    /// Centrality score.
    pub score: f64,
}

/// Graph-level findings for the skill network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInsights {
    /// Top skills by PageRank, highest first.
    pub hub_skills: Vec<RankedSkill>,
    /// Top skills by betweenness, highest first.
    pub bridge_skills: Vec<RankedSkill>,
    /// Communities, largest first; members in column order.
    pub skill_families: Vec<Vec<String>>,
    /// Edges present over edges possible.
    pub network_density: f64,
    /// Mean weighted clustering coefficient.
    pub avg_clustering_coefficient: f64,
}

/// Compute centrality rankings, families and cohesion for a skill graph.
///
/// A graph without edges is not an error: all scores are 0, density is 0 and
/// every skill is its own family.
pub fn analyze(graph: &SkillGraph, top_n: usize) -> Result<NetworkInsights> {
    let names: Vec<String> = graph.skill_names().map(str::to_owned).collect();
    let adj = graph.adjacency();

    let pagerank = centrality::pagerank(&adj)?;
    let betweenness = centrality::betweenness(&adj);

    let labels = GreedyModularity::new().detect(graph.graph())?;
    let n_families = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut skill_families: Vec<Vec<String>> = vec![Vec::new(); n_families];
    for (node, &family) in labels.iter().enumerate() {
        skill_families[family].push(names[node].clone());
    }

    let insights = NetworkInsights {
        hub_skills: top_ranked(&names, &pagerank, top_n),
        bridge_skills: top_ranked(&names, &betweenness, top_n),
        skill_families,
        network_density: centrality::density(graph.node_count(), graph.edge_count()),
        avg_clustering_coefficient: centrality::average_clustering(&adj),
    };

    debug!(
        families = insights.skill_families.len(),
        density = insights.network_density,
        "skill network analyzed"
    );
    Ok(insights)
}

/// Highest scores first; equal scores keep column order.
fn top_ranked(names: &[String], scores: &[f64], top_n: usize) -> Vec<RankedSkill> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
        .into_iter()
        .take(top_n)
        .map(|i| RankedSkill {
            skill: names[i].clone(),
            score: scores[i],
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::matrix::SkillMatrix;

    fn matrix(rows: Vec<Vec<u8>>, skills: &[&str]) -> SkillMatrix {
        let ids = (0..rows.len()).map(|i| format!("e{i}")).collect();
        SkillMatrix::new(ids, skills.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_analyze_two_families() {
        let m = matrix(
            vec![
                vec![1, 1, 0, 0],
                vec![1, 1, 0, 0],
                vec![1, 1, 0, 0],
                vec![0, 0, 1, 1],
                vec![0, 0, 1, 1],
                vec![0, 0, 1, 1],
            ],
            &["a", "b", "c", "d"],
        );
        let g = SkillGraph::build(&m, 0.3).unwrap();
        let insights = analyze(&g, 10).unwrap();

        assert_eq!(insights.hub_skills.len(), 4);
        assert_eq!(
            insights.skill_families,
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string(), "d".to_string()]]
        );
        assert!((insights.network_density - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(insights.avg_clustering_coefficient, 0.0);
    }

    #[test]
    fn test_analyze_edgeless_graph() {
        let m = matrix(vec![vec![1, 0, 0], vec![0, 1, 0]], &["a", "b", "c"]);
        let g = SkillGraph::build(&m, 0.3).unwrap();
        assert_eq!(g.edge_count(), 0);

        let insights = analyze(&g, 10).unwrap();
        assert!(insights.hub_skills.iter().all(|r| r.score == 0.0));
        assert!(insights.bridge_skills.iter().all(|r| r.score == 0.0));
        assert_eq!(insights.network_density, 0.0);
        assert_eq!(insights.skill_families.len(), 3);
        assert!(insights.skill_families.iter().all(|f| f.len() == 1));
    }

    #[test]
    fn test_top_ranked_truncates_and_orders() {
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let ranked = top_ranked(&names, &[0.1, 0.5, 0.1], 2);
        assert_eq!(ranked[0].skill, "b");
        assert_eq!(ranked[1].skill, "a");
        assert_eq!(ranked.len(), 2);
    }
}
