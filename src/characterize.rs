//! Per-cluster skill profiles.
//!
//! Prevalence is read from the raw 0/1 matrix so it stays interpretable:
//! the prevalence of skill s in cluster C is the fraction of C's members who
//! hold s.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::cluster::{ClusterLabeling, NOISE};
use crate::error::{Error, Result};
use crate::matrix::SkillMatrix;

/// Prevalence above which a skill defines its cluster.
pub const DEFINING_THRESHOLD: f64 = 0.5;
/// Maximum defining skills reported per cluster.
pub const MAX_DEFINING_SKILLS: usize = 5;
/// Maximum prevalence entries reported per cluster.
pub const MAX_PREVALENCE_ENTRIES: usize = 10;

/// Profile of a single cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterCharacteristics {
    /// Member count.
    pub size: usize,
    /// Up to five skills with prevalence > 0.5, most prevalent first.
    pub defining_skills: Vec<String>,
    /// Skill to prevalence for the top ten skills, most prevalent first.
    pub skill_prevalence: IndexMap<String, f64>,
    /// Mean number of skills per member.
    pub avg_skills_per_employee: f64,
}

/// Profile every non-noise cluster, keyed by cluster id.
///
/// Ties in prevalence keep skill column order.
pub fn characterize(
    matrix: &SkillMatrix,
    labeling: &ClusterLabeling,
) -> Result<BTreeMap<i32, ClusterCharacteristics>> {
    if labeling.len() != matrix.n_employees() {
        return Err(Error::input_shape(
            format!("{} labels", matrix.n_employees()),
            format!("{} labels", labeling.len()),
        ));
    }

    let row_sums = matrix.row_sums();
    let mut out = BTreeMap::new();

    for cluster in labeling.cluster_ids() {
        debug_assert_ne!(cluster, NOISE);
        let members = labeling.members(cluster);
        let size = members.len();

        let mut ranked: Vec<(&String, f64)> = matrix
            .skill_names()
            .iter()
            .enumerate()
            .map(|(col, skill)| {
                let holders = members.iter().filter(|&&r| matrix.has_skill(r, col)).count();
                (skill, holders as f64 / size as f64)
            })
            .collect();
        // stable: equal prevalence keeps column order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let defining_skills = ranked
            .iter()
            .filter(|&&(_, prevalence)| prevalence > DEFINING_THRESHOLD)
            .take(MAX_DEFINING_SKILLS)
            .map(|&(skill, _)| skill.clone())
            .collect();

        let avg_skills_per_employee =
            members.iter().map(|&r| row_sums[r] as f64).sum::<f64>() / size as f64;

        let skill_prevalence = ranked
            .into_iter()
            .take(MAX_PREVALENCE_ENTRIES)
            .map(|(skill, prevalence)| (skill.clone(), prevalence))
            .collect();

        let _ = out.insert(
            cluster,
            ClusterCharacteristics {
                size,
                defining_skills,
                skill_prevalence,
                avg_skills_per_employee,
            },
        );
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: Vec<Vec<u8>>, skills: &[&str]) -> SkillMatrix {
        let ids = (0..rows.len()).map(|i| format!("e{i}")).collect();
        SkillMatrix::new(ids, skills.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_characterize_two_groups() {
        let m = matrix(
            vec![
                vec![1, 1, 0, 0],
                vec![1, 1, 0, 0],
                vec![1, 0, 0, 1],
                vec![0, 0, 1, 1],
                vec![0, 0, 1, 1],
            ],
            &["a", "b", "c", "d"],
        );
        let labeling = ClusterLabeling::new(vec![0, 0, 0, 1, NOISE]);
        let chars = characterize(&m, &labeling).unwrap();

        assert_eq!(chars.len(), 2);
        let c0 = &chars[&0];
        assert_eq!(c0.size, 3);
        assert_eq!(c0.defining_skills, vec!["a", "b"]);
        assert_relative_eq!(c0.skill_prevalence["a"], 1.0);
        assert_relative_eq!(c0.skill_prevalence["b"], 2.0 / 3.0);
        assert_relative_eq!(c0.skill_prevalence["c"], 0.0);
        assert_relative_eq!(c0.avg_skills_per_employee, 2.0);

        let c1 = &chars[&1];
        assert_eq!(c1.size, 1);
        assert_eq!(c1.defining_skills, vec!["c", "d"]);
    }

    #[test]
    fn test_characterize_truncates() {
        let skills: Vec<String> = (0..12).map(|i| format!("s{i:02}")).collect();
        let names: Vec<&str> = skills.iter().map(String::as_str).collect();
        let m = matrix(vec![vec![1; 12], vec![1; 12]], &names);
        let chars = characterize(&m, &ClusterLabeling::all_zero(2)).unwrap();

        let c = &chars[&0];
        assert_eq!(c.defining_skills.len(), MAX_DEFINING_SKILLS);
        assert_eq!(c.defining_skills[0], "s00");
        assert_eq!(c.skill_prevalence.len(), MAX_PREVALENCE_ENTRIES);
        assert_relative_eq!(c.avg_skills_per_employee, 12.0);
    }

    #[test]
    fn test_half_prevalence_is_not_defining() {
        let m = matrix(vec![vec![1, 1], vec![0, 1]], &["a", "b"]);
        let chars = characterize(&m, &ClusterLabeling::all_zero(2)).unwrap();
        assert_eq!(chars[&0].defining_skills, vec!["b"]);
    }

    #[test]
    fn test_all_noise_has_no_clusters() {
        let m = matrix(vec![vec![1], vec![0]], &["a"]);
        let chars = characterize(&m, &ClusterLabeling::new(vec![NOISE, NOISE])).unwrap();
        assert!(chars.is_empty());
    }

    #[test]
    fn test_prevalence_serializes_as_ranked_object() {
        // column order a, b, c; prevalence order c, a, b
        let m = matrix(
            vec![vec![0, 0, 1], vec![1, 0, 1], vec![1, 1, 1], vec![0, 0, 1]],
            &["a", "b", "c"],
        );
        let chars = characterize(&m, &ClusterLabeling::all_zero(4)).unwrap();

        let json = serde_json::to_value(&chars).unwrap();
        let prevalence = &json["0"]["skill_prevalence"];
        assert!(prevalence.is_object());
        assert_eq!(prevalence["c"], 1.0);
        assert_eq!(prevalence["a"], 0.5);

        let text = serde_json::to_string(&chars[&0].skill_prevalence).unwrap();
        assert_eq!(text, r#"{"c":1.0,"a":0.5,"b":0.25}"#);
    }
}
