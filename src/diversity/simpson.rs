//! Simpson index of taxon composition within time-series clusters.

use crate::data::{ClusterLabels, Rank, SequenceTable, NOISE_LABEL};
use crate::error::{Result, TsclustError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Simpson index (sum of squared proportions) of a set of category tokens.
///
/// Returns `None` for an empty set. For a non-empty set the value lies in
/// `(0, 1]` and is exactly 1 when every token is the same.
pub fn simpson_index<'a, I>(tokens: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut freq: BTreeMap<&str, usize> = BTreeMap::new();
    for token in tokens {
        *freq.entry(token).or_insert(0) += 1;
    }
    let total: usize = freq.values().sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    Some(
        freq.values()
            .map(|&count| {
                let p = count as f64 / total;
                p * p
            })
            .sum(),
    )
}

/// Simpson index of one cluster at one rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDiversity {
    pub cluster: i64,
    pub simpson: f64,
    /// Members classified at this rank (the ones the index is computed over).
    pub n_classified: usize,
}

/// Per-cluster indices for one rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDiversity {
    pub rank: Rank,
    /// One entry per non-noise cluster with at least one classified member,
    /// in ascending label order.
    pub clusters: Vec<ClusterDiversity>,
}

impl LevelDiversity {
    /// The indices alone, for distribution plots.
    pub fn values(&self) -> Vec<f64> {
        self.clusters.iter().map(|c| c.simpson).collect()
    }
}

/// Diversity at every rank from phylum to species for one epsilon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityReport {
    pub epsilon: f64,
    pub levels: Vec<LevelDiversity>,
}

impl DiversityReport {
    /// `(rank name, indices)` pairs in rank order.
    pub fn by_level_name(&self) -> Vec<(&'static str, Vec<f64>)> {
        self.levels
            .iter()
            .map(|l| (l.rank.name(), l.values()))
            .collect()
    }

    /// Entry for a single rank.
    pub fn level(&self, rank: Rank) -> Option<&LevelDiversity> {
        self.levels.iter().find(|l| l.rank == rank)
    }
}

/// Rank for a one-based diversity level; only 2 (phylum) to 7 (species) are valid.
pub fn diversity_rank(level: usize) -> Result<Rank> {
    let rank = Rank::from_level(level)?;
    if rank == Rank::Kingdom {
        return Err(TsclustError::UnknownRank(
            "diversity is reported from phylum (level 2) to species (level 7)".to_string(),
        ));
    }
    Ok(rank)
}

fn check_aligned(labels: &ClusterLabels, sequences: &SequenceTable) -> Result<()> {
    if labels.len() != sequences.len() {
        return Err(TsclustError::ShapeMismatch {
            array: "cluster labels".to_string(),
            expected: sequences.len(),
            actual: labels.len(),
        });
    }
    Ok(())
}

fn level_diversity(
    rank: Rank,
    groups: &BTreeMap<i64, Vec<usize>>,
    sequences: &SequenceTable,
) -> LevelDiversity {
    let records = sequences.records();
    let clusters = groups
        .iter()
        .filter(|(&label, _)| label != NOISE_LABEL)
        .filter_map(|(&label, members)| {
            let tokens: Vec<&str> = members
                .iter()
                .filter_map(|&i| records[i].taxonomy.at(rank))
                .collect();
            simpson_index(tokens.iter().copied()).map(|simpson| ClusterDiversity {
                cluster: label,
                simpson,
                n_classified: tokens.len(),
            })
        })
        .collect();
    LevelDiversity { rank, clusters }
}

/// Simpson index of every non-noise cluster at one rank.
///
/// Clusters whose members are all unclassified at `rank` are omitted.
pub fn simpson_for_rank(
    rank: Rank,
    labels: &ClusterLabels,
    sequences: &SequenceTable,
) -> Result<LevelDiversity> {
    check_aligned(labels, sequences)?;
    Ok(level_diversity(rank, &labels.groups(), sequences))
}

/// Simpson indices for every rank from phylum to species.
pub fn diversity_by_level(labels: &ClusterLabels, sequences: &SequenceTable) -> Result<DiversityReport> {
    check_aligned(labels, sequences)?;
    let groups = labels.groups();
    let levels = Rank::DIVERSITY_LEVELS
        .par_iter()
        .map(|&rank| level_diversity(rank, &groups, sequences))
        .collect();
    Ok(DiversityReport {
        epsilon: labels.epsilon,
        levels,
    })
}
