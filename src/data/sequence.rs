//! Per-sequence metadata: identifiers, taxonomy and stable cluster labels.

use crate::error::{Result, TsclustError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delimiter between ranks in a taxonomy string.
pub const TAXONOMY_DELIMITER: char = ';';

/// The seven ranks of a taxonomy string, rooted at kingdom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// All ranks from kingdom to species.
    pub const ALL: [Rank; 7] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Ranks below kingdom, the ones diversity is reported for.
    pub const DIVERSITY_LEVELS: [Rank; 6] = [
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// One-based level (kingdom = 1, species = 7).
    pub fn level(&self) -> usize {
        self.index() + 1
    }

    /// Zero-based token position inside a taxonomy string.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Rank at a one-based level.
    pub fn from_level(level: usize) -> Result<Self> {
        level
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| TsclustError::UnknownRank(format!("level {}", level)))
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Kingdom => "Kingdom",
            Rank::Phylum => "Phylum",
            Rank::Class => "Class",
            Rank::Order => "Order",
            Rank::Family => "Family",
            Rank::Genus => "Genus",
            Rank::Species => "Species",
        }
    }

    /// Token prefix, which on its own marks the rank as unclassified.
    pub fn code(&self) -> &'static str {
        match self {
            Rank::Kingdom => "k__",
            Rank::Phylum => "p__",
            Rank::Class => "c__",
            Rank::Order => "o__",
            Rank::Family => "f__",
            Rank::Genus => "g__",
            Rank::Species => "s__",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rank {
    type Err = TsclustError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<usize>() {
            return Self::from_level(level);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|r| {
                r.name().eq_ignore_ascii_case(trimmed)
                    || r.code().trim_end_matches('_').eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| TsclustError::UnknownRank(s.to_string()))
    }
}

/// A taxonomy string split once into its seven rank tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    raw: String,
    ranks: [Option<String>; 7],
}

impl Taxonomy {
    /// Parse a semicolon-delimited taxonomy.
    ///
    /// Tokens are trimmed. A rank is unclassified when its token is missing,
    /// empty, or equal to the bare rank code (`"g__"`).
    pub fn parse(raw: &str) -> Self {
        let mut ranks: [Option<String>; 7] = Default::default();
        for (slot, token) in ranks.iter_mut().zip(raw.split(TAXONOMY_DELIMITER)) {
            *slot = Some(token.trim().to_string());
        }
        for rank in Rank::ALL {
            let slot = &mut ranks[rank.index()];
            if matches!(slot.as_deref(), Some(t) if t.is_empty() || t == rank.code()) {
                *slot = None;
            }
        }
        Self {
            raw: raw.to_string(),
            ranks,
        }
    }

    /// The original string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Token at a rank, `None` when unclassified.
    pub fn at(&self, rank: Rank) -> Option<&str> {
        self.ranks[rank.index()].as_deref()
    }

    /// Deepest classified rank.
    pub fn deepest(&self) -> Option<Rank> {
        Rank::ALL.iter().rev().copied().find(|&r| self.at(r).is_some())
    }
}

/// Stable epsilon-independent label used for unclustered sequences.
pub const UNCLUSTERED: i64 = -1;

/// Everything known about one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Sequence identifier.
    pub id: String,
    /// Parsed taxonomy.
    pub taxonomy: Taxonomy,
    /// Stable phylogenetic (OTU) cluster label, [`UNCLUSTERED`] if none.
    pub phylo_cluster: i64,
}

/// Index-aligned per-sequence metadata.
///
/// Position `k` describes the same sequence as row `k` of the abundance
/// matrix and entry `k` of every cluster-label vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceTable {
    records: Vec<SequenceRecord>,
}

impl SequenceTable {
    /// Bundle parallel arrays into records, rejecting length mismatches.
    pub fn from_columns(ids: Vec<String>, taxonomy: Vec<String>, phylo_clusters: Vec<i64>) -> Result<Self> {
        let n = ids.len();
        if taxonomy.len() != n {
            return Err(TsclustError::ShapeMismatch {
                array: "taxonomy".to_string(),
                expected: n,
                actual: taxonomy.len(),
            });
        }
        if phylo_clusters.len() != n {
            return Err(TsclustError::ShapeMismatch {
                array: "sequenceclusters".to_string(),
                expected: n,
                actual: phylo_clusters.len(),
            });
        }

        let records = ids
            .into_iter()
            .zip(taxonomy)
            .zip(phylo_clusters)
            .map(|((id, tax), phylo_cluster)| SequenceRecord {
                id,
                taxonomy: Taxonomy::parse(&tax),
                phylo_cluster,
            })
            .collect();
        Ok(Self { records })
    }

    /// Number of sequences.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at a position.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&SequenceRecord> {
        self.records.get(index)
    }

    /// All records in sequence order.
    #[inline]
    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequenceRecord> {
        self.records.iter()
    }

    /// Token of every sequence at one rank.
    pub fn rank_column(&self, rank: Rank) -> Vec<Option<&str>> {
        self.records.iter().map(|r| r.taxonomy.at(rank)).collect()
    }

    /// Position of a sequence identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_levels() {
        assert_eq!(Rank::Kingdom.level(), 1);
        assert_eq!(Rank::Species.level(), 7);
        assert_eq!(Rank::from_level(2).unwrap(), Rank::Phylum);
        assert!(Rank::from_level(0).is_err());
        assert!(Rank::from_level(8).is_err());
    }

    #[test]
    fn test_rank_parsing() {
        assert_eq!("genus".parse::<Rank>().unwrap(), Rank::Genus);
        assert_eq!("Family".parse::<Rank>().unwrap(), Rank::Family);
        assert_eq!("3".parse::<Rank>().unwrap(), Rank::Class);
        assert_eq!("o".parse::<Rank>().unwrap(), Rank::Order);
        assert!(matches!("strain".parse::<Rank>(), Err(TsclustError::UnknownRank(_))));
    }

    #[test]
    fn test_taxonomy_parse() {
        let tax = Taxonomy::parse(
            "k__Bacteria; p__Firmicutes; c__Bacilli; o__; f__; g__Bacillus; s__",
        );
        assert_eq!(tax.at(Rank::Kingdom), Some("k__Bacteria"));
        assert_eq!(tax.at(Rank::Phylum), Some("p__Firmicutes"));
        assert_eq!(tax.at(Rank::Order), None);
        assert_eq!(tax.at(Rank::Genus), Some("g__Bacillus"));
        assert_eq!(tax.at(Rank::Species), None);
        assert_eq!(tax.deepest(), Some(Rank::Genus));
    }

    #[test]
    fn test_short_taxonomy() {
        let tax = Taxonomy::parse("k__Archaea;p__Euryarchaeota");
        assert_eq!(tax.at(Rank::Phylum), Some("p__Euryarchaeota"));
        assert_eq!(tax.at(Rank::Class), None);
        assert_eq!(Taxonomy::parse("").deepest(), None);
    }

    #[test]
    fn test_table_alignment() {
        let table = SequenceTable::from_columns(
            vec!["s1".into(), "s2".into()],
            vec!["k__A;p__B".into(), "k__A;p__".into()],
            vec![4, UNCLUSTERED],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().phylo_cluster, -1);
        assert_eq!(table.rank_column(Rank::Phylum), vec![Some("p__B"), None]);
        assert_eq!(table.position("s2"), Some(1));
    }

    #[test]
    fn test_table_length_mismatch() {
        let result = SequenceTable::from_columns(
            vec!["s1".into(), "s2".into()],
            vec!["k__A".into()],
            vec![0, 0],
        );
        assert!(matches!(
            result,
            Err(TsclustError::ShapeMismatch { ref array, .. }) if array == "taxonomy"
        ));
    }
}
