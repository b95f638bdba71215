//! Synthetic clustering databases for testing and demonstration.
//!
//! Generates a complete database with a known structure: sequences belong to
//! ground-truth groups that share a seasonal abundance profile, a stable
//! phylogenetic cluster and a taxonomy lineage. Time-series clusters merge
//! pairwise as epsilon grows, and a shrinking fraction of sequences is noise.

use crate::config::DatasetLayout;
use crate::data::NOISE_LABEL;
use crate::error::{Result, TsclustError};
use crate::store::MemoryStore;
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration for synthetic database generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Number of sequences (rows).
    pub n_sequences: usize,
    /// Number of samples (columns).
    pub n_samples: usize,
    /// Number of ground-truth groups.
    pub n_groups: usize,
    /// Proportion of zero entries (0.0-1.0).
    pub sparsity: f64,
    /// Mean abundance of a non-zero entry.
    pub mean_abundance: f64,
    /// Days between consecutive samples.
    pub sample_interval: f64,
    /// Proportion of sequences labelled noise at the smallest epsilon.
    pub noise_fraction: f64,
    /// Smallest epsilon of the sweep.
    pub epsilon_min: f64,
    /// Epsilon increment between label rows.
    pub epsilon_step: f64,
    /// Number of epsilon values.
    pub n_steps: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_sequences: 500,
            n_samples: 60,
            n_groups: 16,
            sparsity: 0.5,
            mean_abundance: 200.0,
            sample_interval: 7.0,
            noise_fraction: 0.2,
            epsilon_min: 0.01,
            epsilon_step: 0.01,
            n_steps: 20,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// A small database suitable for unit tests.
    pub fn small() -> Self {
        Self {
            n_sequences: 24,
            n_samples: 10,
            n_groups: 6,
            sparsity: 0.3,
            mean_abundance: 50.0,
            sample_interval: 1.0,
            noise_fraction: 0.25,
            epsilon_min: 0.1,
            epsilon_step: 0.1,
            n_steps: 4,
            seed: 7,
        }
    }

    /// Set the dimensions.
    pub fn with_dimensions(mut self, n_sequences: usize, n_samples: usize) -> Self {
        self.n_sequences = n_sequences;
        self.n_samples = n_samples;
        self
    }

    /// Set sparsity level.
    pub fn with_sparsity(mut self, sparsity: f64) -> Self {
        self.sparsity = sparsity.clamp(0.0, 0.99);
        self
    }

    /// Set the epsilon sweep.
    pub fn with_sweep(mut self, epsilon_min: f64, epsilon_step: f64, n_steps: usize) -> Self {
        self.epsilon_min = epsilon_min;
        self.epsilon_step = epsilon_step;
        self.n_steps = n_steps;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Largest epsilon of the sweep.
    pub fn epsilon_max(&self) -> f64 {
        self.epsilon_min + self.epsilon_step * self.n_steps.saturating_sub(1) as f64
    }

    fn validate(&self) -> Result<()> {
        if self.n_sequences == 0 || self.n_samples == 0 {
            return Err(TsclustError::InvalidParameter(
                "synthetic database needs at least one sequence and one sample".to_string(),
            ));
        }
        if self.n_groups == 0 || self.n_steps == 0 {
            return Err(TsclustError::InvalidParameter(
                "n_groups and n_steps must be at least 1".to_string(),
            ));
        }
        if !(self.epsilon_step > 0.0) || !self.epsilon_min.is_finite() {
            return Err(TsclustError::InvalidParameter(format!(
                "invalid epsilon sweep: min {}, step {}",
                self.epsilon_min, self.epsilon_step
            )));
        }
        Ok(())
    }
}

const PHYLA: [&str; 4] = ["Proteobacteria", "Bacteroidetes", "Firmicutes", "Actinobacteria"];

/// Taxonomy lineage for a group; deeper ranks are sometimes unresolved.
fn lineage(group: usize, rng: &mut Rng) -> String {
    let phylum = PHYLA[group % PHYLA.len()];
    let mut ranks = vec![
        "k__Bacteria".to_string(),
        format!("p__{}", phylum),
        format!("c__{}ia_{}", &phylum[..4], group % 3),
        format!("o__Order{}", group),
        format!("f__Family{}", group),
    ];
    if rng.next_f64() < 0.8 {
        ranks.push(format!("g__Genus{}_{}", group, rng.next_below(3)));
        if rng.next_f64() < 0.5 {
            ranks.push(format!("s__species{}", rng.next_below(4)));
        } else {
            ranks.push("s__".to_string());
        }
    }
    ranks.join("; ")
}

/// Generate a synthetic database laid out according to `layout`.
pub fn generate_synthetic(config: &SyntheticConfig, layout: &DatasetLayout) -> Result<MemoryStore> {
    config.validate()?;
    let mut rng = Rng::new(config.seed);
    let n = config.n_sequences;
    let m = config.n_samples;
    let groups: Vec<usize> = (0..n).map(|i| i % config.n_groups).collect();
    let phases: Vec<f64> = (0..config.n_groups)
        .map(|_| rng.next_f64() * 2.0 * std::f64::consts::PI)
        .collect();

    let mut data = Vec::new();
    let mut indices = Vec::new();
    let mut indptr = Vec::with_capacity(n + 1);
    indptr.push(0i64);
    for &group in &groups {
        for j in 0..m {
            if rng.next_f64() < config.sparsity {
                continue;
            }
            let season = (2.0 * std::f64::consts::PI * j as f64 / m as f64 + phases[group]).sin();
            let value = (config.mean_abundance * (1.0 + 0.8 * season) * (0.5 + rng.next_f64())).round();
            if value > 0.0 {
                data.push(value);
                indices.push(j as i64);
            }
        }
        indptr.push(data.len() as i64);
    }

    let mut labels = Vec::with_capacity(config.n_steps * n);
    let noise_draws: Vec<f64> = (0..n).map(|_| rng.next_f64()).collect();
    for k in 0..config.n_steps {
        let noise_cut = config.noise_fraction * (config.n_steps - k) as f64 / config.n_steps as f64;
        for i in 0..n {
            if noise_draws[i] < noise_cut {
                labels.push(NOISE_LABEL);
            } else {
                labels.push((groups[i] >> k.min(63)) as i64);
            }
        }
    }

    let taxonomy: Vec<String> = groups.iter().map(|&g| lineage(g, &mut rng)).collect();
    let ids: Vec<String> = (0..n).map(|i| format!("seq{:05}", i)).collect();
    let phylo: Vec<i64> = groups.iter().map(|&g| g as i64).collect();
    let time: Vec<f64> = (0..m).map(|j| j as f64 * config.sample_interval).collect();

    debug!(
        "Generated synthetic database: {} sequences, {} samples, {} non-zeros",
        n,
        m,
        data.len()
    );

    let nnz = data.len();
    let mut store = MemoryStore::new();
    store.insert_scalar(&layout.n_sequences, n as i64)?;
    store.insert_scalar(&layout.n_samples, m as i64)?;
    store.insert_f64(&layout.data, vec![nnz], data)?;
    store.insert_i64(&layout.indices, vec![nnz], indices)?;
    store.insert_i64(&layout.indptr, vec![n + 1], indptr)?;
    store.insert_f64(&layout.time, vec![m], time)?;
    store.insert_strings(&layout.taxonomy, taxonomy)?;
    store.insert_i64(&layout.phylo_clusters, vec![n], phylo)?;
    store.insert_strings(&layout.sequence_ids, ids)?;
    store.insert_i64(&layout.clusters, vec![config.n_steps, n], labels)?;
    store.set_attr(&layout.clusters, &layout.param_min, config.epsilon_min)?;
    store.set_attr(&layout.clusters, &layout.param_max, config.epsilon_max())?;
    store.set_attr(&layout.clusters, &layout.param_step, config.epsilon_step)?;
    Ok(store)
}

/// Simple deterministic RNG (xorshift64).
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    fn next_below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}
