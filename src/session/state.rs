//! Exploration session owning a loaded database and memoised results.

use super::filter::RowFilter;
use crate::cluster::{select_clusters, summarize_clusters, sweep_counts, ClusterSummary, SweepPoint};
use crate::config::SessionConfig;
use crate::data::{AbundanceMatrix, ClusterLabels, EpsilonSweep, Rank, SequenceTable};
use crate::diversity::{diversity_by_level, simpson_for_rank, DiversityReport, LevelDiversity};
use crate::error::{Result, TsclustError};
use crate::export::{cluster_table, wide_table, ClusterTable, WideTable};
use crate::load::{load_database, Database};
use crate::normalize::{normalize_rows, NormalizationResult};
use crate::profile::{profile_dataset, DatasetProfile};
use crate::progress::{NoProgress, Progress};
use crate::store::{open_store, ArrayStore};
use log::{debug, info};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Normalised subsets keyed by resolved positions, evicted oldest first.
#[derive(Default)]
struct SubsetCache {
    entries: HashMap<Vec<usize>, Arc<NormalizationResult>>,
    order: VecDeque<Vec<usize>>,
}

impl SubsetCache {
    fn get(&self, rows: &[usize]) -> Option<Arc<NormalizationResult>> {
        self.entries.get(rows).cloned()
    }

    fn insert(&mut self, rows: Vec<usize>, result: Arc<NormalizationResult>, capacity: usize) {
        if self.entries.contains_key(&rows) {
            return;
        }
        while self.entries.len() >= capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    debug!("evicted normalisation of {} rows", oldest.len());
                }
                None => break,
            }
        }
        self.order.push_back(rows.clone());
        self.entries.insert(rows, result);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Memoised results, keyed by label row or resolved sequence positions.
#[derive(Default)]
struct SessionCache {
    labels: Mutex<HashMap<usize, Arc<ClusterLabels>>>,
    normalized: Mutex<SubsetCache>,
    diversity: Mutex<HashMap<usize, Arc<DiversityReport>>>,
    sweep: Mutex<Option<Arc<Vec<SweepPoint>>>>,
}

impl SessionCache {
    fn clear(&self) {
        lock(&self.labels).clear();
        lock(&self.normalized).clear();
        lock(&self.diversity).clear();
        *lock(&self.sweep) = None;
    }
}

/// A loaded clustering database and the state derived from it.
///
/// All data comes from one load. [`Session::reload`] builds a complete new
/// state before replacing the old one, so a failed reload leaves the session
/// untouched and a successful one never mixes old and new data.
pub struct Session {
    config: SessionConfig,
    store: Box<dyn ArrayStore>,
    db: Database,
    current: RwLock<Option<Arc<ClusterLabels>>>,
    cache: SessionCache,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("source", &self.db.source)
            .field("n_sequences", &self.db.n_sequences())
            .field("n_samples", &self.db.n_samples())
            .field("sweep", &self.db.sweep)
            .finish()
    }
}

impl Session {
    /// Open a database file with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, SessionConfig::default(), &NoProgress)
    }

    /// Open a database file.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        config: SessionConfig,
        progress: &dyn Progress,
    ) -> Result<Self> {
        let store = open_store(path)?;
        Self::from_store(store, config, progress)
    }

    /// Load from an already opened store.
    pub fn from_store(
        store: Box<dyn ArrayStore>,
        config: SessionConfig,
        progress: &dyn Progress,
    ) -> Result<Self> {
        let db = load_database(store.as_ref(), &config, progress)?;
        info!(
            "Session ready: {} sequences x {} samples, {} epsilon values",
            db.n_sequences(),
            db.n_samples(),
            db.sweep.n_steps
        );
        Ok(Self {
            config,
            store,
            db,
            current: RwLock::new(None),
            cache: SessionCache::default(),
        })
    }

    /// Replace all state with a fresh load of `path`.
    pub fn reload<P: AsRef<Path>>(&mut self, path: P, progress: &dyn Progress) -> Result<()> {
        let fresh = Self::open_with(path, self.config.clone(), progress)?;
        *self = fresh;
        Ok(())
    }

    /// Replace all state with a fresh load from `store`.
    pub fn reload_from_store(&mut self, store: Box<dyn ArrayStore>, progress: &dyn Progress) -> Result<()> {
        let fresh = Self::from_store(store, self.config.clone(), progress)?;
        *self = fresh;
        Ok(())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn abundance(&self) -> &AbundanceMatrix {
        &self.db.abundance
    }

    pub fn sequences(&self) -> &SequenceTable {
        &self.db.sequences
    }

    pub fn time(&self) -> &[f64] {
        &self.db.time
    }

    pub fn sweep(&self) -> &EpsilonSweep {
        &self.db.sweep
    }

    /// Drop every memoised result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Labels at `epsilon` without changing the current selection.
    pub fn labels_at(&self, epsilon: f64) -> Result<Arc<ClusterLabels>> {
        let row = self.db.sweep.row_for(epsilon)?;
        if self.config.cache {
            if let Some(hit) = lock(&self.cache.labels).get(&row) {
                debug!("label cache hit for row {}", row);
                return Ok(Arc::clone(hit));
            }
        }
        let labels = Arc::new(select_clusters(
            self.store.as_ref(),
            &self.config.layout,
            &self.db.sweep,
            self.db.n_sequences(),
            epsilon,
        )?);
        if self.config.cache {
            lock(&self.cache.labels).insert(row, Arc::clone(&labels));
        }
        Ok(labels)
    }

    /// Make `epsilon` the current selection and return its labels.
    ///
    /// The previous selection stays in place if `epsilon` is rejected.
    pub fn select_epsilon(&self, epsilon: f64) -> Result<Arc<ClusterLabels>> {
        let labels = self.labels_at(epsilon)?;
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&labels));
        Ok(labels)
    }

    /// Labels of the current selection, if any.
    pub fn current_labels(&self) -> Option<Arc<ClusterLabels>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_current(&self) -> Result<Arc<ClusterLabels>> {
        self.current_labels().ok_or_else(|| {
            TsclustError::InvalidParameter("no epsilon has been selected".to_string())
        })
    }

    /// Sorted, de-duplicated sequence positions matching a filter.
    pub fn resolve_rows(&self, filter: &RowFilter) -> Result<Vec<usize>> {
        let records = self.db.sequences.records();
        let rows: Vec<usize> = match filter {
            RowFilter::All => (0..records.len()).collect(),
            RowFilter::Indices(indices) => {
                if let Some(&bad) = indices.iter().find(|&&i| i >= records.len()) {
                    return Err(TsclustError::InvalidParameter(format!(
                        "sequence index {} out of bounds for {} sequences",
                        bad,
                        records.len()
                    )));
                }
                indices.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
            }
            RowFilter::TimeCluster(label) => self.require_current()?.members(*label),
            RowFilter::PhyloCluster(label) => records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.phylo_cluster == *label)
                .map(|(i, _)| i)
                .collect(),
            RowFilter::TaxonContains(text) => {
                let needle = text.to_lowercase();
                records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.taxonomy.as_str().to_lowercase().contains(&needle))
                    .map(|(i, _)| i)
                    .collect()
            }
        };
        Ok(rows)
    }

    /// Raw, depth-normalised, series-normalised and doubly normalised views of
    /// the sequences matching `filter`.
    pub fn normalize_subset(&self, filter: &RowFilter) -> Result<Arc<NormalizationResult>> {
        let rows = self.resolve_rows(filter)?;
        if self.config.cache {
            if let Some(hit) = lock(&self.cache.normalized).get(&rows) {
                debug!("normalisation cache hit for {} rows", rows.len());
                return Ok(hit);
            }
        }
        let result = Arc::new(normalize_rows(&self.db.abundance, &rows)?);
        if self.config.cache {
            lock(&self.cache.normalized).insert(
                rows,
                Arc::clone(&result),
                self.config.max_cached_subsets,
            );
        }
        Ok(result)
    }

    /// Cluster counts for every epsilon, in epsilon order.
    pub fn sweep_points(&self, progress: &dyn Progress) -> Result<Arc<Vec<SweepPoint>>> {
        if self.config.cache {
            if let Some(hit) = lock(&self.cache.sweep).as_ref() {
                return Ok(Arc::clone(hit));
            }
        }
        let points = Arc::new(sweep_counts(
            self.store.as_ref(),
            &self.config.layout,
            &self.db.sweep,
            self.db.n_sequences(),
            progress,
        )?);
        if self.config.cache {
            *lock(&self.cache.sweep) = Some(Arc::clone(&points));
        }
        Ok(points)
    }

    /// Number of distinct labels (noise included) for every epsilon.
    pub fn sweep_cluster_counts(&self, progress: &dyn Progress) -> Result<Vec<usize>> {
        Ok(self.sweep_points(progress)?.iter().map(|p| p.clusters).collect())
    }

    /// Simpson indices per rank and cluster at `epsilon`.
    pub fn diversity_by_level(&self, epsilon: f64) -> Result<Arc<DiversityReport>> {
        let labels = self.labels_at(epsilon)?;
        if self.config.cache {
            if let Some(hit) = lock(&self.cache.diversity).get(&labels.row) {
                return Ok(Arc::clone(hit));
            }
        }
        let report = Arc::new(diversity_by_level(&labels, &self.db.sequences)?);
        if self.config.cache {
            lock(&self.cache.diversity).insert(labels.row, Arc::clone(&report));
        }
        Ok(report)
    }

    /// Simpson indices for a single rank at `epsilon`.
    pub fn diversity_at_rank(&self, epsilon: f64, rank: Rank) -> Result<LevelDiversity> {
        let labels = self.labels_at(epsilon)?;
        simpson_for_rank(rank, &labels, &self.db.sequences)
    }

    /// Size and abundance of each cluster at the current selection.
    pub fn cluster_summaries(&self) -> Result<Vec<ClusterSummary>> {
        let labels = self.require_current()?;
        summarize_clusters(&labels, &self.db.abundance)
    }

    /// Export rows for one cluster at the current selection.
    pub fn cluster_table(&self, label: i64) -> Result<ClusterTable> {
        let labels = self.require_current()?;
        cluster_table(&labels, &self.db.sequences, &self.db.abundance, label)
    }

    /// Export rows plus raw time series for one cluster at the current selection.
    pub fn wide_table(&self, label: i64) -> Result<WideTable> {
        let labels = self.require_current()?;
        wide_table(
            &labels,
            &self.db.sequences,
            &self.db.abundance,
            &self.db.time,
            label,
        )
    }

    pub fn profile(&self) -> DatasetProfile {
        profile_dataset(&self.db)
    }
}
