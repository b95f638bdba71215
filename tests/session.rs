//! Integration tests for exploring a loaded database through a session.

mod common;

use approx::assert_relative_eq;
use common::scenario_store;
use std::sync::Arc;
use tempfile::TempDir;
use tsclust::prelude::*;

fn scenario_session() -> Session {
    Session::from_store(
        Box::new(scenario_store()),
        SessionConfig::default(),
        &NoProgress,
    )
    .unwrap()
}

#[test]
fn test_scenario_normalisation() {
    let session = scenario_session();
    let views = session.normalize_subset(&RowFilter::Indices(vec![0, 2])).unwrap();

    let by_column = views.view(View::ByColumn);
    assert_eq!(by_column.shape(), (2, 3));
    assert_relative_eq!(by_column[(0, 0)], 1.0);
    assert_relative_eq!(by_column[(1, 1)], 1.0);
    assert_eq!(by_column.iter().filter(|&&v| v != 0.0).count(), 2);

    for row in views.view(View::ByRow).row_iter() {
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_zero_total_columns_stay_zero() {
    let layout = DatasetLayout::default();
    let mut store = scenario_store();
    // rows [1,0,0], [2,0,0], [0,3,0], [0,0,0]: no abundance in the last sample
    store.insert_i64(&layout.indices, vec![3], vec![0, 0, 1]).unwrap();
    let session =
        Session::from_store(Box::new(store), SessionConfig::default(), &NoProgress).unwrap();
    assert_eq!(session.abundance().column_totals()[2], 0.0);

    let views = session.normalize_subset(&RowFilter::All).unwrap();
    for view in [View::ByColumn, View::Double] {
        let m = views.view(view);
        assert!(m.iter().all(|v| v.is_finite()), "{} has non-finite entries", view);
        assert!(m.column(2).iter().all(|&v| v == 0.0));
    }
}

#[test]
fn test_empty_subset_is_not_an_error() {
    let session = scenario_session();
    let views = session.normalize_subset(&RowFilter::PhyloCluster(99)).unwrap();
    assert!(views.is_empty());
    for view in View::ALL {
        assert_eq!(views.view(view).shape(), (0, 3));
    }
}

#[test]
fn test_epsilon_alignment() {
    let session = scenario_session();
    for k in 0..3 {
        let eps = 0.1 + k as f64 * 0.1;
        assert_eq!(session.select_epsilon(eps).unwrap().row, k);
    }
    for bad in [0.15, 0.0, 0.4, -0.1, f64::NAN] {
        let err = session.select_epsilon(bad).unwrap_err();
        assert!(err.is_invalid_input(), "{} should be rejected", bad);
    }
    assert_eq!(session.current_labels().unwrap().row, 2);
}

#[test]
fn test_selected_labels() {
    let session = scenario_session();
    let labels = session.select_epsilon(0.1).unwrap();
    assert_eq!(labels.as_slice(), &[0, 0, 1, -1]);
    assert_eq!(
        session.resolve_rows(&RowFilter::TimeCluster(0)).unwrap(),
        vec![0, 1]
    );
}

#[test]
fn test_sweep_counts_include_noise() {
    let session = scenario_session();
    let points = session.sweep_points(&NoProgress).unwrap();
    assert_eq!(points.len(), 3);
    let counts: Vec<usize> = points.iter().map(|p| p.clusters).collect();
    assert_eq!(counts, vec![3, 2, 1]);
    assert_eq!(points[0].clusters_excluding_noise(), 2);
    assert!(!points[2].has_noise);
}

#[test]
fn test_sweep_length_on_synthetic_data() {
    let config = SyntheticConfig::default()
        .with_dimensions(120, 12)
        .with_sweep(0.05, 0.05, 9);
    let store = generate_synthetic(&config, &DatasetLayout::default()).unwrap();
    let session =
        Session::from_store(Box::new(store), SessionConfig::default(), &NoProgress).unwrap();
    let counts = session.sweep_cluster_counts(&NoProgress).unwrap();
    assert_eq!(counts.len(), 9);
}

#[test]
fn test_diversity_scenario() {
    let session = scenario_session();
    let report = session.diversity_by_level(0.1).unwrap();
    assert_eq!(report.levels.len(), 6);

    let phylum = report.level(Rank::Phylum).unwrap();
    assert_eq!(phylum.clusters.len(), 2);
    assert_relative_eq!(phylum.clusters[0].simpson, 1.0);
    assert_relative_eq!(phylum.clusters[1].simpson, 1.0);

    // cluster 1 has no class assignment and is skipped
    let class = report.level(Rank::Class).unwrap();
    assert_eq!(class.clusters.len(), 1);
    assert_eq!(class.clusters[0].cluster, 0);
    assert_relative_eq!(class.clusters[0].simpson, 0.5);

    assert!(report.level(Rank::Species).unwrap().clusters.is_empty());
}

#[test]
fn test_diversity_excludes_noise_and_bounds() {
    let session = scenario_session();
    let report = session.diversity_by_level(0.2).unwrap();
    let phylum = report.level(Rank::Phylum).unwrap();
    assert_eq!(phylum.clusters.len(), 1);
    assert_relative_eq!(phylum.clusters[0].simpson, 5.0 / 9.0, epsilon = 1e-12);

    for level in &report.levels {
        for c in &level.clusters {
            assert!(c.simpson > 0.0 && c.simpson <= 1.0);
        }
    }

    let single = session.diversity_at_rank(0.2, Rank::Phylum).unwrap();
    assert_eq!(&single, phylum);
}

#[test]
fn test_repeated_requests_are_memoised() {
    let session = scenario_session();
    let a = session.diversity_by_level(0.3).unwrap();
    let b = session.diversity_by_level(0.3).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let s1 = session.sweep_points(&NoProgress).unwrap();
    let s2 = session.sweep_points(&NoProgress).unwrap();
    assert!(Arc::ptr_eq(&s1, &s2));
}

#[test]
fn test_reload_is_atomic() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    scenario_store().to_json_file(&first).unwrap();
    generate_synthetic(&SyntheticConfig::small(), &DatasetLayout::default())
        .unwrap()
        .to_json_file(&second)
        .unwrap();

    let mut session = Session::open(&first).unwrap();
    session.select_epsilon(0.2).unwrap();

    let missing = dir.path().join("missing.json");
    assert!(session.reload(&missing, &NoProgress).is_err());
    assert_eq!(session.abundance().n_sequences(), 4);
    assert_eq!(session.current_labels().unwrap().row, 1);

    session.reload(&second, &NoProgress).unwrap();
    assert_eq!(session.abundance().n_sequences(), 24);
    assert!(session.current_labels().is_none());
}

#[test]
fn test_export_tables() {
    let session = scenario_session();
    session.select_epsilon(0.1).unwrap();
    let table = session.cluster_table(0).unwrap();
    let ids: Vec<&str> = table.rows.iter().map(|r| r.sequence_id.as_str()).collect();
    assert_eq!(ids, vec!["seq0", "seq1"]);
    assert_relative_eq!(table.rows[1].abundance_sum, 2.0);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.csv");
    session.wide_table(0).unwrap().to_path(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "sequence_id,abundance_sum,taxonomy,phylo_cluster,time_cluster,0,7,14"
    );
    assert_eq!(
        lines.next().unwrap(),
        "seq0,1,k__Bacteria; p__Firmicutes; c__Bacilli,0,0,1,0,0"
    );
}
