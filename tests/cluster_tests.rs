//! End-to-end clustering behavior: Lloyd convergence, reverse assignment
//! completeness, scoring, and projection.

use vecino::benchmark::clustered_dataset;
use vecino::distance::euclidean;
use vecino::{
    Approximator, Clusterer, CubeIndex, CubeParams, DataSet, LshIndex, LshParams, SearchError,
};

fn two_pairs() -> DataSet {
    DataSet::from_vectors(vec![vec![0], vec![1], vec![10], vec![11]]).unwrap()
}

fn two_blobs() -> DataSet {
    let mut vectors = Vec::new();
    for (x, y) in [(9, 9), (9, 11), (11, 9), (11, 11), (10, 10)] {
        vectors.push(vec![x, y]);
    }
    for (x, y) in [(199, 199), (199, 201), (201, 199), (201, 201), (200, 200)] {
        vectors.push(vec![x, y]);
    }
    DataSet::from_vectors(vectors).unwrap()
}

#[test]
fn lloyd_converges_on_the_two_pair_line() {
    let ds = two_pairs();
    for seed in 0..10u64 {
        let mut clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(seed)).unwrap();
        clusterer.run().unwrap();

        let mut centers: Vec<f64> = clusterer
            .clusters()
            .iter()
            .map(|c| c.center()[0])
            .collect();
        centers.sort_by(f64::total_cmp);
        assert!((centers[0] - 0.5).abs() < 1e-9, "seed {seed}: {centers:?}");
        assert!((centers[1] - 10.5).abs() < 1e-9, "seed {seed}: {centers:?}");

        let low = clusterer
            .clusters()
            .iter()
            .find(|c| c.center()[0] < 5.0)
            .unwrap();
        let high = clusterer
            .clusters()
            .iter()
            .find(|c| c.center()[0] > 5.0)
            .unwrap();
        assert_eq!(low.members().iter().copied().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(high.members().iter().copied().collect::<Vec<_>>(), [3, 4]);
    }
}

#[test]
fn a_converged_lloyd_run_is_a_fixpoint() {
    let ds = two_pairs();
    let mut clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(3)).unwrap();
    clusterer.run().unwrap();

    let sizes: usize = clusterer.clusters().iter().map(|c| c.len()).sum();
    assert_eq!(sizes, ds.len());

    let before = clusterer.clusters().to_vec();
    let passes = clusterer.run().unwrap();
    assert_eq!(passes, 1);
    assert_eq!(clusterer.clusters(), &before[..]);
}

#[test]
fn every_point_ends_up_in_exactly_one_cluster_after_reverse_assignment() {
    let ds = clustered_dataset(3, 40, 4, 2.0, Some(6)).unwrap();
    let params = LshParams {
        window: 300,
        hashes_per_table: 2,
        tables: 8,
        table_size: None,
        seed: Some(8),
    };
    let approx = Approximator::Lsh(LshIndex::new(&ds, &params).unwrap());
    let mut clusterer =
        Clusterer::reverse_assignment(approx, 3, euclidean, euclidean, Some(4)).unwrap();

    let rounds = clusterer.run().unwrap();
    assert!((1..=15).contains(&rounds));

    let mut seen = vec![0usize; ds.len()];
    for cluster in clusterer.clusters() {
        for &label in cluster.members() {
            seen[label as usize - 1] += 1;
        }
    }
    assert!(seen.iter().all(|&count| count == 1));

    for point in &ds {
        assert!(clusterer.assignment(point.label()).is_some());
    }
    assert!(clusterer.objective(euclidean) >= 0.0);
}

#[test]
fn reverse_assignment_also_runs_over_a_hypercube_index() {
    let ds = clustered_dataset(2, 30, 4, 2.0, Some(9)).unwrap();
    let params = CubeParams {
        window: 300,
        dimensions: 5,
        probes: 16,
        max_candidates: 60,
        seed: Some(2),
    };
    let approx = Approximator::Cube(CubeIndex::new(&ds, &params).unwrap());
    let mut clusterer =
        Clusterer::reverse_assignment(approx, 2, euclidean, euclidean, Some(12)).unwrap();

    clusterer.run().unwrap();
    let sizes: usize = clusterer.clusters().iter().map(|c| c.len()).sum();
    assert_eq!(sizes, ds.len());

    let (per_cluster, overall) = clusterer.silhouettes(euclidean);
    assert_eq!(per_cluster.len(), 2);
    for score in per_cluster.iter().chain(std::iter::once(&overall)) {
        assert!((-1.0..=1.0).contains(score));
    }
}

#[test]
fn silhouettes_separate_two_tight_blobs() {
    let ds = two_blobs();
    let mut clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(1)).unwrap();
    clusterer.run().unwrap();

    let (per_cluster, overall) = clusterer.silhouettes(euclidean);
    assert_eq!(per_cluster.len(), 2);
    for &score in &per_cluster {
        assert!(score > 0.8, "weak cohesion: {per_cluster:?}");
        assert!(score <= 1.0);
    }
    assert!(overall > 0.8);

    // equal-sized clusters: the overall score is their plain mean
    assert!((overall - (per_cluster[0] + per_cluster[1]) / 2.0).abs() < 1e-9);
}

#[test]
fn projection_recomputes_centers_from_the_replacement_vectors() {
    let ds = two_pairs();
    let mut clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(7)).unwrap();
    clusterer.run().unwrap();

    // same labels, different representation and dimensionality
    let wide = DataSet::from_vectors(vec![vec![0, 0], vec![1, 2], vec![10, 20], vec![11, 22]])
        .unwrap();
    clusterer.project_to_dataset(&wide).unwrap();

    assert_eq!(clusterer.dataset().dim(), 2);
    let low = clusterer
        .clusters()
        .iter()
        .find(|c| c.center()[0] < 5.0)
        .unwrap();
    let high = clusterer
        .clusters()
        .iter()
        .find(|c| c.center()[0] > 5.0)
        .unwrap();
    assert_eq!(low.center(), &[0.5, 1.0]);
    assert_eq!(high.center(), &[10.5, 21.0]);

    let short = DataSet::from_vectors(vec![vec![1], vec![2], vec![3]]).unwrap();
    assert!(matches!(
        clusterer.project_to_dataset(&short),
        Err(SearchError::DatasetSizeMismatch {
            expected: 4,
            actual: 3
        })
    ));
}

#[test]
fn degenerate_cluster_counts_are_rejected() {
    let ds = two_pairs();
    assert!(matches!(
        Clusterer::lloyd(&ds, 0, euclidean, None),
        Err(SearchError::ZeroClusters)
    ));
    assert!(matches!(
        Clusterer::lloyd(&ds, 40, euclidean, None),
        Err(SearchError::InvalidParameter(_))
    ));

    let params = LshParams::default().with_seed(1);
    let approx = Approximator::Lsh(LshIndex::new(&ds, &params).unwrap());
    assert!(matches!(
        Clusterer::reverse_assignment(approx, 0, euclidean, euclidean, None),
        Err(SearchError::ZeroClusters)
    ));
}
