//! Partitioning a dataset into k clusters.
//!
//! Two assignment strategies share one center representation and one
//! k-means++ seeding procedure:
//!
//! - [`Clusterer::lloyd`]: exact iterative k-means. Every pass scans all
//!   centers per point and maintains centers online (MacQueen running
//!   means), terminating on the first pass that moves no point.
//! - [`Clusterer::reverse_assignment`]: instead of scanning centers per
//!   point, each round range-searches an [`Approximator`] around every
//!   center and lets the clusters capture what falls inside a doubling
//!   radius. Points no ball ever reaches are assigned by an exact scan at
//!   the end.
//!
//! Scoring (silhouettes, objective value) and re-projection onto a
//! replacement dataset are shared by both strategies.

mod lloyd;
mod reverse;

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::ann::Approximator;
use crate::dataset::{DataPoint, DataSet};
use crate::distance::Metric;
use crate::error::{Result, SearchError};

/// One partition: a center maintained as a running mean and the labels
/// currently assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    center: Vec<f64>,
    members: BTreeSet<u32>,
}

impl Cluster {
    /// A fresh cluster centered on a dataset point, with no members yet.
    fn seeded_from(point: &DataPoint) -> Self {
        Self {
            center: point.data().iter().map(|&c| f64::from(c)).collect(),
            members: BTreeSet::new(),
        }
    }

    /// Number of assigned points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The current center. Equal to the mean of the members once an
    /// assignment pass has completed; equal to the seed point before any
    /// point is assigned.
    #[must_use]
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// Labels of the assigned points, ascending.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<u32> {
        &self.members
    }

    /// Add a member and shift the running mean onto it.
    fn add(&mut self, label: u32, data: &[u8]) {
        let n = self.members.len() as f64;
        if self.members.insert(label) {
            for (acc, &x) in self.center.iter_mut().zip(data) {
                *acc = (*acc * n + f64::from(x)) / (n + 1.0);
            }
        }
    }

    /// Remove a member and shift the running mean off it. Removing the
    /// last member leaves the center where it was.
    fn remove(&mut self, label: u32, data: &[u8]) {
        let n = self.members.len() as f64;
        if self.members.remove(&label) && !self.members.is_empty() {
            for (acc, &x) in self.center.iter_mut().zip(data) {
                *acc = (*acc * n - f64::from(x)) / (n - 1.0);
            }
        }
    }

    /// Membership-only insert, for callers that recompute centers in
    /// batch.
    fn insert_label(&mut self, label: u32) {
        self.members.insert(label);
    }

    /// Membership-only remove, for callers that recompute centers in
    /// batch.
    fn remove_label(&mut self, label: u32) {
        self.members.remove(&label);
    }

    /// Recompute the center as the exact mean of the current members. An
    /// empty cluster keeps its previous center.
    fn recompute_center(&mut self, dataset: &DataSet) {
        if self.members.is_empty() {
            return;
        }
        self.center.fill(0.0);
        for &label in &self.members {
            for (acc, &x) in self.center.iter_mut().zip(dataset.by_label(label).data()) {
                *acc += f64::from(x);
            }
        }
        let n = self.members.len() as f64;
        for acc in &mut self.center {
            *acc /= n;
        }
    }
}

/// How [`Clusterer::run`] assigns points to centers.
enum Strategy<'a> {
    Lloyd,
    Reverse {
        approx: Approximator<'a>,
        center_metric: Metric<f64, f64>,
    },
}

/// A k-way partitioner over a borrowed dataset.
pub struct Clusterer<'a> {
    dataset: &'a DataSet,
    metric: Metric<u8, f64>,
    clusters: Vec<Cluster>,
    assigned: Vec<Option<usize>>,
    strategy: Strategy<'a>,
}

impl<'a> Clusterer<'a> {
    /// Classic k-means: exact nearest-center assignment with online
    /// center maintenance.
    ///
    /// `metric` compares a dataset point against a center. `seed` drives
    /// the k-means++ initialization; `None` seeds from entropy.
    pub fn lloyd(
        dataset: &'a DataSet,
        k: usize,
        metric: Metric<u8, f64>,
        seed: Option<u64>,
    ) -> Result<Self> {
        Self::with_strategy(dataset, k, metric, seed, Strategy::Lloyd)
    }

    /// Approximate assignment driven by the approximator's range search.
    ///
    /// `metric` compares a dataset point against a center and is also
    /// handed to the range searches; `center_metric` compares two centers
    /// (it sizes the initial search radius).
    pub fn reverse_assignment(
        approx: Approximator<'a>,
        k: usize,
        metric: Metric<u8, f64>,
        center_metric: Metric<f64, f64>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let dataset = approx.dataset();
        let strategy = Strategy::Reverse {
            approx,
            center_metric,
        };
        Self::with_strategy(dataset, k, metric, seed, strategy)
    }

    fn with_strategy(
        dataset: &'a DataSet,
        k: usize,
        metric: Metric<u8, f64>,
        seed: Option<u64>,
        strategy: Strategy<'a>,
    ) -> Result<Self> {
        if k == 0 {
            return Err(SearchError::ZeroClusters);
        }
        if k > dataset.len() {
            return Err(SearchError::InvalidParameter(format!(
                "cannot seed {k} clusters from {} points",
                dataset.len()
            )));
        }

        let clusters = seed_centers(dataset, k, metric, seed);
        Ok(Self {
            dataset,
            metric,
            clusters,
            assigned: vec![None; dataset.len()],
            strategy,
        })
    }

    /// Run the configured strategy until no point changes cluster (Lloyd)
    /// or the round cap is hit (reverse assignment). Returns the number
    /// of passes.
    ///
    /// Calling it again continues from the current assignment, so a
    /// converged Lloyd clusterer returns after a single no-op pass.
    pub fn run(&mut self) -> Result<usize> {
        let Self {
            dataset,
            metric,
            clusters,
            assigned,
            strategy,
        } = self;
        match strategy {
            Strategy::Lloyd => lloyd::run(*dataset, *metric, clusters, assigned),
            Strategy::Reverse {
                approx,
                center_metric,
            } => reverse::run(*dataset, *metric, *center_metric, approx, clusters, assigned),
        }
    }

    /// Number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    /// The clusters, in seeding order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The dataset the assignment currently refers to.
    #[must_use]
    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    /// Index of the cluster `label`'s point is assigned to, if any pass
    /// has assigned it.
    #[must_use]
    pub fn assignment(&self, label: u32) -> Option<usize> {
        self.assigned[label as usize - 1]
    }

    /// The nearest center to `query` and its distance, by linear scan.
    pub fn closest(&self, query: &[u8]) -> Result<(usize, f64)> {
        if query.len() != self.dataset.dim() {
            return Err(SearchError::DimensionMismatch {
                expected: self.dataset.dim(),
                actual: query.len(),
            });
        }
        closest_center(&self.clusters, query, self.metric)
    }

    /// Per-cluster mean silhouette scores plus the dataset-wide mean.
    ///
    /// Per point: `(b - a) / max(a, b)`, where `a` is the mean distance
    /// to the other members of its own cluster and `b` the mean distance
    /// to the members of the nearest other cluster (by center). Points in
    /// singleton clusters score 0, as does everything when no other
    /// non-empty cluster exists.
    #[must_use]
    pub fn silhouettes(&self, point_metric: Metric<u8, u8>) -> (Vec<f64>, f64) {
        let mut per_cluster = Vec::with_capacity(self.clusters.len());
        let mut total = 0.0;
        let mut scored = 0usize;

        for (own, cluster) in self.clusters.iter().enumerate() {
            let mut sum = 0.0;
            for &label in cluster.members() {
                sum += self.silhouette_of(own, label, point_metric);
            }
            total += sum;
            scored += cluster.len();
            per_cluster.push(if cluster.is_empty() {
                0.0
            } else {
                sum / cluster.len() as f64
            });
        }

        let overall = if scored == 0 { 0.0 } else { total / scored as f64 };
        (per_cluster, overall)
    }

    fn silhouette_of(&self, own: usize, label: u32, point_metric: Metric<u8, u8>) -> f64 {
        let own_cluster = &self.clusters[own];
        if own_cluster.len() < 2 {
            return 0.0;
        }
        let point = self.dataset.by_label(label).data();

        let intra: f64 = own_cluster
            .members()
            .iter()
            .filter(|&&m| m != label)
            .map(|&m| point_metric(self.dataset.by_label(m).data(), point))
            .sum();
        let a = intra / (own_cluster.len() - 1) as f64;

        let mut nearest: Option<&Cluster> = None;
        let mut nearest_distance = f64::INFINITY;
        for (index, cluster) in self.clusters.iter().enumerate() {
            if index == own || cluster.is_empty() {
                continue;
            }
            let distance = (self.metric)(point, cluster.center());
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = Some(cluster);
            }
        }
        let Some(other) = nearest else {
            return 0.0;
        };

        let inter: f64 = other
            .members()
            .iter()
            .map(|&m| point_metric(self.dataset.by_label(m).data(), point))
            .sum();
        let b = inter / other.len() as f64;

        let denom = a.max(b);
        if denom > 0.0 {
            (b - a) / denom
        } else {
            0.0
        }
    }

    /// Cluster-size-weighted mean of each cluster's mean point-to-center
    /// distance. Lower is tighter.
    #[must_use]
    pub fn objective(&self, metric: Metric<u8, f64>) -> f64 {
        let mut dispersion = 0.0;
        let mut assigned = 0usize;
        for cluster in &self.clusters {
            dispersion += cluster
                .members()
                .iter()
                .map(|&label| metric(self.dataset.by_label(label).data(), cluster.center()))
                .sum::<f64>();
            assigned += cluster.len();
        }
        if assigned == 0 {
            0.0
        } else {
            dispersion / assigned as f64
        }
    }

    /// Rebind the learned assignment to a same-sized dataset and
    /// recompute every center from the replacement vectors.
    ///
    /// Membership carries over by label, so an assignment learned on one
    /// representation (say, reduced vectors) can be scored against
    /// another. The replacement may have a different dimensionality.
    pub fn project_to_dataset(&mut self, dataset: &'a DataSet) -> Result<()> {
        if dataset.len() != self.dataset.len() {
            return Err(SearchError::DatasetSizeMismatch {
                expected: self.dataset.len(),
                actual: dataset.len(),
            });
        }
        self.dataset = dataset;
        for cluster in &mut self.clusters {
            cluster.center = vec![0.0; dataset.dim()];
            cluster.recompute_center(dataset);
        }
        Ok(())
    }
}

/// The nearest center to `point` and its distance. Errors when there are
/// no clusters to scan.
fn closest_center(
    clusters: &[Cluster],
    point: &[u8],
    metric: Metric<u8, f64>,
) -> Result<(usize, f64)> {
    if clusters.is_empty() {
        return Err(SearchError::ZeroClusters);
    }
    let mut best = 0usize;
    let mut best_distance = f64::INFINITY;
    for (index, cluster) in clusters.iter().enumerate() {
        let distance = metric(point, cluster.center());
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    Ok((best, best_distance))
}

/// k-means++ seeding: the first center is a uniformly random point; each
/// further center is a point sampled with probability proportional to its
/// squared distance to the nearest already-chosen center.
fn seed_centers(
    dataset: &DataSet,
    k: usize,
    metric: Metric<u8, f64>,
    seed: Option<u64>,
) -> Vec<Cluster> {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut chosen = vec![false; dataset.len()];
    let first = rng.random_range(0..dataset.len());
    chosen[first] = true;
    let mut clusters = vec![Cluster::seeded_from(dataset.point(first))];

    while clusters.len() < k {
        let mut weights = vec![0.0f64; dataset.len()];
        let mut total = 0.0;
        for (i, point) in dataset.iter().enumerate() {
            if chosen[i] {
                continue;
            }
            let mut nearest = f64::INFINITY;
            for cluster in &clusters {
                let distance = metric(point.data(), cluster.center());
                if distance < nearest {
                    nearest = distance;
                }
            }
            weights[i] = nearest * nearest;
            total += weights[i];
        }

        // guaranteed at least one unchosen point since k <= dataset.len()
        let mut next = 0usize;
        if total > 0.0 {
            let threshold = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            for (i, &weight) in weights.iter().enumerate() {
                if chosen[i] {
                    continue;
                }
                next = i;
                cumulative += weight;
                if cumulative >= threshold {
                    break;
                }
            }
        } else {
            // every remaining point coincides with a center
            for (i, &flag) in chosen.iter().enumerate() {
                if !flag {
                    next = i;
                    break;
                }
            }
        }

        chosen[next] = true;
        clusters.push(Cluster::seeded_from(dataset.point(next)));
    }

    debug!(k, seed, "seeded cluster centers");
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::euclidean;

    fn four_corners() -> DataSet {
        DataSet::from_vectors(vec![vec![0, 0], vec![0, 100], vec![100, 0], vec![100, 100]])
            .unwrap()
    }

    #[test]
    fn running_mean_tracks_adds_and_removes() {
        let ds = four_corners();
        let mut cluster = Cluster::seeded_from(ds.by_label(1));
        assert_eq!(cluster.center(), &[0.0, 0.0]);
        assert!(cluster.is_empty());

        cluster.add(2, ds.by_label(2).data());
        assert_eq!(cluster.center(), &[0.0, 100.0]);

        cluster.add(3, ds.by_label(3).data());
        assert_eq!(cluster.center(), &[50.0, 50.0]);
        assert_eq!(cluster.len(), 2);

        cluster.remove(2, ds.by_label(2).data());
        assert_eq!(cluster.center(), &[100.0, 0.0]);

        // removing the last member leaves the center in place
        cluster.remove(3, ds.by_label(3).data());
        assert!(cluster.is_empty());
        assert_eq!(cluster.center(), &[100.0, 0.0]);
    }

    #[test]
    fn duplicate_add_and_foreign_remove_are_no_ops() {
        let ds = four_corners();
        let mut cluster = Cluster::seeded_from(ds.by_label(1));
        cluster.add(2, ds.by_label(2).data());
        cluster.add(2, ds.by_label(2).data());
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster.center(), &[0.0, 100.0]);

        cluster.remove(4, ds.by_label(4).data());
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster.center(), &[0.0, 100.0]);
    }

    #[test]
    fn batch_recompute_matches_the_member_mean() {
        let ds = four_corners();
        let mut cluster = Cluster::seeded_from(ds.by_label(1));
        cluster.insert_label(2);
        cluster.insert_label(3);
        cluster.insert_label(4);
        cluster.recompute_center(&ds);
        assert_eq!(cluster.center(), &[200.0 / 3.0, 200.0 / 3.0]);

        cluster.remove_label(2);
        cluster.remove_label(3);
        cluster.remove_label(4);
        cluster.recompute_center(&ds);
        // empty: previous center kept
        assert_eq!(cluster.center(), &[200.0 / 3.0, 200.0 / 3.0]);
    }

    #[test]
    fn zero_clusters_is_rejected() {
        let ds = four_corners();
        assert!(matches!(
            Clusterer::lloyd(&ds, 0, euclidean, Some(1)),
            Err(SearchError::ZeroClusters)
        ));
    }

    #[test]
    fn more_clusters_than_points_is_rejected() {
        let ds = four_corners();
        assert!(matches!(
            Clusterer::lloyd(&ds, 5, euclidean, Some(1)),
            Err(SearchError::InvalidParameter(_))
        ));
    }

    #[test]
    fn seeding_all_points_makes_every_point_a_center() {
        let ds = four_corners();
        let clusterer = Clusterer::lloyd(&ds, 4, euclidean, Some(42)).unwrap();
        let mut centers: Vec<Vec<f64>> = clusterer
            .clusters()
            .iter()
            .map(|c| c.center().to_vec())
            .collect();
        centers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(
            centers,
            vec![
                vec![0.0, 0.0],
                vec![0.0, 100.0],
                vec![100.0, 0.0],
                vec![100.0, 100.0],
            ]
        );

        // with every point a center, closest() is exact with distance 0
        let (index, distance) = clusterer.closest(ds.by_label(3).data()).unwrap();
        assert_eq!(distance, 0.0);
        assert_eq!(clusterer.clusters()[index].center(), &[100.0, 0.0]);
    }

    #[test]
    fn same_seed_seeds_the_same_centers() {
        let ds = four_corners();
        let a = Clusterer::lloyd(&ds, 2, euclidean, Some(7)).unwrap();
        let b = Clusterer::lloyd(&ds, 2, euclidean, Some(7)).unwrap();
        assert_eq!(a.clusters(), b.clusters());
    }

    #[test]
    fn seeding_weights_favor_a_far_outlier() {
        // one point far away from a tight pack: with squared-distance
        // weighting it must be picked as the second center almost always
        let mut vectors: Vec<Vec<u8>> = (0..20).map(|i| vec![i % 4, i / 4]).collect();
        vectors.push(vec![255, 255]);
        let ds = DataSet::from_vectors(vectors).unwrap();

        let mut hits = 0;
        for seed in 0..200u64 {
            let clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(seed)).unwrap();
            if clusterer
                .clusters()
                .iter()
                .any(|c| c.center() == [255.0, 255.0])
            {
                hits += 1;
            }
        }
        assert!(hits >= 190, "outlier chosen only {hits}/200 times");
    }

    #[test]
    fn closest_rejects_a_wrong_dimension_query() {
        let ds = four_corners();
        let clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(3)).unwrap();
        assert!(matches!(
            clusterer.closest(&[1, 2, 3]),
            Err(SearchError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn silhouettes_are_zero_before_any_assignment() {
        let ds = four_corners();
        let clusterer = Clusterer::lloyd(&ds, 2, euclidean, Some(3)).unwrap();
        let (per_cluster, overall) = clusterer.silhouettes(euclidean);
        assert_eq!(per_cluster, vec![0.0, 0.0]);
        assert_eq!(overall, 0.0);
        assert_eq!(clusterer.objective(euclidean), 0.0);
    }
}
