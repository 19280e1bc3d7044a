//! Range-search-driven approximate assignment.

use tracing::debug;

use crate::ann::Approximator;
use crate::cluster::{closest_center, Cluster};
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::Result;

/// Radius-doubling rounds before giving up on capture and assigning the
/// rest by exact scan.
const MAX_ROUNDS: usize = 15;

/// Each round range-searches around every center and lets clusters claim
/// the points inside their ball; a claimed point moves only when the
/// claiming center is closer than the one it currently belongs to. The
/// radius starts at half the minimum inter-center distance and doubles
/// every round; centers are recomputed in batch between rounds.
pub(super) fn run(
    dataset: &DataSet,
    metric: Metric<u8, f64>,
    center_metric: Metric<f64, f64>,
    approx: &Approximator<'_>,
    clusters: &mut [Cluster],
    assigned: &mut [Option<usize>],
) -> Result<usize> {
    let mut radius = initial_radius(clusters, center_metric);
    let mut rounds = 0usize;

    while rounds < MAX_ROUNDS {
        rounds += 1;
        let mut changes = 0usize;

        for owner in 0..clusters.len() {
            let center = clusters[owner].center().to_vec();
            for (label, distance) in approx.range_search(&center, radius, metric)? {
                let index = label as usize - 1;
                match assigned[index] {
                    None => {
                        clusters[owner].insert_label(label);
                        assigned[index] = Some(owner);
                        changes += 1;
                    }
                    Some(current) if current != owner => {
                        let incumbent =
                            metric(dataset.by_label(label).data(), clusters[current].center());
                        if distance < incumbent {
                            clusters[current].remove_label(label);
                            clusters[owner].insert_label(label);
                            assigned[index] = Some(owner);
                            changes += 1;
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        for cluster in clusters.iter_mut() {
            cluster.recompute_center(dataset);
        }
        debug!(round = rounds, radius, changes, "reverse assignment round");

        if changes == 0 {
            break;
        }
        radius *= 2.0;
    }

    // points no ball reached
    let mut fallbacks = 0usize;
    for (index, point) in dataset.iter().enumerate() {
        if assigned[index].is_some() {
            continue;
        }
        let (best, _) = closest_center(clusters, point.data(), metric)?;
        clusters[best].add(point.label(), point.data());
        assigned[index] = Some(best);
        fallbacks += 1;
    }
    if fallbacks > 0 {
        debug!(fallbacks, "assigned leftovers by exact scan");
    }

    Ok(rounds)
}

/// Half the minimum pairwise center distance. Infinite for a single
/// cluster, which makes the first capture round claim everything it can
/// reach.
fn initial_radius(clusters: &[Cluster], center_metric: Metric<f64, f64>) -> f64 {
    let mut minimum = f64::INFINITY;
    for (i, a) in clusters.iter().enumerate() {
        for b in &clusters[i + 1..] {
            let distance = center_metric(a.center(), b.center());
            if distance < minimum {
                minimum = distance;
            }
        }
    }
    minimum / 2.0
}
