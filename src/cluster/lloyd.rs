//! Exact k-means iteration.

use tracing::debug;

use crate::cluster::{closest_center, Cluster};
use crate::dataset::DataSet;
use crate::distance::Metric;
use crate::error::Result;

/// Full-assignment passes until one moves no point.
///
/// Centers are maintained online: a reassignment immediately shifts both
/// the losing and the gaining running mean, so later points in the same
/// pass see the updated centers. A pass with zero reassignments mutates
/// nothing, which makes the converged state a fixpoint.
pub(super) fn run(
    dataset: &DataSet,
    metric: Metric<u8, f64>,
    clusters: &mut [Cluster],
    assigned: &mut [Option<usize>],
) -> Result<usize> {
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut changes = 0usize;

        for (index, point) in dataset.iter().enumerate() {
            let (best, _) = closest_center(clusters, point.data(), metric)?;
            if assigned[index] == Some(best) {
                continue;
            }
            if let Some(previous) = assigned[index] {
                clusters[previous].remove(point.label(), point.data());
            }
            clusters[best].add(point.label(), point.data());
            assigned[index] = Some(best);
            changes += 1;
        }

        debug!(pass = passes, changes, "lloyd pass");
        if changes == 0 {
            return Ok(passes);
        }
    }
}
