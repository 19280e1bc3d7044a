//! Clusters a dataset with Lloyd or reverse range-search assignment and
//! prints per-cluster digests plus silhouette scores.
//!
//! Usage:
//!
//! ```text
//! cargo run --release --example clustering [method] [cluster.json] [vectors.idx] [complete]
//! ```
//!
//! `method` is `Classic` (Lloyd), `LSH`, or `Hypercube` (both reverse
//! assignment). The JSON config mirrors the classic cluster.conf keys;
//! absent keys fall back to the usual defaults:
//!
//! ```json
//! {
//!     "number_of_clusters": 10,
//!     "number_of_vector_hash_tables": 3,
//!     "number_of_vector_hash_functions": 4,
//!     "max_number_M_hypercube": 10,
//!     "number_of_hypercube_dimensions": 3,
//!     "number_of_probes": 2
//! }
//! ```
//!
//! Without a dataset path a synthetic blob dataset is generated. A trailing
//! `complete` prints every cluster's member labels.

use std::env;
use std::error::Error;
use std::fs::File;
use std::time::Instant;

use serde::Deserialize;

use vecino::benchmark::clustered_dataset;
use vecino::distance::euclidean;
use vecino::{Approximator, Clusterer, CubeIndex, CubeParams, DataSet, LshIndex, LshParams};

const SEED: u64 = 1;
const WINDOW: u32 = 2600;

#[derive(Debug, Deserialize)]
struct ClusterConfig {
    number_of_clusters: usize,
    #[serde(default = "default_tables")]
    number_of_vector_hash_tables: usize,
    #[serde(default = "default_hashes")]
    number_of_vector_hash_functions: usize,
    #[serde(default = "default_max_candidates", rename = "max_number_M_hypercube")]
    max_number_m_hypercube: usize,
    #[serde(default = "default_cube_dimensions")]
    number_of_hypercube_dimensions: usize,
    #[serde(default = "default_probes")]
    number_of_probes: usize,
}

fn default_tables() -> usize {
    3
}

fn default_hashes() -> usize {
    4
}

fn default_max_candidates() -> usize {
    10
}

fn default_cube_dimensions() -> usize {
    3
}

fn default_probes() -> usize {
    2
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            number_of_clusters: 10,
            number_of_vector_hash_tables: default_tables(),
            number_of_vector_hash_functions: default_hashes(),
            max_number_m_hypercube: default_max_candidates(),
            number_of_hypercube_dimensions: default_cube_dimensions(),
            number_of_probes: default_probes(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let method = args.next().unwrap_or_else(|| "Classic".to_string());
    let config: ClusterConfig = match args.next() {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => ClusterConfig::default(),
    };
    let dataset = match args.next() {
        Some(path) => DataSet::load_limited(path, 10_000)?,
        None => clustered_dataset(config.number_of_clusters, 150, 16, 4.0, Some(SEED))?,
    };
    let complete = args.next().as_deref() == Some("complete");

    let k = config.number_of_clusters;
    println!(
        "dataset: {} points, {} dimensions, k = {k}\n",
        dataset.len(),
        dataset.dim()
    );

    let mut clusterer = match method.as_str() {
        "Classic" => Clusterer::lloyd(&dataset, k, euclidean, Some(SEED))?,
        "LSH" => {
            let params = LshParams {
                window: WINDOW,
                hashes_per_table: config.number_of_vector_hash_functions,
                tables: config.number_of_vector_hash_tables,
                table_size: None,
                seed: Some(SEED),
            };
            let approx = Approximator::Lsh(LshIndex::new(&dataset, &params)?);
            Clusterer::reverse_assignment(approx, k, euclidean, euclidean, Some(SEED))?
        }
        "Hypercube" => {
            let params = CubeParams {
                window: WINDOW,
                dimensions: config.number_of_hypercube_dimensions,
                probes: config.number_of_probes,
                max_candidates: config.max_number_m_hypercube,
                seed: Some(SEED),
            };
            let approx = Approximator::Cube(CubeIndex::new(&dataset, &params)?);
            Clusterer::reverse_assignment(approx, k, euclidean, euclidean, Some(SEED))?
        }
        other => {
            return Err(
                format!("invalid method {other:?}: use Classic, LSH or Hypercube").into(),
            )
        }
    };

    let started = Instant::now();
    let passes = clusterer.run()?;
    let elapsed = started.elapsed();

    println!(
        "Algorithm: {}",
        match method.as_str() {
            "Classic" => "Lloyds".to_string(),
            m => format!("Range Search {m}"),
        }
    );
    for (i, cluster) in clusterer.clusters().iter().enumerate() {
        println!(
            "CLUSTER-{:<3}{{size: {:>5}, centroid: {}}}",
            i + 1,
            cluster.len(),
            digest(cluster.center())
        );
    }
    println!(
        "clustering_time: {:.3} sec ({passes} passes)\n",
        elapsed.as_secs_f64()
    );

    let (silhouettes, total) = clusterer.silhouettes(euclidean);
    print!("Silhouette: [");
    for score in &silhouettes {
        print!("{score:.3}, ");
    }
    println!("{total:.3}]");

    if complete {
        println!();
        for (i, cluster) in clusterer.clusters().iter().enumerate() {
            let labels: Vec<String> = cluster.members().iter().map(u32::to_string).collect();
            println!("CLUSTER-{:<3}{{centroid, {}}}", i + 1, labels.join(", "));
        }
    }

    Ok(())
}

/// First components of a center, enough to tell clusters apart at a glance.
fn digest(center: &[f64]) -> String {
    let shown: Vec<String> = center.iter().take(8).map(|c| format!("{c:.1}")).collect();
    let suffix = if center.len() > 8 { ", ..." } else { "" };
    format!("[{}{suffix}]", shown.join(", "))
}
