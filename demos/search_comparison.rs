//! Builds every index family over one dataset and compares their answers
//! against the exact baseline.
//!
//! Usage:
//!
//! ```text
//! cargo run --release --example search_comparison [vectors.idx]
//! ```
//!
//! Without an argument a synthetic blob dataset is generated.

use std::env;
use std::error::Error;
use std::time::{Duration, Instant};

use vecino::benchmark::{clustered_dataset, exact_knn, recall};
use vecino::distance::euclidean;
use vecino::{
    Approximator, CubeIndex, CubeParams, DataSet, GnnIndex, GnnParams, LshIndex, LshParams,
    MrngIndex, MrngParams, Neighbor,
};

const K: usize = 10;
const QUERIES: usize = 50;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dataset = match env::args().nth(1) {
        Some(path) => DataSet::load_limited(path, 10_000)?,
        None => clustered_dataset(10, 200, 16, 5.0, Some(1))?,
    };
    println!(
        "dataset: {} points, {} dimensions\n",
        dataset.len(),
        dataset.dim()
    );

    let step = (dataset.len() / QUERIES).max(1);
    let queries: Vec<Vec<u8>> = (0..QUERIES)
        .map(|i| dataset.point(i * step % dataset.len()).data().to_vec())
        .collect();
    let truth: Vec<Vec<Neighbor>> = queries
        .iter()
        .map(|q| exact_knn(&dataset, q, K, euclidean))
        .collect();

    report("exact", Duration::ZERO, &queries, &truth, |q| {
        Ok(exact_knn(&dataset, q, K, euclidean))
    })?;

    let started = Instant::now();
    let lsh = LshIndex::new(&dataset, &LshParams::default().with_seed(1))?;
    report("lsh", started.elapsed(), &queries, &truth, |q| {
        lsh.knn(q, K, euclidean)
    })?;

    let cube_params = CubeParams {
        window: 2600,
        dimensions: 7,
        probes: 40,
        max_candidates: 400,
        seed: Some(1),
    };
    let started = Instant::now();
    let cube = CubeIndex::new(&dataset, &cube_params)?;
    report("hypercube", started.elapsed(), &queries, &truth, |q| {
        cube.knn(q, K, euclidean)
    })?;

    let approx = Approximator::Lsh(LshIndex::new(&dataset, &LshParams::default().with_seed(1))?);

    let started = Instant::now();
    let gnn = GnnIndex::build(&approx, euclidean, &GnnParams::default().with_seed(1))?;
    report("gnn", started.elapsed(), &queries, &truth, |q| {
        gnn.query(q, K)
    })?;

    let started = Instant::now();
    let mrng = MrngIndex::build(&approx, euclidean, &MrngParams::default())?;
    report("mrng", started.elapsed(), &queries, &truth, |q| {
        mrng.query(q, K, 80)
    })?;

    Ok(())
}

fn report<F>(
    name: &str,
    build: Duration,
    queries: &[Vec<u8>],
    truth: &[Vec<Neighbor>],
    mut search: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&[u8]) -> vecino::Result<Vec<Neighbor>>,
{
    let started = Instant::now();
    let mut total_recall = 0.0;
    for (query, exact) in queries.iter().zip(truth) {
        let found = search(query)?;
        total_recall += recall(&found, exact);
    }
    let elapsed = started.elapsed();
    println!(
        "{name:>10}: build {build:>12?}, {} queries in {elapsed:>12?}, mean recall@{K} {:.3}",
        queries.len(),
        total_recall / queries.len() as f64
    );
    Ok(())
}
