//! Distance capabilities injected into indexes and clusterers.
//!
//! The engine stores raw byte vectors but maintains `f64` centers, so every
//! query path is generic over the element pairing it compares: point against
//! point (`u8`/`u8`), point against center (`u8`/`f64`), or center against
//! center (`f64`/`f64`). A metric is a plain function pointer, which keeps
//! indexes `Send + Sync` and queries shareable across threads.

/// A distance function over two vectors.
///
/// By convention the first argument is the stored dataset vector and the
/// second is the query (a raw point or a cluster center). Implementations
/// must satisfy `dist(a, b) == dist(b, a)` for same-typed arguments and
/// `dist(a, a) == 0`.
pub type Metric<A, B> = fn(&[A], &[B]) -> f64;

/// Euclidean (L2) distance, generic over element pairings.
///
/// Panics if the slices differ in length. Public index and clusterer entry
/// points validate query dimensions first and surface
/// [`SearchError::DimensionMismatch`](crate::SearchError::DimensionMismatch),
/// so the panic only guards internal misuse.
#[inline]
#[must_use]
pub fn euclidean<A, B>(a: &[A], b: &[B]) -> f64
where
    A: Copy + Into<f64>,
    B: Copy + Into<f64>,
{
    assert_eq!(a.len(), b.len(), "euclidean over mismatched lengths");
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x.into() - y.into();
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Dot product of a projection direction with a vector.
#[inline]
#[must_use]
pub fn dot<T>(direction: &[f64], v: &[T]) -> f64
where
    T: Copy + Into<f64>,
{
    assert_eq!(direction.len(), v.len(), "dot over mismatched lengths");
    direction
        .iter()
        .zip(v.iter())
        .map(|(&d, &x)| d * x.into())
        .sum()
}
