//! Property-based tests for the search and clustering primitives.
//!
//! These verify invariants that should hold regardless of input:
//! - the injected distance satisfies metric-space properties
//! - dataset labels stay dense and 1-based
//! - seeded index construction is reproducible
//! - recall is always in [0, 1]

use proptest::prelude::*;

prop_compose! {
    fn arb_vector(dim: usize)(vec in prop::collection::vec(any::<u8>(), dim)) -> Vec<u8> {
        vec
    }
}

prop_compose! {
    fn arb_vectors(n: usize, dim: usize)(
        vecs in prop::collection::vec(prop::collection::vec(any::<u8>(), dim), 1..n)
    ) -> Vec<Vec<u8>> {
        vecs
    }
}

mod distance_props {
    use super::*;
    use vecino::distance::euclidean;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn euclidean_non_negative(
            a in arb_vector(32),
            b in arb_vector(32),
        ) {
            let dist = euclidean(&a, &b);
            prop_assert!(dist >= 0.0, "distance must be non-negative, got {}", dist);
        }

        #[test]
        fn euclidean_symmetric(
            a in arb_vector(32),
            b in arb_vector(32),
        ) {
            prop_assert_eq!(euclidean(&a, &b), euclidean(&b, &a));
        }

        #[test]
        fn euclidean_self_is_zero(
            a in arb_vector(48),
        ) {
            prop_assert_eq!(euclidean(&a, &a), 0.0);
        }

        #[test]
        fn euclidean_triangle_inequality(
            a in arb_vector(16),
            b in arb_vector(16),
            c in arb_vector(16),
        ) {
            let d_ac = euclidean(&a, &c);
            let d_ab = euclidean(&a, &b);
            let d_bc = euclidean(&b, &c);
            prop_assert!(
                d_ac <= d_ab + d_bc + 1e-9,
                "triangle inequality violated: {} > {} + {}",
                d_ac, d_ab, d_bc
            );
        }
    }
}

mod dataset_props {
    use super::*;
    use vecino::DataSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn labels_are_dense_and_ordered(vectors in arb_vectors(40, 6)) {
            let count = vectors.len();
            let ds = DataSet::from_vectors(vectors).unwrap();
            prop_assert_eq!(ds.len(), count);
            for (index, point) in ds.iter().enumerate() {
                prop_assert_eq!(point.label() as usize, index + 1);
            }
        }

        #[test]
        fn label_lookup_round_trips(vectors in arb_vectors(30, 4)) {
            let ds = DataSet::from_vectors(vectors).unwrap();
            for point in &ds {
                let looked_up = ds.by_label(point.label());
                prop_assert_eq!(looked_up.label(), point.label());
                prop_assert_eq!(looked_up.data(), point.data());
            }
        }
    }
}

mod lsh_props {
    use super::*;
    use vecino::distance::euclidean;
    use vecino::{DataSet, LshIndex, LshParams};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn answers_are_reproducible_per_seed(
            vectors in arb_vectors(32, 8),
            seed in any::<u64>(),
            k in 1usize..8,
        ) {
            let ds = DataSet::from_vectors(vectors).unwrap();
            let params = LshParams {
                window: 300,
                hashes_per_table: 2,
                tables: 4,
                table_size: None,
                seed: Some(seed),
            };
            let first = LshIndex::new(&ds, &params).unwrap();
            let second = LshIndex::new(&ds, &params).unwrap();

            let query = ds.point(0).data().to_vec();
            prop_assert_eq!(
                first.knn(&query, k, euclidean).unwrap(),
                second.knn(&query, k, euclidean).unwrap()
            );
            prop_assert_eq!(
                first.range_search(&query, 64.0, euclidean).unwrap(),
                second.range_search(&query, 64.0, euclidean).unwrap()
            );
        }

        #[test]
        fn knn_is_sorted_bounded_and_finds_its_duplicate(
            vectors in arb_vectors(32, 8),
            k in 1usize..8,
        ) {
            let ds = DataSet::from_vectors(vectors).unwrap();
            let params = LshParams::default().with_seed(17);
            let index = LshIndex::new(&ds, &params).unwrap();

            // the query duplicates a stored point, so it collides with it
            // in every table and the top hit is exact
            let query = ds.point(0).data().to_vec();
            let found = index.knn(&query, k, euclidean).unwrap();

            prop_assert!(found.len() <= k);
            prop_assert!(!found.is_empty());
            prop_assert_eq!(found[0].1, 0.0);
            for pair in found.windows(2) {
                prop_assert!(pair[0].1 <= pair[1].1, "unsorted: {:?}", found);
            }
            for &(label, _) in &found {
                prop_assert!(label >= 1 && label as usize <= ds.len());
            }
        }
    }
}

mod recall_props {
    use super::*;
    use vecino::benchmark::recall;
    use vecino::Neighbor;

    prop_compose! {
        fn arb_answer()(
            pairs in prop::collection::vec((1u32..64, 0.0f64..100.0), 0..24)
        ) -> Vec<Neighbor> {
            pairs
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn recall_in_unit_interval(found in arb_answer(), truth in arb_answer()) {
            let r = recall(&found, &truth);
            prop_assert!((0.0..=1.0).contains(&r), "recall out of range: {}", r);
        }

        #[test]
        fn perfect_recall_when_identical(truth in arb_answer()) {
            prop_assert_eq!(recall(&truth, &truth), 1.0);
        }

        #[test]
        fn zero_recall_on_disjoint_labels(
            truth in prop::collection::vec((1u32..50, 0.0f64..10.0), 1..16),
        ) {
            let found: Vec<Neighbor> = truth
                .iter()
                .map(|&(label, distance)| (label + 100, distance))
                .collect();
            prop_assert_eq!(recall(&found, &truth), 0.0);
        }
    }
}
