//! Property tests for query tree flattening

use proptest::prelude::*;
use trellis_core::{Filter, Query};

proptest! {
    /// The number of chains is the product of the branch counts of each step
    #[test]
    fn leaf_count_is_product_of_branchings(widths in proptest::collection::vec(0usize..4, 0..5)) {
        let mut extender = Query::path();
        let mut expected = 1usize;
        for (step, width) in widths.iter().enumerate() {
            let branches: Vec<Vec<Filter>> = (0..*width)
                .map(|b| vec![Filter::id(format!("{}-{}", step, b))])
                .collect();
            extender = extender.with_branches(branches);
            expected *= (*width).max(1);
        }
        let query = extender.get();
        prop_assert_eq!(query.leaf_count(), expected);
        prop_assert_eq!(query.filters().len(), expected);
    }

    /// Non-branching extension lands on every chain
    #[test]
    fn with_appends_to_all_chains(width in 1usize..5, tail in 1usize..4) {
        let branches: Vec<Vec<Filter>> = (0..width).map(|b| vec![Filter::id(b.to_string())]).collect();
        let query = Query::path()
            .with_branches(branches)
            .filter()
            .with((0..tail).map(|t| Filter::id(format!("tail-{}", t))))
            .get();
        for chain in query.fragment_chains() {
            prop_assert_eq!(chain.len(), 1 + tail);
            prop_assert!(chain[0].is_path());
            prop_assert!(chain[1..].iter().all(|f| !f.is_path()));
        }
    }
}
