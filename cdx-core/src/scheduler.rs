//! Greedy longest-processing-time-first work partitioner.
//!
//! Reimplemented verbatim from the original extractor's `balanced_chunks`:
//! a simple static scheduler with no knowledge of what it is scheduling.
//! The thread/process pool that would consume its output is out of scope
//! (SPEC_FULL.md §1); this module only produces the bucket assignment.

/// Anything that can report a scalar scheduling weight.
pub trait Weighted {
    fn weight(&self) -> u64;
}

/// Partitions `items` into `n` buckets of roughly equal total weight.
///
/// Sorts items by descending weight, then greedily assigns each one to
/// whichever bucket currently holds the smallest running total. Returns the
/// original indices into `items`, grouped by bucket, so callers can look up
/// whatever payload they associated with each item.
///
/// `n == 0` returns no buckets and drops all items; callers are expected to
/// pass at least one bucket.
pub fn balanced_chunks<T: Weighted>(items: &[T], n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(items[i].weight()));

    let mut chunks: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sums = vec![0u64; n];

    for i in order {
        let (bucket, _) = sums
            .iter()
            .enumerate()
            .min_by_key(|&(_, &sum)| sum)
            .expect("n > 0");
        chunks[bucket].push(i);
        sums[bucket] += items[i].weight();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(u64);

    impl Weighted for Item {
        fn weight(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn distributes_heaviest_items_first() {
        let items = vec![Item(10), Item(1), Item(1), Item(8)];
        let chunks = balanced_chunks(&items, 2);

        assert_eq!(chunks.len(), 2);
        let totals: Vec<u64> = chunks
            .iter()
            .map(|c| c.iter().map(|&i| items[i].weight()).sum())
            .collect();
        // The 10 and 8 land in separate buckets, each then picking up a 1.
        assert_eq!(totals.iter().sum::<u64>(), 20);
        assert!((totals[0] as i64 - totals[1] as i64).abs() <= 2);
    }

    #[test]
    fn every_item_is_assigned_exactly_once() {
        let items = vec![Item(3), Item(7), Item(2), Item(9), Item(1)];
        let chunks = balanced_chunks(&items, 3);
        let mut seen: Vec<usize> = chunks.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_buckets_yields_no_chunks() {
        let items = vec![Item(1)];
        assert!(balanced_chunks(&items, 0).is_empty());
    }
}
