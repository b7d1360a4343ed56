//! Smart batching — pack proximity groups into size-bounded batches.
//!
//! Small groups are combined greedily and never split across batches.
//! A group larger than the batch size is flushed on its own and cut into
//! consecutive chunks of `max_batch_size`.

use chatmine_core::{Batch, CandidateMessage, Group};
use tracing::debug;

use crate::grouping::group_by_proximity;

pub fn create_batches(groups: Vec<Group>, max_batch_size: usize) -> Vec<Batch> {
    // Options are validated upstream; a zero size would never make progress.
    let max = max_batch_size.max(1);
    let mut batches: Vec<Batch> = Vec::new();
    let mut acc: Batch = Vec::new();

    for group in groups {
        if group.len() > max {
            if !acc.is_empty() {
                batches.push(std::mem::take(&mut acc));
            }
            debug!("Splitting oversized group of {} into chunks of {}", group.len(), max);
            let mut rest = group;
            while rest.len() > max {
                let tail = rest.split_off(max);
                batches.push(rest);
                rest = tail;
            }
            batches.push(rest);
        } else if acc.len() + group.len() <= max {
            acc.extend(group);
        } else {
            batches.push(std::mem::replace(&mut acc, group));
        }
    }
    if !acc.is_empty() {
        batches.push(acc);
    }

    batches
}

/// Group by proximity, then pack.
pub fn batch_candidates(
    candidates: Vec<CandidateMessage>,
    max_batch_size: usize,
    gap: u64,
) -> Vec<Batch> {
    create_batches(group_by_proximity(candidates, gap), max_batch_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, suggestion};

    /// Groups with consecutive ids starting at `start`, one per size.
    fn groups_of(sizes: &[usize]) -> Vec<Group> {
        let mut next = 0u64;
        sizes
            .iter()
            .map(|&n| {
                let g = (next..next + n as u64).map(suggestion).collect();
                next += n as u64 + 100;
                g
            })
            .collect()
    }

    fn sizes(batches: &[Batch]) -> Vec<usize> {
        batches.iter().map(|b| b.len()).collect()
    }

    #[test]
    fn test_combines_small_groups() {
        let batches = create_batches(groups_of(&[2, 2, 2]), 5);
        assert_eq!(sizes(&batches), vec![4, 2]);
    }

    #[test]
    fn test_splits_oversized_group() {
        let batches = create_batches(groups_of(&[15]), 10);
        assert_eq!(sizes(&batches), vec![10, 5]);
        let all: Vec<u64> = batches.iter().flat_map(|b| ids(b)).collect();
        assert_eq!(all, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_oversized_group_never_shares_a_batch() {
        let batches = create_batches(groups_of(&[2, 12, 1]), 5);
        // [2] flushed, 12 -> 5,5,2, then [1] alone
        assert_eq!(sizes(&batches), vec![2, 5, 5, 2, 1]);
    }

    #[test]
    fn test_exact_fit() {
        let batches = create_batches(groups_of(&[3, 2, 5]), 5);
        assert_eq!(sizes(&batches), vec![5, 5]);
    }

    #[test]
    fn test_round_trip_preserves_candidates() {
        let groups = groups_of(&[1, 7, 3, 3, 4, 9, 2]);
        let expected: Vec<u64> = groups.iter().flat_map(|g| ids(g)).collect();
        for max in 1..=10 {
            let batches = create_batches(groups.clone(), max);
            let got: Vec<u64> = batches.iter().flat_map(|b| ids(b)).collect();
            assert_eq!(got, expected, "max_batch_size={}", max);
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= max));
        }
    }

    #[test]
    fn test_batch_candidates_groups_first() {
        let candidates = [40, 1, 2, 41, 3].iter().map(|&id| suggestion(id)).collect();
        let batches = batch_candidates(candidates, 3, 5);
        let got: Vec<Vec<u64>> = batches.iter().map(|b| ids(b)).collect();
        assert_eq!(got, vec![vec![1, 2, 3], vec![40, 41]]);
    }

    #[test]
    fn test_empty() {
        assert!(create_batches(Vec::new(), 10).is_empty());
    }
}
