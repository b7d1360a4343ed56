//! Proximity grouping — candidates close together in the transcript are
//! treated as one discussion.

use chatmine_core::{CandidateMessage, Group};

/// Split candidates into groups of ascending ids where consecutive ids are at
/// most `gap` apart.
pub fn group_by_proximity(mut candidates: Vec<CandidateMessage>, gap: u64) -> Vec<Group> {
    candidates.sort_by_key(|c| c.message_id);

    let mut groups: Vec<Group> = Vec::new();
    let mut current: Group = Vec::new();

    for candidate in candidates {
        if let Some(last) = current.last() {
            if candidate.message_id - last.message_id > gap {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(candidate);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ids, suggestion};
    use chatmine_core::config::DEFAULT_PROXIMITY_GAP;

    fn group_ids(groups: &[Group]) -> Vec<Vec<u64>> {
        groups.iter().map(|g| ids(g)).collect()
    }

    fn at(ids: &[u64]) -> Vec<CandidateMessage> {
        ids.iter().map(|&id| suggestion(id)).collect()
    }

    #[test]
    fn test_close_ids_share_a_group() {
        let groups = group_by_proximity(at(&[1, 3]), DEFAULT_PROXIMITY_GAP);
        assert_eq!(group_ids(&groups), vec![vec![1, 3]]);
    }

    #[test]
    fn test_distant_ids_split() {
        let groups = group_by_proximity(at(&[1, 3, 20, 22]), DEFAULT_PROXIMITY_GAP);
        assert_eq!(group_ids(&groups), vec![vec![1, 3], vec![20, 22]]);
    }

    #[test]
    fn test_gap_is_inclusive() {
        let groups = group_by_proximity(at(&[10, 15]), 5);
        assert_eq!(groups.len(), 1);
        let groups = group_by_proximity(at(&[10, 16]), 5);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_gap_measured_from_last_member() {
        // Chained: each step is within the gap even though 0..20 is not
        let groups = group_by_proximity(at(&[0, 5, 10, 15, 20]), 5);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let unsorted = group_by_proximity(at(&[20, 1, 3]), DEFAULT_PROXIMITY_GAP);
        let sorted = group_by_proximity(at(&[1, 3, 20]), DEFAULT_PROXIMITY_GAP);
        assert_eq!(group_ids(&unsorted), group_ids(&sorted));
        assert_eq!(group_ids(&unsorted), vec![vec![1, 3], vec![20]]);
    }

    #[test]
    fn test_empty() {
        assert!(group_by_proximity(Vec::new(), DEFAULT_PROXIMITY_GAP).is_empty());
    }
}
