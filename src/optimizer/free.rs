use crate::optimizer::index::CoverageIndex;
use crate::optimizer::SelectionState;

/// Takes every zero-price package that still adds coverage, in ascending id
/// order. Single pass: a free package skipped here is never revisited.
pub fn preselect_free_packages(index: &CoverageIndex, state: SelectionState) -> SelectionState {
    index
        .coverage
        .iter()
        .filter(|(package_id, _)| index.price_of(**package_id) == 0)
        .fold(state, |state, (package_id, events)| {
            if state.uncovered_count(events) == 0 {
                return state;
            }
            state.with_package(*package_id, 0, events)
        })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use crate::optimizer::free::preselect_free_packages;
    use crate::optimizer::index::CoverageIndex;
    use crate::optimizer::SelectionState;

    fn index(entries: &[(i64, u32, &[i64])]) -> CoverageIndex {
        let mut coverage = BTreeMap::new();
        let mut prices = BTreeMap::new();
        let mut required_events = BTreeSet::new();
        for (id, price, events) in entries {
            coverage.insert(*id, events.iter().copied().collect::<BTreeSet<_>>());
            prices.insert(*id, *price);
            required_events.extend(events.iter().copied());
        }
        CoverageIndex {
            required_events,
            coverage,
            prices,
            ..CoverageIndex::default()
        }
    }

    #[test]
    fn selects_free_packages_in_id_order() {
        let index = index(&[(3, 0, &[2]), (1, 0, &[1]), (2, 400, &[1, 2, 3])]);
        let state = preselect_free_packages(&index, SelectionState::default());

        let ids = state.selected.iter().map(|s| s.package_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(state.covered_events, [1, 2].into_iter().collect());
        assert!(state.selected.iter().all(|s| s.price_cents == 0));
    }

    #[test]
    fn skips_free_packages_without_new_coverage() {
        let index = index(&[(1, 0, &[1, 2]), (2, 0, &[2]), (3, 0, &[1])]);
        let state = preselect_free_packages(&index, SelectionState::default());

        assert_eq!(state.selected.len(), 1);
        assert_eq!(state.selected[0].package_id, 1);
        assert_eq!(state.selected[0].newly_covered, 2);
    }

    #[test]
    fn leaves_paid_packages_alone() {
        let index = index(&[(1, 100, &[1])]);
        let state = preselect_free_packages(&index, SelectionState::default());
        assert_eq!(state, SelectionState::default());
    }
}
