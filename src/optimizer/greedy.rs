use tracing::debug;

use crate::optimizer::index::CoverageIndex;
use crate::optimizer::{CoverageFailure, SelectionState};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    package_id: i64,
    value: f64,
}

/// Adds paid packages by best newly-covered-games per cent until every
/// required game is covered. This is the classic greedy set-cover
/// approximation, not an exact minimum.
pub fn solve_greedy(
    index: &CoverageIndex,
    mut state: SelectionState,
) -> Result<SelectionState, CoverageFailure> {
    while !state.covers(&index.required_events) {
        let Some(best) = best_candidate(index, &state) else {
            return Err(CoverageFailure::CannotCoverAllGames);
        };
        let Some(events) = index.events_of(best.package_id) else {
            return Err(CoverageFailure::CannotCoverAllGames);
        };
        debug!(
            "greedy pick: package {} (value {:.6})",
            best.package_id, best.value
        );
        state = state.with_package(best.package_id, index.price_of(best.package_id), events);
    }
    Ok(state)
}

/// Strictly greatest value wins; on ties the lowest package id is kept.
fn best_candidate(index: &CoverageIndex, state: &SelectionState) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for (package_id, events) in &index.coverage {
        let price = index.price_of(*package_id);
        if price == 0 || state.is_selected(*package_id) {
            continue;
        }
        let uncovered = state.uncovered_count(events);
        if uncovered == 0 {
            continue;
        }
        let value = uncovered as f64 / f64::from(price);
        if best.map(|b| value > b.value).unwrap_or(true) {
            best = Some(Candidate {
                package_id: *package_id,
                value,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use crate::optimizer::greedy::{best_candidate, solve_greedy};
    use crate::optimizer::index::CoverageIndex;
    use crate::optimizer::{CoverageFailure, SelectionState};

    fn index(required: &[i64], entries: &[(i64, u32, &[i64])]) -> CoverageIndex {
        let mut coverage = BTreeMap::new();
        let mut prices = BTreeMap::new();
        for (id, price, events) in entries {
            coverage.insert(*id, events.iter().copied().collect::<BTreeSet<_>>());
            prices.insert(*id, *price);
        }
        CoverageIndex {
            required_events: required.iter().copied().collect(),
            coverage,
            prices,
            ..CoverageIndex::default()
        }
    }

    fn picked(state: &SelectionState) -> Vec<i64> {
        state.selected.iter().map(|s| s.package_id).collect()
    }

    #[test]
    fn prefers_more_games_per_cent() {
        let index = index(&[1, 2], &[(1, 500, &[1]), (2, 300, &[1, 2])]);
        let state = solve_greedy(&index, SelectionState::default()).expect("coverage");
        assert_eq!(picked(&state), vec![2]);
    }

    #[test]
    fn recomputes_value_against_remaining_games() {
        // Round one: 1 covers 3 games for 600 (0.005) beating 2 and 3 (0.004).
        // Round two: only game 4 and 5 are left.
        let index = index(
            &[1, 2, 3, 4, 5],
            &[
                (1, 600, &[1, 2, 3]),
                (2, 500, &[1, 4]),
                (3, 250, &[5]),
                (4, 1_000, &[4, 5]),
            ],
        );
        let state = solve_greedy(&index, SelectionState::default()).expect("coverage");
        assert_eq!(picked(&state), vec![1, 3, 2]);
        assert_eq!(state.selected[2].newly_covered, 1);
    }

    #[test]
    fn ties_keep_lowest_package_id() {
        let index = index(&[1, 2], &[(7, 200, &[1, 2]), (3, 100, &[1]), (5, 200, &[1, 2])]);
        let best = best_candidate(&index, &SelectionState::default()).expect("candidate");
        assert_eq!(best.package_id, 3);

        let state = solve_greedy(&index, SelectionState::default()).expect("coverage");
        assert_eq!(picked(&state)[0], 3);
        assert_eq!(picked(&state)[1], 5);
    }

    #[test]
    fn fails_without_partial_result_when_a_game_is_uncovered() {
        let index = index(&[1, 2], &[(1, 100, &[1])]);
        let result = solve_greedy(&index, SelectionState::default());
        assert_eq!(result, Err(CoverageFailure::CannotCoverAllGames));
    }

    #[test]
    fn ignores_free_and_already_selected_packages() {
        let index = index(&[1, 2], &[(1, 0, &[2]), (2, 100, &[1])]);
        let state = SelectionState::default().with_package(1, 0, &[2].into_iter().collect());
        let state = solve_greedy(&index, state).expect("coverage");
        assert_eq!(picked(&state), vec![1, 2]);

        let stuck = solve_greedy(&index, SelectionState::default());
        assert_eq!(stuck, Err(CoverageFailure::CannotCoverAllGames));
    }

    #[test]
    fn already_covered_state_is_returned_unchanged() {
        let index = index(&[1], &[(1, 0, &[1]), (2, 100, &[1])]);
        let state = SelectionState::default().with_package(1, 0, &[1].into_iter().collect());
        let solved = solve_greedy(&index, state.clone()).expect("coverage");
        assert_eq!(solved, state);
    }
}
