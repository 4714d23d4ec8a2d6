use crate::optimizer::index::CoverageIndex;
use crate::optimizer::{PackageCombination, SelectedPackage, SelectionState};

pub fn assemble_combination(index: &CoverageIndex, state: &SelectionState) -> PackageCombination {
    let selected_packages = state
        .selected
        .iter()
        .map(|selection| SelectedPackage {
            package_id: selection.package_id,
            name: index
                .package_names
                .get(&selection.package_id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", selection.package_id)),
            price_cents: selection.price_cents,
            newly_covered_games: selection.newly_covered,
        })
        .collect::<Vec<_>>();
    let total_price_cents = selected_packages
        .iter()
        .map(|p| u64::from(p.price_cents))
        .sum();

    PackageCombination {
        selected_packages,
        total_price_cents,
        required_games: index.required_events.len(),
    }
}
