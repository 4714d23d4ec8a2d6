use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::catalog::{Game, StreamingOffer, StreamingPackage};
use crate::optimizer::{CoverageFailure, OptimizerOptions};

pub type PriceTable = BTreeMap<i64, u32>;

/// Package → covered games, restricted to the games of the requested teams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageIndex {
    pub required_events: BTreeSet<i64>,
    pub coverage: BTreeMap<i64, BTreeSet<i64>>,
    pub prices: PriceTable,
    pub package_names: BTreeMap<i64, String>,
    pub duplicate_edges: usize,
}

impl CoverageIndex {
    pub fn events_of(&self, package_id: i64) -> Option<&BTreeSet<i64>> {
        self.coverage.get(&package_id)
    }

    pub fn price_of(&self, package_id: i64) -> u32 {
        self.prices.get(&package_id).copied().unwrap_or(0)
    }
}

pub fn build_coverage_index(
    teams: &BTreeSet<String>,
    games: &[Game],
    offers: &[StreamingOffer],
    packages: &[StreamingPackage],
    options: &OptimizerOptions,
) -> Result<CoverageIndex, CoverageFailure> {
    let required_events = games
        .iter()
        .filter(|game| game.involves_any(teams))
        .map(|game| game.id)
        .collect::<BTreeSet<_>>();
    if required_events.is_empty() {
        return Err(CoverageFailure::NoGamesFound);
    }

    let by_id = packages
        .iter()
        .map(|package| (package.id, package))
        .collect::<BTreeMap<_, _>>();

    let mut coverage: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    let mut duplicate_edges = 0usize;
    let mut dangling_edges = 0usize;
    for offer in offers {
        if !required_events.contains(&offer.game_id) || !options.coverage.accepts(offer) {
            continue;
        }
        if !by_id.contains_key(&offer.streaming_package_id) {
            dangling_edges += 1;
            continue;
        }
        let inserted = coverage
            .entry(offer.streaming_package_id)
            .or_default()
            .insert(offer.game_id);
        if !inserted {
            duplicate_edges += 1;
        }
    }

    if duplicate_edges > 0 {
        warn!("folded {duplicate_edges} duplicate offers for the same game and package");
    }
    if dangling_edges > 0 {
        warn!("skipped {dangling_edges} offers referencing unknown packages");
    }

    let mut prices = PriceTable::new();
    let mut package_names = BTreeMap::new();
    for package_id in coverage.keys() {
        if let Some(package) = by_id.get(package_id) {
            prices.insert(*package_id, options.price_basis.price_of(package));
            package_names.insert(*package_id, package.name.clone());
        }
    }

    Ok(CoverageIndex {
        required_events,
        coverage,
        prices,
        package_names,
        duplicate_edges,
    })
}
