//! Per-tournament availability grid for the games of a set of teams.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSource, Game, StreamingOffer};
use crate::optimizer::{compute_optimal_combination, CoverageFailure, OptimizerOptions};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonMatrix {
    pub total_tournaments: usize,
    pub total_games: usize,
    pub total_price_cents: Option<u64>,
    pub optimizer_failure: Option<CoverageFailure>,
    pub tournaments: Vec<TournamentComparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentComparison {
    pub competition: String,
    pub games: Vec<MatchEntry>,
    pub packages: Vec<PackageAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntry {
    pub game_id: i64,
    #[serde(rename = "match")]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageAvailability {
    pub package_id: i64,
    pub name: String,
    pub live: Vec<bool>,
    pub highlights: Vec<bool>,
    pub in_optimal_combination: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    live: bool,
    highlights: bool,
}

/// An empty team set lists every game in the catalog and skips the optimizer.
pub fn build_comparison(
    source: &dyn CatalogSource,
    teams: &BTreeSet<String>,
    options: &OptimizerOptions,
) -> Result<std::result::Result<ComparisonMatrix, CoverageFailure>> {
    let (games, optimal, optimizer_failure) = if teams.is_empty() {
        (source.all_events()?, None, None)
    } else {
        let (optimal, failure) = match compute_optimal_combination(source, teams, options)? {
            Ok(combination) => (Some(combination), None),
            Err(CoverageFailure::CannotCoverAllGames) => {
                (None, Some(CoverageFailure::CannotCoverAllGames))
            }
            Err(failure) => return Ok(Err(failure)),
        };
        (source.events_for_teams(teams)?, optimal, failure)
    };

    let event_ids = games.iter().map(|g| g.id).collect::<BTreeSet<_>>();
    let offers = source.edges_for_events(&event_ids)?;
    let package_ids = offers
        .iter()
        .map(|o| o.streaming_package_id)
        .collect::<BTreeSet<_>>();
    let names = source
        .packages_by_ids(&package_ids)?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect::<BTreeMap<_, _>>();
    let flags = fold_offers(&offers);

    let mut by_tournament: BTreeMap<&str, Vec<&Game>> = BTreeMap::new();
    for game in &games {
        by_tournament
            .entry(game.tournament_name.as_str())
            .or_default()
            .push(game);
    }

    let mut tournaments = Vec::with_capacity(by_tournament.len());
    for (competition, mut tournament_games) in by_tournament {
        tournament_games.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));

        let mut packages = Vec::new();
        for (package_id, name) in &names {
            if !flags_present(&flags, *package_id, &tournament_games) {
                continue;
            }
            let row = tournament_games
                .iter()
                .map(|g| {
                    flags
                        .get(&(g.id, *package_id))
                        .copied()
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>();
            packages.push(PackageAvailability {
                package_id: *package_id,
                name: name.clone(),
                live: row.iter().map(|f| f.live).collect(),
                highlights: row.iter().map(|f| f.highlights).collect(),
                in_optimal_combination: optimal
                    .as_ref()
                    .map(|c| c.contains(*package_id))
                    .unwrap_or(false),
            });
        }

        tournaments.push(TournamentComparison {
            competition: competition.to_string(),
            games: tournament_games
                .iter()
                .map(|g| MatchEntry {
                    game_id: g.id,
                    label: g.match_label(),
                })
                .collect(),
            packages,
        });
    }

    Ok(Ok(ComparisonMatrix {
        total_tournaments: tournaments.len(),
        total_games: games.len(),
        total_price_cents: optimal.as_ref().map(|c| c.total_price_cents),
        optimizer_failure,
        tournaments,
    }))
}

/// Duplicate offers for a (game, package) pair are OR-ed together.
fn fold_offers(offers: &[StreamingOffer]) -> BTreeMap<(i64, i64), Flags> {
    let mut flags: BTreeMap<(i64, i64), Flags> = BTreeMap::new();
    for offer in offers {
        let entry = flags
            .entry((offer.game_id, offer.streaming_package_id))
            .or_default();
        entry.live |= offer.live;
        entry.highlights |= offer.highlights;
    }
    flags
}

fn flags_present(flags: &BTreeMap<(i64, i64), Flags>, package_id: i64, games: &[&Game]) -> bool {
    games
        .iter()
        .any(|g| flags.contains_key(&(g.id, package_id)))
}
