pub mod assemble;
pub mod free;
pub mod greedy;
pub mod index;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{CatalogSource, StreamingOffer, StreamingPackage};
use crate::optimizer::assemble::assemble_combination;
use crate::optimizer::free::preselect_free_packages;
use crate::optimizer::greedy::solve_greedy;
use crate::optimizer::index::{build_coverage_index, CoverageIndex};

/// Which offer flags make an offer count as coverage of its game.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRequirement {
    #[default]
    Any,
    Live,
    Highlights,
    LiveAndHighlights,
}

impl CoverageRequirement {
    pub fn accepts(&self, offer: &StreamingOffer) -> bool {
        match self {
            Self::Any => true,
            Self::Live => offer.live,
            Self::Highlights => offer.highlights,
            Self::LiveAndHighlights => offer.live && offer.highlights,
        }
    }

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Live => "live",
            Self::Highlights => "highlights",
            Self::LiveAndHighlights => "live_and_highlights",
        }
    }
}

impl Display for CoverageRequirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown coverage requirement: {0}")]
pub struct CoverageRequirementParseError(pub String);

impl FromStr for CoverageRequirement {
    type Err = CoverageRequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "any" | "all" => Ok(Self::Any),
            "live" => Ok(Self::Live),
            "highlights" => Ok(Self::Highlights),
            "live_and_highlights" | "both" => Ok(Self::LiveAndHighlights),
            _ => Err(CoverageRequirementParseError(s.to_string())),
        }
    }
}

/// Which of a package's two prices the optimizer minimizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    #[default]
    Monthly,
    YearlySubscription,
}

impl PriceBasis {
    /// Packages without a yearly plan keep their monthly price under
    /// `YearlySubscription`.
    pub fn price_of(&self, package: &StreamingPackage) -> u32 {
        match self {
            Self::Monthly => package.monthly_price(),
            Self::YearlySubscription => package
                .monthly_price_yearly_subscription_in_cents
                .unwrap_or_else(|| package.monthly_price()),
        }
    }

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::YearlySubscription => "yearly_subscription",
        }
    }
}

impl Display for PriceBasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown price basis: {0}")]
pub struct PriceBasisParseError(pub String);

impl FromStr for PriceBasis {
    type Err = PriceBasisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" | "yearly_subscription" | "annual" => Ok(Self::YearlySubscription),
            _ => Err(PriceBasisParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptimizerOptions {
    #[serde(default)]
    pub coverage: CoverageRequirement,
    #[serde(default)]
    pub price_basis: PriceBasis,
}

#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoverageFailure {
    #[error("At least one team is required.")]
    EmptyTeamSet,
    #[error("No games found for the specified teams.")]
    NoGamesFound,
    #[error("Cannot cover all games with available packages.")]
    CannotCoverAllGames,
}

/// One package in the order the optimizer picked it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedPackage {
    pub package_id: i64,
    pub name: String,
    pub price_cents: u32,
    pub newly_covered_games: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageCombination {
    pub selected_packages: Vec<SelectedPackage>,
    pub total_price_cents: u64,
    pub required_games: usize,
}

impl PackageCombination {
    pub fn contains(&self, package_id: i64) -> bool {
        self.selected_packages
            .iter()
            .any(|p| p.package_id == package_id)
    }
}

pub type CoverageResult = std::result::Result<PackageCombination, CoverageFailure>;

/// A package the solver has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub package_id: i64,
    pub price_cents: u32,
    pub newly_covered: usize,
}

/// Solver progress. Each step consumes the previous state and returns the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub covered_events: BTreeSet<i64>,
    pub selected: Vec<Selection>,
}

impl SelectionState {
    pub fn is_selected(&self, package_id: i64) -> bool {
        self.selected.iter().any(|s| s.package_id == package_id)
    }

    pub fn uncovered_count(&self, events: &BTreeSet<i64>) -> usize {
        events.difference(&self.covered_events).count()
    }

    pub fn covers(&self, required: &BTreeSet<i64>) -> bool {
        required.is_subset(&self.covered_events)
    }

    pub fn with_package(mut self, package_id: i64, price_cents: u32, events: &BTreeSet<i64>) -> Self {
        let newly_covered = self.uncovered_count(events);
        self.covered_events.extend(events.iter().copied());
        self.selected.push(Selection {
            package_id,
            price_cents,
            newly_covered,
        });
        self
    }
}

/// Free pre-pass, greedy solve, assembly. Pure over the index.
pub fn solve(index: &CoverageIndex) -> CoverageResult {
    let state = preselect_free_packages(index, SelectionState::default());
    let state = solve_greedy(index, state)?;
    Ok(assemble_combination(index, &state))
}

pub fn compute_optimal_combination(
    source: &dyn CatalogSource,
    teams: &BTreeSet<String>,
    options: &OptimizerOptions,
) -> Result<CoverageResult> {
    if teams.is_empty() {
        return Ok(Err(CoverageFailure::EmptyTeamSet));
    }

    let games = source.events_for_teams(teams)?;
    if games.is_empty() {
        info!("no games found for {} requested teams", teams.len());
        return Ok(Err(CoverageFailure::NoGamesFound));
    }
    let event_ids = games.iter().map(|g| g.id).collect::<BTreeSet<_>>();
    let offers = source.edges_for_events(&event_ids)?;
    let package_ids = offers
        .iter()
        .map(|o| o.streaming_package_id)
        .collect::<BTreeSet<_>>();
    let packages = source.packages_by_ids(&package_ids)?;

    let index = match build_coverage_index(teams, &games, &offers, &packages, options) {
        Ok(index) => index,
        Err(failure) => return Ok(Err(failure)),
    };
    debug!(
        "coverage index: {} required games, {} candidate packages ({}, {})",
        index.required_events.len(),
        index.coverage.len(),
        options.coverage,
        options.price_basis
    );

    let result = solve(&index);
    match &result {
        Ok(combination) => debug!(
            "selected {} packages for {} cents",
            combination.selected_packages.len(),
            combination.total_price_cents
        ),
        Err(failure) => info!("optimization failed: {failure}"),
    }
    Ok(result)
}

/// Collects team labels verbatim. Labels may contain commas or surrounding
/// spaces; only empty values are dropped.
pub fn collect_teams<'a>(raw: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    raw.into_iter()
        .filter(|team| !team.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collects team names from repeated and comma-separated values.
pub fn parse_teams<'a>(raw: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    raw.into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|team| !team.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::catalog::fixtures::{game, offer, package};
    use crate::catalog::{Catalog, StreamingOffer};
    use crate::optimizer::{
        collect_teams, compute_optimal_combination, parse_teams, CoverageFailure,
        CoverageRequirement, OptimizerOptions, PriceBasis,
    };

    #[test]
    fn parses_repeated_and_comma_separated_teams() {
        let teams = parse_teams(["Bayern München, Hamburger SV", " ", "Bayern München"]);
        assert_eq!(teams.len(), 2);
        assert!(teams.contains("Hamburger SV"));
        assert!(parse_teams([",, "]).is_empty());
    }

    #[test]
    fn collected_teams_keep_commas_in_labels() {
        let teams = collect_teams(["Brighton & Hove, Albion", "", "TeamX"]);
        assert_eq!(teams.len(), 2);
        assert!(teams.contains("Brighton & Hove, Albion"));

        let catalog = Catalog::new(
            vec![game(1, "Brighton & Hove, Albion", "TeamY")],
            vec![package(1, Some(700))],
            vec![offer(1, 1)],
        );
        let combination = compute_optimal_combination(
            &catalog,
            &collect_teams(["Brighton & Hove, Albion"]),
            &OptimizerOptions::default(),
        )
        .expect("catalog fault")
        .expect("coverage");
        assert_eq!(combination.total_price_cents, 700);

        let split = compute_optimal_combination(
            &catalog,
            &parse_teams(["Brighton & Hove, Albion"]),
            &OptimizerOptions::default(),
        )
        .expect("catalog fault");
        assert_eq!(split, Err(CoverageFailure::NoGamesFound));
    }

    #[test]
    fn parses_requirement_and_basis_slugs() {
        assert_eq!(
            CoverageRequirement::from_str("live-and-highlights").expect("parse"),
            CoverageRequirement::LiveAndHighlights
        );
        assert_eq!(
            PriceBasis::from_str("Yearly").expect("parse"),
            PriceBasis::YearlySubscription
        );
        assert!(CoverageRequirement::from_str("replay").is_err());
    }

    #[test]
    fn requirement_checks_offer_flags() {
        let highlights_only = StreamingOffer {
            game_id: 1,
            streaming_package_id: 1,
            live: false,
            highlights: true,
        };
        assert!(CoverageRequirement::Any.accepts(&highlights_only));
        assert!(CoverageRequirement::Highlights.accepts(&highlights_only));
        assert!(!CoverageRequirement::Live.accepts(&highlights_only));
        assert!(!CoverageRequirement::LiveAndHighlights.accepts(&highlights_only));
    }

    #[test]
    fn yearly_basis_falls_back_to_monthly_price() {
        let mut with_yearly = package(1, Some(999));
        with_yearly.monthly_price_yearly_subscription_in_cents = Some(799);
        let monthly_only = package(2, Some(1_499));

        assert_eq!(PriceBasis::YearlySubscription.price_of(&with_yearly), 799);
        assert_eq!(PriceBasis::YearlySubscription.price_of(&monthly_only), 1_499);
        assert_eq!(PriceBasis::Monthly.price_of(&with_yearly), 999);
    }

    #[test]
    fn empty_team_set_is_rejected_before_querying() {
        let catalog = Catalog::default();
        let result = compute_optimal_combination(
            &catalog,
            &Default::default(),
            &OptimizerOptions::default(),
        )
        .expect("catalog fault");
        assert_eq!(result, Err(CoverageFailure::EmptyTeamSet));
    }

    #[test]
    fn picks_cheaper_package_under_yearly_basis() {
        let mut yearly_deal = package(1, Some(2_000));
        yearly_deal.monthly_price_yearly_subscription_in_cents = Some(500);
        let catalog = Catalog::new(
            vec![game(1, "TeamX", "TeamY")],
            vec![yearly_deal, package(2, Some(1_000))],
            vec![offer(1, 1), offer(1, 2)],
        );
        let teams = parse_teams(["TeamX"]);

        let monthly = compute_optimal_combination(&catalog, &teams, &OptimizerOptions::default())
            .expect("catalog fault")
            .expect("coverage");
        assert_eq!(monthly.selected_packages[0].package_id, 2);

        let options = OptimizerOptions {
            price_basis: PriceBasis::YearlySubscription,
            ..OptimizerOptions::default()
        };
        let yearly = compute_optimal_combination(&catalog, &teams, &options)
            .expect("catalog fault")
            .expect("coverage");
        assert_eq!(yearly.selected_packages[0].package_id, 1);
        assert_eq!(yearly.total_price_cents, 500);
    }
}
