pub mod loader;

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: i64,
    pub team_home: String,
    pub team_away: String,
    pub starts_at: NaiveDateTime,
    pub tournament_name: String,
}

impl Game {
    /// Exact, case-sensitive match on either participant label.
    pub fn involves_any(&self, teams: &BTreeSet<String>) -> bool {
        teams.contains(&self.team_home) || teams.contains(&self.team_away)
    }

    pub fn match_label(&self) -> String {
        format!("{} - {}", self.team_home, self.team_away)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamingPackage {
    pub id: i64,
    pub name: String,
    pub monthly_price_cents: Option<u32>,
    pub monthly_price_yearly_subscription_in_cents: Option<u32>,
}

impl StreamingPackage {
    pub fn monthly_price(&self) -> u32 {
        self.monthly_price_cents.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamingOffer {
    pub game_id: i64,
    pub streaming_package_id: i64,
    pub live: bool,
    pub highlights: bool,
}

/// Read side of the game/package/offer store the optimizer runs against.
pub trait CatalogSource: Send + Sync {
    fn events_for_teams(&self, teams: &BTreeSet<String>) -> Result<Vec<Game>>;
    /// Every scheduled game, for views without a team filter.
    fn all_events(&self) -> Result<Vec<Game>>;
    fn edges_for_events(&self, event_ids: &BTreeSet<i64>) -> Result<Vec<StreamingOffer>>;
    fn packages_by_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<StreamingPackage>>;
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    games: Vec<Game>,
    packages: Vec<StreamingPackage>,
    offers: Vec<StreamingOffer>,
}

impl Catalog {
    pub fn new(
        games: Vec<Game>,
        packages: Vec<StreamingPackage>,
        offers: Vec<StreamingOffer>,
    ) -> Self {
        Self {
            games,
            packages,
            offers,
        }
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn packages(&self) -> &[StreamingPackage] {
        &self.packages
    }

    pub fn offers(&self) -> &[StreamingOffer] {
        &self.offers
    }

    pub fn with_package(mut self, package: StreamingPackage) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_offer(mut self, offer: StreamingOffer) -> Self {
        self.offers.push(offer);
        self
    }
}

impl CatalogSource for Catalog {
    fn events_for_teams(&self, teams: &BTreeSet<String>) -> Result<Vec<Game>> {
        Ok(self
            .games
            .iter()
            .filter(|game| game.involves_any(teams))
            .cloned()
            .collect())
    }

    fn all_events(&self) -> Result<Vec<Game>> {
        Ok(self.games.clone())
    }

    fn edges_for_events(&self, event_ids: &BTreeSet<i64>) -> Result<Vec<StreamingOffer>> {
        Ok(self
            .offers
            .iter()
            .filter(|offer| event_ids.contains(&offer.game_id))
            .copied()
            .collect())
    }

    fn packages_by_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<StreamingPackage>> {
        Ok(self
            .packages
            .iter()
            .filter(|package| ids.contains(&package.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use super::{Game, StreamingOffer, StreamingPackage};

    pub fn game(id: i64, home: &str, away: &str) -> Game {
        game_in(id, home, away, "Bundesliga 23/24")
    }

    pub fn game_in(id: i64, home: &str, away: &str, tournament: &str) -> Game {
        let starts_at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(18, 30, 0))
            .expect("valid fixture date")
            + chrono::Duration::days(id);
        Game {
            id,
            team_home: home.to_string(),
            team_away: away.to_string(),
            starts_at,
            tournament_name: tournament.to_string(),
        }
    }

    pub fn package(id: i64, monthly: Option<u32>) -> StreamingPackage {
        StreamingPackage {
            id,
            name: format!("Package {id}"),
            monthly_price_cents: monthly,
            monthly_price_yearly_subscription_in_cents: None,
        }
    }

    pub fn offer(game_id: i64, package_id: i64) -> StreamingOffer {
        StreamingOffer {
            game_id,
            streaming_package_id: package_id,
            live: true,
            highlights: true,
        }
    }
}
