use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::catalog::{Catalog, Game, StreamingOffer, StreamingPackage};
use crate::config::DataConfig;

#[derive(Debug, Deserialize)]
struct GameRow {
    id: i64,
    team_home: String,
    team_away: String,
    starts_at: String,
    tournament_name: String,
}

#[derive(Debug, Deserialize)]
struct PackageRow {
    id: i64,
    name: String,
    monthly_price_cents: Option<u32>,
    monthly_price_yearly_subscription_in_cents: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OfferRow {
    game_id: i64,
    streaming_package_id: i64,
    live: String,
    highlights: String,
}

impl Catalog {
    pub fn load_dir(dir: &Path, files: &DataConfig) -> Result<Self> {
        let games = load_games(&dir.join(&files.games_file))?;
        let packages = load_packages(&dir.join(&files.packages_file))?;
        let offers = load_offers(&dir.join(&files.offers_file))?;
        info!(
            "loaded catalog from {}: {} games, {} packages, {} offers",
            dir.display(),
            games.len(),
            packages.len(),
            offers.len()
        );
        Ok(Self::new(games, packages, offers))
    }
}

pub fn load_games(path: &Path) -> Result<Vec<Game>> {
    read_rows::<GameRow>(path)?
        .into_iter()
        .map(|(line, row)| {
            let starts_at = parse_starts_at(&row.starts_at).with_context(|| {
                format!("{}:{line}: invalid starts_at for game {}", path.display(), row.id)
            })?;
            Ok(Game {
                id: row.id,
                team_home: row.team_home,
                team_away: row.team_away,
                starts_at,
                tournament_name: row.tournament_name,
            })
        })
        .collect()
}

pub fn load_packages(path: &Path) -> Result<Vec<StreamingPackage>> {
    Ok(read_rows::<PackageRow>(path)?
        .into_iter()
        .map(|(_, row)| StreamingPackage {
            id: row.id,
            name: row.name,
            monthly_price_cents: row.monthly_price_cents,
            monthly_price_yearly_subscription_in_cents: row
                .monthly_price_yearly_subscription_in_cents,
        })
        .collect())
}

pub fn load_offers(path: &Path) -> Result<Vec<StreamingOffer>> {
    read_rows::<OfferRow>(path)?
        .into_iter()
        .map(|(line, row)| {
            let live = parse_flag(&row.live)
                .with_context(|| format!("{}:{line}: invalid live flag", path.display()))?;
            let highlights = parse_flag(&row.highlights)
                .with_context(|| format!("{}:{line}: invalid highlights flag", path.display()))?;
            Ok(StreamingOffer {
                game_id: row.game_id,
                streaming_package_id: row.streaming_package_id,
                live,
                highlights,
            })
        })
        .collect()
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<(u64, T)>> {
    let file =
        File::open(path).with_context(|| format!("failed opening CSV file: {}", path.display()))?;
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("failed reading CSV header: {}", path.display()))?
        .clone();
    let mut record = StringRecord::new();
    let mut rows = Vec::new();
    while reader
        .read_record(&mut record)
        .with_context(|| format!("failed reading CSV row in {}", path.display()))?
    {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = record
            .deserialize::<T>(Some(&headers))
            .with_context(|| format!("{}:{line}: failed parsing CSV row", path.display()))?;
        rows.push((line, row));
    }
    Ok(rows)
}

/// Accepts the `YYYY-MM-DD HH:MM:SS` export format and RFC 3339.
pub fn parse_starts_at(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_utc()))
        .map_err(|e| anyhow!("unrecognized date-time {raw:?}: {e}"))
}

pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "t" | "yes" => Ok(true),
        "0" | "0.0" | "false" | "f" | "no" | "" => Ok(false),
        other => Err(anyhow!("expected a boolean flag, got {other:?}")),
    }
}
