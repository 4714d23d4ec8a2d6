use anyhow::Result;

use crate::comparison::ComparisonMatrix;
use crate::optimizer::PackageCombination;

pub fn combination_to_csv(combination: &PackageCombination) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "order",
        "package_id",
        "name",
        "price_cents",
        "newly_covered_games",
    ])?;
    for (idx, package) in combination.selected_packages.iter().enumerate() {
        writer.write_record([
            (idx + 1).to_string(),
            package.package_id.to_string(),
            package.name.clone(),
            package.price_cents.to_string(),
            package.newly_covered_games.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

/// One row per (tournament, game, package) with an offer.
pub fn comparison_to_csv(matrix: &ComparisonMatrix) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "competition",
        "game_id",
        "match",
        "package_id",
        "package",
        "live",
        "highlights",
        "in_optimal_combination",
    ])?;
    for tournament in &matrix.tournaments {
        for (col, game) in tournament.games.iter().enumerate() {
            for package in &tournament.packages {
                let live = package.live.get(col).copied().unwrap_or(false);
                let highlights = package.highlights.get(col).copied().unwrap_or(false);
                if !live && !highlights {
                    continue;
                }
                writer.write_record([
                    tournament.competition.clone(),
                    game.game_id.to_string(),
                    game.label.clone(),
                    package.package_id.to_string(),
                    package.name.clone(),
                    live.to_string(),
                    highlights.to_string(),
                    package.in_optimal_combination.to_string(),
                ])?;
            }
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use crate::optimizer::{PackageCombination, SelectedPackage};
    use crate::output::csv::combination_to_csv;

    #[test]
    fn writes_one_row_per_selected_package() {
        let combination = PackageCombination {
            selected_packages: vec![
                SelectedPackage {
                    package_id: 3,
                    name: "Free TV, regional".to_string(),
                    price_cents: 0,
                    newly_covered_games: 2,
                },
                SelectedPackage {
                    package_id: 8,
                    name: "Sky".to_string(),
                    price_cents: 2_500,
                    newly_covered_games: 5,
                },
            ],
            total_price_cents: 2_500,
            required_games: 7,
        };

        let csv = combination_to_csv(&combination).expect("csv");
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,3,\"Free TV, regional\",0,2");
        assert_eq!(lines[2], "2,8,Sky,2500,5");
    }
}
