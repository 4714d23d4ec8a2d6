use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::comparison::ComparisonMatrix;
use crate::optimizer::{CoverageFailure, PackageCombination};
use crate::output::format_cents;

pub fn render_combination_table(combination: &PackageCombination) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Package", "Id", "Monthly Price", "New Games"]);

    for (idx, package) in combination.selected_packages.iter().enumerate() {
        let price_cell = if package.price_cents == 0 {
            Cell::new("free").fg(Color::Green)
        } else {
            Cell::new(format_cents(u64::from(package.price_cents)))
        };
        table.add_row(Row::from(vec![
            Cell::new((idx + 1).to_string()),
            Cell::new(&package.name),
            Cell::new(package.package_id.to_string()),
            price_cell,
            Cell::new(package.newly_covered_games.to_string()),
        ]));
    }

    format!(
        "{table}\nTotal: {} per month for {} games",
        format_cents(combination.total_price_cents),
        combination.required_games
    )
}

pub fn render_failure(failure: &CoverageFailure) -> String {
    failure.to_string()
}

pub fn render_comparison_table(matrix: &ComparisonMatrix) -> String {
    let mut out = Vec::new();
    for tournament in &matrix.tournaments {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        let mut header = vec![Cell::new("Package")];
        header.extend(tournament.games.iter().map(|g| Cell::new(&g.label)));
        table.set_header(header);

        for package in &tournament.packages {
            let name_cell = if package.in_optimal_combination {
                Cell::new(format!("* {}", package.name)).fg(Color::Green)
            } else {
                Cell::new(&package.name)
            };
            let mut row = vec![name_cell];
            for (live, highlights) in package.live.iter().zip(&package.highlights) {
                row.push(Cell::new(availability_label(*live, *highlights)));
            }
            table.add_row(Row::from(row));
        }
        out.push(format!("{}\n{table}", tournament.competition));
    }

    let summary = match (matrix.total_price_cents, matrix.optimizer_failure) {
        (Some(total), _) => format!(
            "{} tournaments, {} games. Optimal combination (*): {} per month",
            matrix.total_tournaments,
            matrix.total_games,
            format_cents(total)
        ),
        (None, Some(failure)) => format!(
            "{} tournaments, {} games. {failure}",
            matrix.total_tournaments, matrix.total_games
        ),
        (None, None) => format!(
            "{} tournaments, {} games",
            matrix.total_tournaments, matrix.total_games
        ),
    };
    out.push(summary);
    out.join("\n\n")
}

fn availability_label(live: bool, highlights: bool) -> &'static str {
    match (live, highlights) {
        (true, true) => "live + hl",
        (true, false) => "live",
        (false, true) => "hl",
        (false, false) => "-",
    }
}
