pub mod csv;
pub mod table;

use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn format_cents(cents: u64) -> String {
    format!("{}.{:02} €", cents / 100, cents % 100)
}
