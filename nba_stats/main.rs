//! 2020-21 per-game and advanced stats, cleaned and joined per (Player, Tm).

use anyhow::{Context, Result};
use tablescrape::fetch::HttpTableFetcher;
use tablescrape::output::{self, IndexColumn};
use tablescrape::pipelines;
use tablescrape::settings::Settings;
use tracing::info;

fn main() -> Result<()> {
    tablescrape::init_tracing();
    let settings = Settings::load().context("Failed to load settings")?;
    let nba = &settings.nba;
    info!(settings_loaded = ?nba, msg = "Starting per-game + advanced merge");

    let fetcher = HttpTableFetcher::new(&settings.http)?;
    let merged = pipelines::per_game_and_advanced(&fetcher, nba)?;
    println!("Merged: {} rows x {} columns", merged.height(), merged.width());

    output::write_table(&merged, &nba.stats_2021_output, IndexColumn::Include)
        .with_context(|| format!("Failed to write {}", nba.stats_2021_output))?;
    println!("\nDone.");
    Ok(())
}
