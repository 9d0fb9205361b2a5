//! 2021-22 per-game + advanced stats with salaries, traded players collapsed
//! to their season totals.

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
    info!(settings_loaded = ?nba, msg = "Starting advanced stats + salaries merge");

    let fetcher = HttpTableFetcher::new(&settings.http)?;
    let nba_table = pipelines::advanced_stats_and_salaries(&fetcher, nba)?;
    println!(
        "{} salaried players x {} columns",
        nba_table.height(),
        nba_table.width()
    );

    output::write_table(&nba_table, &nba.advanced_salaries_output, IndexColumn::Omit)
        .with_context(|| format!("Failed to write {}", nba.advanced_salaries_output))?;
    println!("\nDone.");
    Ok(())
}
