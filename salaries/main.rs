//! 2019-20 salaries joined onto 2019-20 season totals.

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
    info!(settings_loaded = ?nba, msg = "Starting stats + salaries merge");

    let fetcher = HttpTableFetcher::new(&settings.http)?;
    let total = pipelines::stats_and_salaries(&fetcher, nba)?;
    println!("Matched {} player rows", total.height());

    output::write_table(&total, &nba.salaries_output, IndexColumn::Omit)
        .with_context(|| format!("Failed to write {}", nba.salaries_output))?;
    println!("\nDone.");
    Ok(())
}
