//! Layered settings: built-in defaults, then an optional `tablescrape.toml`,
//! then `SCRAPE_*` environment variables (`__` separates sections).

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: HttpSettings,
    pub twitter: TwitterSettings,
    pub twilio: TwilioSettings,
    pub poll: PollSettings,
    pub nba: NbaSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// The four OAuth 1.0a strings for the search API.
#[derive(Clone, Deserialize, Default)]
pub struct TwitterSettings {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub access_secret: String,
    pub allow_unverified: bool,
    pub api_base: String,
}

impl std::fmt::Debug for TwitterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterSettings")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("access_key", &redact(&self.access_key))
            .field("allow_unverified", &self.allow_unverified)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone, Deserialize, Default)]
pub struct TwilioSettings {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub api_base: String,
}

impl std::fmt::Debug for TwilioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSettings")
            .field("account_sid", &self.account_sid.as_deref().map(redact))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    pub targets: Vec<String>,
    pub count: usize,
    pub iterations: usize,
    pub sleep_secs: u64,
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NbaSettings {
    pub per_game_2021_url: String,
    pub advanced_2021_url: String,
    pub stats_2021_output: String,
    pub contracts_url: String,
    pub totals_2020_url: String,
    pub salary_2020_column: String,
    pub salaries_output: String,
    pub per_game_2022_url: String,
    pub advanced_2022_url: String,
    pub salary_2022_column: String,
    pub advanced_salaries_output: String,
    pub traded_sentinel: String,
}

const BBREF: &str = "https://www.basketball-reference.com";

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(Config::builder()
        .set_default("http.timeout_secs", 60)?
        .set_default("http.user_agent", concat!("tablescrape/", env!("CARGO_PKG_VERSION")))?
        .set_default("twitter.allow_unverified", false)?
        .set_default("twitter.api_base", "https://api.twitter.com/1.1")?
        .set_default("twilio.api_base", "https://api.twilio.com/2010-04-01")?
        .set_default("poll.targets", vec!["Biden", "Trump"])?
        .set_default("poll.count", 50)?
        .set_default("poll.iterations", 66)?
        .set_default("poll.sleep_secs", 180)?
        .set_default("poll.output", "DEBATE-output.csv")?
        .set_default("nba.per_game_2021_url", format!("{BBREF}/leagues/NBA_2021_per_game.html"))?
        .set_default("nba.advanced_2021_url", format!("{BBREF}/leagues/NBA_2021_advanced.html"))?
        .set_default("nba.stats_2021_output", "../nba-stats-2021.csv")?
        .set_default("nba.contracts_url", format!("{BBREF}/contracts/players.html"))?
        .set_default("nba.totals_2020_url", format!("{BBREF}/leagues/NBA_2020_totals.html"))?
        .set_default("nba.salary_2020_column", "2019-20")?
        .set_default("nba.salaries_output", "Stats-and-Salaries.csv")?
        .set_default("nba.per_game_2022_url", format!("{BBREF}/leagues/NBA_2022_per_game.html"))?
        .set_default("nba.advanced_2022_url", format!("{BBREF}/leagues/NBA_2022_advanced.html"))?
        .set_default("nba.salary_2022_column", "2021-22")?
        .set_default("nba.advanced_salaries_output", "./advanced_stats_and_salaries.csv")?
        .set_default("nba.traded_sentinel", "TOT")?)
}

impl Settings {
    pub fn load() -> Result<Settings> {
        let cfg = builder()?
            .add_source(File::with_name("tablescrape").required(false))
            .add_source(
                Environment::with_prefix("SCRAPE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("poll.targets")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Defaults only; no file or environment.
    pub fn defaults() -> Result<Settings> {
        Ok(builder()?.build()?.try_deserialize()?)
    }
}
