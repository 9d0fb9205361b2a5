use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tablescrape::notify;
use tablescrape::poll::{PollConfig, PollLoop, SystemClock};
use tablescrape::settings::Settings;
use tablescrape::twitter::{SearchClient, TwitterClient};
use tracing::{info, warn};

fn main() -> Result<()> {
    tablescrape::init_tracing();
    let settings = Settings::load().context("Failed to load settings")?;
    info!(settings_loaded = ?settings, msg = "Starting debate-night collector");

    println!("Debate Night Collector");
    println!("======================\n");

    let client = TwitterClient::new(&settings.twitter, &settings.http)?;
    match client.verify_credentials() {
        Ok(()) => println!("Blue Check"),
        Err(e) if settings.twitter.allow_unverified => {
            warn!("Credential check failed, continuing anyway: {}", e);
        }
        Err(e) => return Err(e).context("Credential check failed"),
    }

    let (notifier, notify_to) = notify::from_settings(&settings.twilio, &settings.http)?;
    let poll = &settings.poll;
    let config = PollConfig {
        targets: poll.targets.clone(),
        count: poll.count,
        iterations: poll.iterations,
        sleep: Duration::from_secs(poll.sleep_secs),
        output: PathBuf::from(&poll.output),
        notify_to,
    };
    println!(
        "Targets: {:?} | {} per snapshot | {} iterations every {}s\n",
        config.targets, config.count, config.iterations, poll.sleep_secs
    );

    let clock = SystemClock;
    let mut run = PollLoop::new(config, &client, &clock, notifier.as_ref()).with_progress();
    let written = run
        .run()
        .with_context(|| format!("Poll loop failed after {} iterations", run.completed()))?;
    println!("Wrote {} rows to {}", written, poll.output);
    Ok(())
}
