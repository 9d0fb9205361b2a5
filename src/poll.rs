//! Fixed-interval snapshot polling.
//!
//! Each iteration collects one snapshot per target into an in-memory
//! accumulator. Nothing is written until the loop reaches `Done`, so killing
//! the process mid-run loses everything collected so far.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::notify::{notify_best_effort, CompletionNotifier};
use crate::output;
use crate::twitter::{Post, SearchClient, SearchQuery};

const TODAY_FORMAT: &str = "%m-%d-%Y";
const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One scraped post, tagged with its target and iteration timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "Today")]
    pub today: String,
    #[serde(rename = "Created")]
    pub created: String,
    #[serde(rename = "User Name")]
    pub user_name: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Tweet")]
    pub tweet: String,
    #[serde(rename = "Likes")]
    pub likes: u64,
    #[serde(rename = "Retweets")]
    pub retweets: u64,
    #[serde(rename = "TARGET")]
    pub target: String,
    #[serde(rename = "TIME")]
    pub time: String,
}

impl ResultRecord {
    pub const HEADER: [&'static str; 9] = [
        "Today", "Created", "User Name", "Location", "Tweet", "Likes", "Retweets", "TARGET", "TIME",
    ];

    pub fn from_post(post: Post, target: &str, collected_on: NaiveDateTime, now: NaiveDateTime) -> Self {
        ResultRecord {
            today: collected_on.format(TODAY_FORMAT).to_string(),
            created: post.created_at.format(CREATED_FORMAT).to_string(),
            user_name: post.author_name,
            location: post.author_location,
            tweet: post.text,
            likes: post.favorite_count,
            retweets: post.reshare_count,
            target: target.to_string(),
            time: now.format(TIME_FORMAT).to_string(),
        }
    }
}

/// Wall clock and blocking sleep, swappable in tests.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, d: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

pub struct SnapshotCollector<'a> {
    client: &'a dyn SearchClient,
    clock: &'a dyn Clock,
}

impl<'a> SnapshotCollector<'a> {
    pub fn new(client: &'a dyn SearchClient, clock: &'a dyn Clock) -> Self {
        SnapshotCollector { client, clock }
    }

    /// At most `count` recent posts for `target`, each tagged with `now`.
    /// Client errors propagate.
    pub fn collect(&self, target: &str, count: usize, now: NaiveDateTime) -> Result<Vec<ResultRecord>> {
        let posts = self.client.search(&SearchQuery::recent_original(target, count))?;
        Ok(posts
            .into_iter()
            .take(count)
            .map(|p| ResultRecord::from_post(p, target, self.clock.now(), now))
            .collect())
    }
}

/// Append-only batch owned by one poll loop.
#[derive(Debug, Default)]
pub struct Accumulator {
    records: Vec<ResultRecord>,
}

impl Accumulator {
    pub fn extend(&mut self, batch: Vec<ResultRecord>) {
        self.records.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub targets: Vec<String>,
    pub count: usize,
    pub iterations: usize,
    pub sleep: Duration,
    pub output: PathBuf,
    pub notify_to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Collecting,
    Sleeping,
    Done,
}

pub struct PollLoop<'a> {
    config: PollConfig,
    collector: SnapshotCollector<'a>,
    clock: &'a dyn Clock,
    notifier: &'a dyn CompletionNotifier,
    state: PollState,
    completed: usize,
    acc: Accumulator,
    progress: ProgressBar,
}

impl<'a> PollLoop<'a> {
    pub fn new(
        config: PollConfig,
        client: &'a dyn SearchClient,
        clock: &'a dyn Clock,
        notifier: &'a dyn CompletionNotifier,
    ) -> Self {
        PollLoop {
            collector: SnapshotCollector::new(client, clock),
            config,
            clock,
            notifier,
            state: PollState::Idle,
            completed: 0,
            acc: Accumulator::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Show an iteration progress bar on stderr.
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new(self.config.iterations as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} iterations") {
            pb.set_style(style.progress_chars("=> "));
        }
        self.progress = pb;
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.acc
    }

    /// Advance one transition and return the new state.
    pub fn step(&mut self) -> Result<PollState> {
        self.state = match self.state {
            PollState::Idle if self.config.iterations == 0 => self.finish()?,
            PollState::Idle => PollState::Collecting,
            PollState::Collecting => {
                self.collect_iteration()?;
                PollState::Sleeping
            }
            PollState::Sleeping if self.completed >= self.config.iterations => self.finish()?,
            PollState::Sleeping => {
                self.say("Sleeping....");
                info!(secs = self.config.sleep.as_secs(), "sleeping");
                self.clock.sleep(self.config.sleep);
                PollState::Collecting
            }
            PollState::Done => PollState::Done,
        };
        Ok(self.state)
    }

    /// Drive to `Done`. Returns the number of records written.
    pub fn run(&mut self) -> Result<usize> {
        while self.step()? != PollState::Done {}
        Ok(self.acc.len())
    }

    fn collect_iteration(&mut self) -> Result<()> {
        let n = self.completed + 1;
        self.say(&format!("Starting iteration {}....", n));
        let now = self.clock.now();
        for target in &self.config.targets {
            let batch = self.collector.collect(target, self.config.count, now)?;
            info!(iteration = n, target = %target, records = batch.len(), "snapshot");
            self.acc.extend(batch);
        }
        self.completed = n;
        self.progress.inc(1);
        self.say(&format!("Completed iteration {}....", n));
        Ok(())
    }

    fn say(&self, msg: &str) {
        self.progress.suspend(|| println!("{}", msg));
    }

    /// Flush once, then notify once.
    fn finish(&mut self) -> Result<PollState> {
        self.progress.finish_and_clear();
        output::write_records(self.acc.records(), &ResultRecord::HEADER, &self.config.output)?;
        println!("All done!");
        notify_best_effort(self.notifier, &self.config.notify_to, crate::notify::DONE_MESSAGE);
        Ok(PollState::Done)
    }
}
