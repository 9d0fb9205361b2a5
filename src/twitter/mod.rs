pub mod oauth;

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::settings::{HttpSettings, TwitterSettings};
use oauth::Signer;

/// Standard search caps one page at 100 statuses.
const MAX_PAGE: usize = 100;
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// One search hit, reduced to the fields the collector keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: u64,
    pub created_at: NaiveDateTime,
    pub author_name: String,
    pub author_location: String,
    pub text: String,
    pub favorite_count: u64,
    pub reshare_count: u64,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub q: String,
    pub lang: String,
    pub result_type: String,
    pub limit: usize,
}

impl SearchQuery {
    /// Recent English posts for `keyword`, no retweets, no links.
    pub fn recent_original(keyword: &str, limit: usize) -> Self {
        SearchQuery {
            q: format!("{} -filter:retweets -filter:links", keyword),
            lang: "en".into(),
            result_type: "recent".into(),
            limit,
        }
    }
}

pub trait SearchClient {
    fn verify_credentials(&self) -> Result<()>;

    /// Up to `query.limit` posts, most recent first.
    fn search(&self, query: &SearchQuery) -> Result<Vec<Post>>;
}

#[derive(Deserialize)]
struct SearchResponse {
    statuses: Vec<Status>,
}

#[derive(Deserialize)]
struct Status {
    id: u64,
    created_at: String,
    full_text: Option<String>,
    text: Option<String>,
    #[serde(default)]
    favorite_count: u64,
    #[serde(default)]
    retweet_count: u64,
    user: User,
}

#[derive(Deserialize)]
struct User {
    name: String,
    #[serde(default)]
    location: Option<String>,
}

impl TryFrom<Status> for Post {
    type Error = Error;

    fn try_from(s: Status) -> Result<Post> {
        let created_at = DateTime::parse_from_str(&s.created_at, CREATED_AT_FORMAT)
            .map_err(|e| Error::Decode(format!("created_at {:?}: {}", s.created_at, e)))?
            .naive_utc();
        Ok(Post {
            id: s.id,
            created_at,
            author_name: s.user.name,
            author_location: s.user.location.unwrap_or_default(),
            text: s.full_text.or(s.text).unwrap_or_default(),
            favorite_count: s.favorite_count,
            reshare_count: s.retweet_count,
        })
    }
}

pub fn parse_search_page(body: &str) -> Result<Vec<Post>> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    resp.statuses.into_iter().map(Post::try_from).collect()
}

/// v1.1 REST client with user-context OAuth 1.0a.
pub struct TwitterClient {
    client: reqwest::blocking::Client,
    signer: Signer,
    api_base: String,
}

impl TwitterClient {
    pub fn new(creds: &TwitterSettings, http: &HttpSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()?;
        Ok(TwitterClient {
            client,
            signer: Signer::new(creds),
            api_base: creds.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Signed GET. Waits out 429s using `x-rate-limit-reset` and retries.
    fn get(&self, path: &str, query: &[(String, String)]) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/{}", self.api_base, path);

        loop {
            let auth = self.signer.authorization("GET", &url, query);
            let resp = self
                .client
                .get(&url)
                .query(query)
                .header(reqwest::header::AUTHORIZATION, auth)
                .send()?;
            if resp.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(resp);
            }
            let wait = rate_limit_wait(resp.headers(), chrono::Utc::now().timestamp());
            warn!("Rate limited on {}, waiting {}s", path, wait.as_secs());
            std::thread::sleep(wait);
        }
    }
}

/// Time until the window in `x-rate-limit-reset` reopens, at least one second.
fn rate_limit_wait(headers: &reqwest::header::HeaderMap, now: i64) -> Duration {
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(now + 60);
    Duration::from_secs((reset - now).max(1) as u64)
}

impl SearchClient for TwitterClient {
    fn verify_credentials(&self) -> Result<()> {
        let resp = self.get("account/verify_credentials.json", &[])?;
        let status = resp.status();
        if status.is_success() {
            info!("Credentials verified");
            Ok(())
        } else {
            let body = resp.text().unwrap_or_default();
            Err(Error::Auth(format!("HTTP {}: {}", status.as_u16(), body)))
        }
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = Vec::with_capacity(query.limit);
        let mut max_id: Option<u64> = None;

        while posts.len() < query.limit {
            let page_size = (query.limit - posts.len()).min(MAX_PAGE);
            let mut params = vec![
                ("q".to_string(), query.q.clone()),
                ("lang".to_string(), query.lang.clone()),
                ("result_type".to_string(), query.result_type.clone()),
                ("tweet_mode".to_string(), "extended".to_string()),
                ("count".to_string(), page_size.to_string()),
            ];
            if let Some(id) = max_id {
                params.push(("max_id".to_string(), id.to_string()));
            }

            let resp = self.get("search/tweets.json", &params)?;
            let status = resp.status();
            if !status.is_success() {
                return Err(Error::Status {
                    url: format!("{}/search/tweets.json", self.api_base),
                    status: status.as_u16(),
                });
            }
            let page = parse_search_page(&resp.text()?)?;
            debug!(q = %query.q, got = page.len(), "search page");

            let Some(oldest) = page.iter().map(|p| p.id).min() else {
                break;
            };
            posts.extend(page);
            match oldest.checked_sub(1) {
                Some(next) => max_id = Some(next),
                None => break,
            }
        }

        posts.truncate(query.limit);
        Ok(posts)
    }
}
