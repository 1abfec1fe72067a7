// ai
//! 📡 Reddit Source: top posts, one listing page at a time.
//!
//! COLD OPEN. EXT. OAUTH.REDDIT.COM. 12:00 AM
//!
//! The scheduler knocks. The token endpoint checks our client id, squints at the
//! secret, and hands over a bearer token good for a day. We ask for the top of
//! r/dataengineering. Reddit hands back 100 posts and a cursor called `after`.
//! We ask again. And again. Until the limit is met or the cursor runs dry.
//!
//! 🧠 Knowledge graph:
//! - `RedditConfig`: credentials, user agent, endpoints, page size. Co-located here.
//! - `RedditSession::connect`: client-credentials OAuth. Failure is `SourceError::Authentication`,
//!   which the orchestrator treats as fatal.
//! - `RedditSession::top`: builds the paging state for one `/r/{sub}/top` walk.
//! - `impl Source`: `next_page()` returns `Some(posts)` until done, then `None`. Lazy,
//!   finite, not restartable. Upstream ranking order is preserved as received.
//!
//! 🦆 The duck is not allowed on Reddit. It watches the rate limit headers from afar.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::backends::Source;
use crate::common::{RawPost, TimeFilter};
use crate::errors::SourceError;

// ============================================================
//  🔧 RedditConfig: credentials, endpoints, and manners
// ============================================================

/// 🔧 Reddit app credentials and endpoints.
///
/// `auth_url` and `api_url` exist so tests can point the source at a mock
/// server. In production nobody should touch them.
#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    /// 🎩 Reddit rejects anonymous-looking agents. Be polite, be specific.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// 📦 Posts per listing request. Reddit caps this at 100.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_user_agent() -> String {
    "rdx by Anonymous Bot".to_string()
}

fn default_auth_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_api_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_page_size() -> u32 {
    REDDIT_MAX_PAGE_SIZE
}

const REDDIT_MAX_PAGE_SIZE: u32 = 100;

// ============================================================
//  📜 Wire shapes
// ============================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawPost,
}

// ============================================================
//  🔌 RedditSession: a client with a token in its pocket
// ============================================================

/// 🔌 An authenticated session. Cheap to clone, holds no paging state.
#[derive(Debug, Clone)]
pub struct RedditSession {
    client: reqwest::Client,
    access_token: String,
    config: RedditConfig,
}

impl RedditSession {
    /// 🔒 Client-credentials OAuth against `{auth_url}/api/v1/access_token`.
    ///
    /// Any failure here, transport included, is `SourceError::Authentication`:
    /// without a session there is nothing for the rest of the run to do.
    pub async fn connect(config: &RedditConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                SourceError::Authentication(format!("the HTTP client refused to be born: {e}"))
            })?;

        let token_url = format!("{}/api/v1/access_token", config.auth_url.trim_end_matches('/'));
        let response = client
            .post(&token_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| {
                SourceError::Authentication(format!("could not reach {token_url}: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SourceError::Authentication(format!("token response body went missing: {e}"))
        })?;
        if !status.is_success() {
            return Err(SourceError::Authentication(format!(
                "{token_url} answered {status}: {body}"
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            SourceError::Authentication(format!("token response was not JSON we understand: {e}"))
        })?;
        let access_token = match (token.access_token, token.error) {
            (Some(access_token), None) if !access_token.is_empty() => access_token,
            (_, Some(error)) => {
                return Err(SourceError::Authentication(format!(
                    "Reddit said '{error}'"
                )));
            }
            _ => {
                return Err(SourceError::Authentication(
                    "token response carried no access_token".to_string(),
                ));
            }
        };

        info!("✅ Successfully connected to Reddit!");
        Ok(Self {
            client,
            access_token,
            config: config.clone(),
        })
    }

    /// 📰 Start a walk over `/r/{subreddit}/top`. Nothing is fetched until `next_page`.
    pub fn top(
        &self,
        subreddit: &str,
        time_filter: TimeFilter,
        limit: Option<NonZeroU32>,
    ) -> RedditSource {
        RedditSource {
            session: self.clone(),
            subreddit: subreddit.to_string(),
            time_filter,
            remaining: limit.map(NonZeroU32::get),
            after: None,
            exhausted: false,
        }
    }
}

// ============================================================
//  🚰 RedditSource: the paging faucet
// ============================================================

/// 🚰 One walk over a subreddit's top listing.
///
/// `remaining` is `None` for "unlimited", in which case we follow `after`
/// until Reddit stops handing out cursors.
#[derive(Debug)]
pub struct RedditSource {
    session: RedditSession,
    subreddit: String,
    time_filter: TimeFilter,
    remaining: Option<u32>,
    after: Option<String>,
    exhausted: bool,
}

impl RedditSource {
    fn page_url(&self, page_size: u32) -> Result<Url, SourceError> {
        let api_url = &self.session.config.api_url;
        let invalid = |reason: String| SourceError::InvalidUrl {
            url: api_url.clone(),
            reason,
        };
        let mut url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
        // -- pushed segments are percent-encoded, so a stray '/', '?' or '#' stays inside the name
        url.path_segments_mut()
            .map_err(|()| invalid("the API url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("r")
            .push(&self.subreddit)
            .push("top");
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("t", self.time_filter.as_str())
                .append_pair("limit", &page_size.to_string())
                .append_pair("raw_json", "1");
            if let Some(after) = &self.after {
                query.append_pair("after", after);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Source for RedditSource {
    async fn next_page(&mut self) -> Result<Option<Vec<RawPost>>, SourceError> {
        if self.exhausted || self.remaining == Some(0) {
            return Ok(None);
        }

        let max_page = self
            .session
            .config
            .page_size
            .clamp(1, REDDIT_MAX_PAGE_SIZE);
        let page_size = match self.remaining {
            Some(remaining) => remaining.min(max_page),
            None => max_page,
        };

        let url = self.page_url(page_size)?;
        trace!("📡 GET {url}");
        let response = self
            .session
            .client
            .get(url.clone())
            .bearer_auth(&self.session.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let listing: Listing = serde_json::from_str(&body)?;
        let mut posts: Vec<RawPost> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect();

        if let Some(remaining) = self.remaining {
            // -- Reddit sometimes over-delivers. The limit is a promise, not a suggestion.
            posts.truncate(remaining as usize);
            self.remaining = Some(remaining - posts.len() as u32);
        }

        self.after = listing.data.after;
        if self.after.is_none() || posts.is_empty() {
            self.exhausted = true;
        }

        debug!(
            "📦 r/{} handed over {} posts (cursor: {:?})",
            self.subreddit,
            posts.len(),
            self.after
        );

        if posts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(posts))
        }
    }
}
