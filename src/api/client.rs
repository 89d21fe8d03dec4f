use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use super::error::ApiError;
use super::types::{ContentRecord, QueryResponse, RankedEntry, TopResponse};

const METRICS_BASE: &str = "https://wikimedia.org/api/rest_v1";
const ACCESS: &str = "all-access";
const THUMBNAIL_SIZE: &str = "500";
const USER_AGENT: &str = concat!("wikifeed/", env!("CARGO_PKG_VERSION"));

/// Where and how to reach the two upstream endpoints.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub metrics_base: String,
    pub content_base: String,
    pub project: String,
    pub access: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn for_language(language: &str) -> Self {
        Self {
            metrics_base: METRICS_BASE.to_string(),
            content_base: format!("https://{language}.wikipedia.org"),
            project: format!("{language}.wikipedia"),
            access: ACCESS.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_language("en")
    }
}

#[derive(Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl WikiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Fetches the most-viewed list for `date` with non-articles removed.
    /// Rank order is preserved.
    pub async fn fetch_ranked(&self, date: NaiveDate) -> Result<Vec<RankedEntry>, ApiError> {
        let url = format!(
            "{}/metrics/pageviews/top/{}/{}/{}",
            self.config.metrics_base,
            self.config.project,
            self.config.access,
            date.format("%Y/%m/%d")
        );
        debug!(%url, "fetching ranked list");

        let resp: TopResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let total = resp.items.first().map_or(0, |item| item.articles.len());
        let ranked: Vec<RankedEntry> = resp
            .items
            .into_iter()
            .next()
            .map(|item| item.articles)
            .unwrap_or_default()
            .into_iter()
            .filter(RankedEntry::is_content_article)
            .collect();
        debug!(total, kept = ranked.len(), "filtered ranked list");
        Ok(ranked)
    }

    /// Looks up summaries for all `titles` in a single request.
    ///
    /// Pages the wiki reports as missing are left out. Records come back in
    /// page key order; callers that care about rank order re-sort them.
    pub async fn fetch_content(&self, titles: &[String]) -> Result<Vec<ContentRecord>, ApiError> {
        if titles.is_empty() {
            return Ok(vec![]);
        }

        let url = format!("{}/w/api.php", self.config.content_base);
        let joined = titles.join("|");
        debug!(count = titles.len(), "fetching content batch");

        let resp: QueryResponse = self
            .http
            .get(&url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", joined.as_str()),
                ("prop", "extracts|pageimages"),
                ("exintro", ""),
                ("explaintext", ""),
                ("pithumbsize", THUMBNAIL_SIZE),
                ("origin", "*"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(query) = resp.query else {
            return Err(ApiError::Parse("response has no query section".into()));
        };

        Ok(query
            .pages
            .into_values()
            .filter_map(ContentRecord::from_raw)
            .collect())
    }
}
