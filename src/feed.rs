//! Incremental fetch-and-merge pagination over the day's most-viewed articles.
//!
//! The controller itself never performs I/O. [`FeedController::load_more`]
//! hands out a [`FetchPlan`], [`run_batch`] executes it against an
//! [`ArticleSource`], and [`FeedController::complete`] applies the result.
//! The UI runs the middle step on a spawned task; the `list` command awaits
//! it inline through [`FeedController::load_more_with`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::{ApiError, Article, ContentRecord, RankedEntry, WikiClient};

pub const DEFAULT_BATCH_SIZE: usize = 20;
/// `prop=extracts` with `exintro` answers for at most 20 titles per request.
pub const MAX_BATCH_SIZE: usize = 20;
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 2;

/// The two upstream lookups a batch cycle needs.
pub trait ArticleSource {
    fn fetch_ranked(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RankedEntry>, ApiError>> + Send;

    fn fetch_content(
        &self,
        titles: &[String],
    ) -> impl Future<Output = Result<Vec<ContentRecord>, ApiError>> + Send;
}

impl ArticleSource for WikiClient {
    fn fetch_ranked(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RankedEntry>, ApiError>> + Send {
        WikiClient::fetch_ranked(self, date)
    }

    fn fetch_content(
        &self,
        titles: &[String],
    ) -> impl Future<Output = Result<Vec<ContentRecord>, ApiError>> + Send {
        WikiClient::fetch_content(self, titles)
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Day whose ranking is shown. Normally yesterday.
    pub date: NaiveDate,
    pub batch_size: usize,
    /// Consecutive failures tolerated before the feed gives up.
    pub attempt_limit: u32,
    /// Drop articles the content endpoint returns without a thumbnail.
    pub require_thumbnail: bool,
}

impl FeedConfig {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            batch_size: DEFAULT_BATCH_SIZE,
            attempt_limit: DEFAULT_ATTEMPT_LIMIT,
            require_thumbnail: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    #[default]
    Idle,
    Fetching,
    /// Every ranked candidate has been requested. Terminal.
    Exhausted,
    /// Too many consecutive failures. Terminal.
    RateLimited,
}

impl FeedPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::RateLimited)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The ranked list could not be fetched.
    UpstreamUnavailable(ApiError),
    /// A batch's content lookup failed. The batch was not applied.
    BatchFetchFailed(ApiError),
    /// The attempt ceiling was reached; no further fetches happen.
    RateLimited { attempts: u32, last: ApiError },
}

impl FeedError {
    pub fn user_message(&self) -> String {
        match self {
            // The metrics API answers 404 for days it has no ranking for
            Self::UpstreamUnavailable(ApiError::HttpStatus(404, _)) => {
                "Could not load today's popular articles. No ranking has been published for that day yet."
                    .into()
            }
            Self::UpstreamUnavailable(e) => {
                format!("Could not load today's popular articles. {}", e.user_message())
            }
            Self::BatchFetchFailed(e) => {
                format!("Could not load more articles. {}", e.user_message())
            }
            Self::RateLimited { attempts, last } => format!(
                "Gave up after {attempts} failed attempts. The service may be rate limiting requests. {}",
                last.user_message()
            ),
        }
    }

    fn api_error(&self) -> &ApiError {
        match self {
            Self::UpstreamUnavailable(e)
            | Self::BatchFetchFailed(e)
            | Self::RateLimited { last: e, .. } => e,
        }
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for FeedError {}

/// Everything a batch cycle needs, detached from the controller so it can
/// run on another task.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub generation: u64,
    pub date: NaiveDate,
    pub offset: usize,
    pub batch_size: usize,
    pub require_thumbnail: bool,
    /// Already-fetched ranked list. `None` makes the cycle fetch it first.
    pub ranked: Option<Arc<[RankedEntry]>>,
}

impl FetchPlan {
    pub fn description(&self) -> String {
        if self.ranked.is_none() {
            format!("Load ranking for {} and first batch", self.date)
        } else {
            format!("Load articles {}..{}", self.offset, self.offset + self.batch_size)
        }
    }
}

#[derive(Debug)]
pub struct Batch {
    /// Length of the ranked slice that was requested. Zero means the ranked
    /// list had nothing left at the planned offset.
    pub requested: usize,
    pub articles: Vec<Article>,
}

#[derive(Debug)]
pub struct BatchResult {
    pub generation: u64,
    /// Ranked list fetched during this cycle, if the plan had none.
    pub ranked: Option<Arc<[RankedEntry]>>,
    pub outcome: Result<Batch, FeedError>,
}

/// Runs one fetch-and-merge cycle: the ranked list (only if the plan lacks
/// it), then one content request for the whole slice.
pub async fn run_batch<S: ArticleSource>(source: &S, plan: FetchPlan) -> BatchResult {
    let (ranked, fetched) = match plan.ranked {
        Some(ranked) => (ranked, None),
        None => match source.fetch_ranked(plan.date).await {
            Ok(entries) => {
                info!(date = %plan.date, candidates = entries.len(), "loaded ranked list");
                let ranked: Arc<[RankedEntry]> = entries.into();
                (Arc::clone(&ranked), Some(ranked))
            }
            Err(e) => {
                return BatchResult {
                    generation: plan.generation,
                    ranked: None,
                    outcome: Err(FeedError::UpstreamUnavailable(e)),
                };
            }
        },
    };

    let start = plan.offset.min(ranked.len());
    let end = (plan.offset + plan.batch_size).min(ranked.len());
    let slice = &ranked[start..end];

    let outcome = if slice.is_empty() {
        Ok(Batch {
            requested: 0,
            articles: vec![],
        })
    } else {
        let titles: Vec<String> = slice.iter().map(|e| e.article.clone()).collect();
        match source.fetch_content(&titles).await {
            Ok(records) => Ok(Batch {
                requested: slice.len(),
                articles: merge_batch(slice, records, plan.require_thumbnail),
            }),
            Err(e) => Err(FeedError::BatchFetchFailed(e)),
        }
    };

    BatchResult {
        generation: plan.generation,
        ranked: fetched,
        outcome,
    }
}

/// Joins content records with their ranked entries by normalized title.
///
/// Articles come out in rank order. Records with no ranked match keep
/// their response order after the matched ones and get zero views.
pub fn merge_batch(
    slice: &[RankedEntry],
    records: Vec<ContentRecord>,
    require_thumbnail: bool,
) -> Vec<Article> {
    let mut merged: Vec<(usize, Article)> = records
        .into_iter()
        .filter(|record| !require_thumbnail || record.thumbnail.is_some())
        .map(|record| {
            let key = record.ranked_key();
            let position = slice.iter().position(|entry| entry.article == key);
            let article = Article::merge(record, position.map(|i| &slice[i]));
            (position.unwrap_or(usize::MAX), article)
        })
        .collect();
    merged.sort_by_key(|(position, _)| *position);

    let dropped = slice.len().saturating_sub(merged.len());
    if dropped > 0 {
        debug!(dropped, "ranked entries without a usable article");
    }
    merged.into_iter().map(|(_, article)| article).collect()
}

/// Pagination state for one session.
#[derive(Debug)]
pub struct FeedController {
    config: FeedConfig,
    articles: Vec<Article>,
    ranked: Option<Arc<[RankedEntry]>>,
    next_offset: usize,
    phase: FeedPhase,
    attempts: u32,
    last_error: Option<FeedError>,
    generation: u64,
}

impl FeedController {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            articles: Vec::new(),
            ranked: None,
            next_offset: 0,
            phase: FeedPhase::Idle,
            attempts: 0,
            last_error: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn is_fetching(&self) -> bool {
        self.phase == FeedPhase::Fetching
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == FeedPhase::Exhausted
    }

    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of filtered candidates, once the ranked list has been fetched.
    pub fn candidate_count(&self) -> Option<usize> {
        self.ranked.as_ref().map(|r| r.len())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts the next batch cycle. Returns `None` while a batch is in
    /// flight or once the feed has reached a terminal phase.
    pub fn load_more(&mut self) -> Option<FetchPlan> {
        if self.phase != FeedPhase::Idle {
            return None;
        }
        if let Some(ranked) = &self.ranked
            && self.next_offset >= ranked.len()
        {
            self.phase = FeedPhase::Exhausted;
            return None;
        }

        self.phase = FeedPhase::Fetching;
        let plan = FetchPlan {
            generation: self.generation,
            date: self.config.date,
            offset: self.next_offset,
            batch_size: self.config.batch_size,
            require_thumbnail: self.config.require_thumbnail,
            ranked: self.ranked.clone(),
        };
        debug!(offset = plan.offset, batch_size = plan.batch_size, "batch started");
        Some(plan)
    }

    /// The last rendered article became visible.
    ///
    /// This is the only way the presentation layer asks for data, so fetch
    /// pressure follows scrolling. Calls while a batch is in flight are
    /// ignored.
    pub fn notify_approaching_end(&mut self) -> Option<FetchPlan> {
        self.load_more()
    }

    /// Applies the result of a batch cycle. Returns false if the result
    /// belonged to an earlier session and was discarded.
    pub fn complete(&mut self, result: BatchResult) -> bool {
        if result.generation != self.generation || self.phase != FeedPhase::Fetching {
            debug!(
                generation = result.generation,
                current = self.generation,
                "discarding stale batch"
            );
            return false;
        }

        if self.ranked.is_none() {
            self.ranked = result.ranked;
        }

        match result.outcome {
            Ok(batch) => {
                let added = batch.articles.len();
                self.articles.extend(batch.articles);
                self.attempts = 0;
                self.last_error = None;

                let total = self.candidate_count().unwrap_or(0);
                if batch.requested == 0 {
                    self.phase = FeedPhase::Exhausted;
                } else {
                    self.next_offset += self.config.batch_size;
                    self.phase = if self.next_offset >= total {
                        FeedPhase::Exhausted
                    } else {
                        FeedPhase::Idle
                    };
                }
                info!(
                    added,
                    loaded = self.articles.len(),
                    offset = self.next_offset,
                    total,
                    phase = ?self.phase,
                    "batch applied"
                );
            }
            Err(e) => {
                self.attempts += 1;
                warn!(attempts = self.attempts, error = %e.api_error(), "batch failed");
                if self.attempts >= self.config.attempt_limit {
                    self.phase = FeedPhase::RateLimited;
                    self.last_error = Some(FeedError::RateLimited {
                        attempts: self.attempts,
                        last: e.api_error().clone(),
                    });
                } else {
                    self.phase = FeedPhase::Idle;
                    self.last_error = Some(e);
                }
            }
        }
        true
    }

    /// Plans, runs and applies one batch on the current task.
    pub async fn load_more_with<S: ArticleSource>(&mut self, source: &S) -> bool {
        let Some(plan) = self.load_more() else {
            return false;
        };
        let result = run_batch(source, plan).await;
        self.complete(result)
    }

    /// Drops all loaded state and orphans any batch still in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.articles.clear();
        self.ranked = None;
        self.next_offset = 0;
        self.phase = FeedPhase::Idle;
        self.attempts = 0;
        self.last_error = None;
    }
}
