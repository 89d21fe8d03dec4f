//! Test data builders and an in-memory article source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::api::{
    ApiError, Article, ClientConfig, ContentRecord, RankedEntry, Thumbnail, WikiClient,
};
use crate::app::App;
use crate::feed::{ArticleSource, Batch, BatchResult, FeedConfig, FeedController, FeedError};
use crate::theme::ResolvedTheme;

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
}

/// A client that can't reach anything, so a stray spawned batch fails fast
/// instead of touching the real endpoints.
pub fn offline_client() -> WikiClient {
    WikiClient::new(ClientConfig {
        metrics_base: "http://127.0.0.1:9".to_string(),
        content_base: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_millis(100),
        ..ClientConfig::default()
    })
    .unwrap()
}

pub struct ArticleBuilder {
    title: String,
    extract: String,
    page_id: u64,
    thumbnail: Option<Thumbnail>,
    views: u64,
}

impl Default for ArticleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl ArticleBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Article".to_string(),
            extract: "A short summary of the test article.".to_string(),
            page_id: 1,
            thumbnail: Some(Thumbnail {
                source: "https://upload.example.org/thumb.jpg".to_string(),
                width: 500,
                height: 333,
            }),
            views: 1000,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn extract(mut self, extract: &str) -> Self {
        self.extract = extract.to_string();
        self
    }

    pub fn page_id(mut self, page_id: u64) -> Self {
        self.page_id = page_id;
        self
    }

    pub fn no_thumbnail(mut self) -> Self {
        self.thumbnail = None;
        self
    }

    pub fn views(mut self, views: u64) -> Self {
        self.views = views;
        self
    }

    pub fn build(self) -> Article {
        Article {
            title: self.title,
            extract: self.extract,
            page_id: self.page_id,
            thumbnail: self.thumbnail,
            views: self.views,
        }
    }
}

pub struct TestAppBuilder {
    articles: Vec<Article>,
    selected_index: usize,
    exhausted: bool,
    failures: Vec<FeedError>,
    fetching: bool,
    show_help: bool,
    theme: ResolvedTheme,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            articles: Vec::new(),
            selected_index: 0,
            exhausted: false,
            failures: Vec::new(),
            fetching: false,
            show_help: false,
            theme: ResolvedTheme::dark(),
        }
    }

    pub fn with_articles(mut self, articles: Vec<Article>) -> Self {
        self.articles = articles;
        self
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    /// Loaded articles cover the whole ranking.
    pub fn exhausted(mut self) -> Self {
        self.exhausted = true;
        self
    }

    pub fn failed(mut self, error: FeedError) -> Self {
        self.failures.push(error);
        self
    }

    pub fn upstream_unavailable(self) -> Self {
        self.failed(FeedError::UpstreamUnavailable(ApiError::Network(
            "connection failed".into(),
        )))
    }

    pub fn rate_limited(self) -> Self {
        let err = || FeedError::BatchFetchFailed(ApiError::HttpStatus(429, "Too Many Requests".into()));
        self.failed(err()).failed(err())
    }

    pub fn fetching(mut self) -> Self {
        self.fetching = true;
        self
    }

    pub fn show_help(mut self) -> Self {
        self.show_help = true;
        self
    }

    pub fn theme(mut self, theme: ResolvedTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn build(self) -> App {
        let mut config = FeedConfig::new(test_date());
        config.batch_size = self.articles.len().max(1);
        let mut feed = FeedController::new(config);

        if !self.articles.is_empty() || self.exhausted {
            let total = if self.exhausted {
                self.articles.len()
            } else {
                self.articles.len() + 10
            };
            let ranked: Arc<[RankedEntry]> = (0..total)
                .map(|i| RankedEntry {
                    article: format!("Ranked_{i}"),
                    views: 100,
                    rank: i as u32 + 1,
                })
                .collect();
            seed(
                &mut feed,
                Some(ranked),
                Ok(Batch {
                    requested: self.articles.len(),
                    articles: self.articles,
                }),
            );
        }

        for failure in self.failures {
            seed(&mut feed, None, Err(failure));
        }

        let mut app = App::new(offline_client(), feed.config().clone(), "en".to_string(), self.theme);
        app.feed = feed;
        app.selected_index = self.selected_index;
        app.show_help = self.show_help;
        if self.fetching && app.feed.load_more().is_some() {
            app.loading_start = Some(Instant::now());
        }
        app
    }
}

fn seed(
    feed: &mut FeedController,
    ranked: Option<Arc<[RankedEntry]>>,
    outcome: Result<Batch, FeedError>,
) {
    if let Some(plan) = feed.load_more() {
        feed.complete(BatchResult {
            generation: plan.generation,
            ranked,
            outcome,
        });
    }
}

pub fn sample_articles() -> Vec<Article> {
    vec![
        ArticleBuilder::new()
            .page_id(5043734)
            .title("Taylor Swift")
            .extract("Taylor Alison Swift is an American singer-songwriter. Known for her autobiographical songwriting, artistic reinventions, and cultural impact, she is a leading figure in popular music.")
            .views(812_345)
            .build(),
        ArticleBuilder::new()
            .page_id(23862)
            .title("Python (programming language)")
            .extract("Python is a high-level, general-purpose programming language. Its design philosophy emphasizes code readability with the use of significant indentation.")
            .views(98_765)
            .build(),
        ArticleBuilder::new()
            .page_id(29452)
            .title("Solar eclipse")
            .extract("A solar eclipse occurs when the Moon passes between Earth and the Sun, thereby obscuring the view of the Sun from a small part of Earth, totally or partially.")
            .views(54_321)
            .no_thumbnail()
            .build(),
        ArticleBuilder::new()
            .page_id(9316)
            .title("Earth")
            .extract("Earth is the third planet from the Sun and the only astronomical object known to harbor life.")
            .views(12_000)
            .build(),
        ArticleBuilder::new()
            .page_id(25614)
            .title("Rust (programming language)")
            .extract("Rust is a general-purpose programming language emphasizing performance, type safety, and concurrency.")
            .views(8_642)
            .build(),
    ]
}

/// In-memory upstream. Content comes back in reverse request order so
/// tests notice when rank order is not restored.
#[derive(Default)]
pub struct FakeSource {
    pub ranked: Vec<RankedEntry>,
    pub ranked_failures: AtomicUsize,
    pub content: HashMap<String, ContentRecord>,
    pub content_failures: AtomicUsize,
    pub ranked_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
    pub requested: Mutex<Vec<Vec<String>>>,
}

impl FakeSource {
    pub fn with_articles(entries: &[(&str, u64)]) -> Self {
        let ranked = entries
            .iter()
            .enumerate()
            .map(|(i, (name, views))| RankedEntry {
                article: (*name).to_string(),
                views: *views,
                rank: i as u32 + 1,
            })
            .collect();
        let content = entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| ((*name).to_string(), content_record(i as u64 + 100, name)))
            .collect();
        Self {
            ranked,
            content,
            ..Default::default()
        }
    }

    pub fn fail_ranked(self, times: usize) -> Self {
        self.ranked_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn fail_content(self, times: usize) -> Self {
        self.content_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn without_content(mut self, name: &str) -> Self {
        self.content.remove(name);
        self
    }

    pub fn without_thumbnail(mut self, name: &str) -> Self {
        if let Some(record) = self.content.get_mut(name) {
            record.thumbnail = None;
        }
        self
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl ArticleSource for FakeSource {
    async fn fetch_ranked(&self, _date: NaiveDate) -> Result<Vec<RankedEntry>, ApiError> {
        self.ranked_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.ranked_failures) {
            return Err(ApiError::HttpStatus(503, "Service Unavailable".into()));
        }
        Ok(self.ranked.clone())
    }

    async fn fetch_content(&self, titles: &[String]) -> Result<Vec<ContentRecord>, ApiError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(titles.to_vec());
        if Self::take_failure(&self.content_failures) {
            return Err(ApiError::HttpStatus(429, "Too Many Requests".into()));
        }
        Ok(titles
            .iter()
            .rev()
            .filter_map(|t| self.content.get(t).cloned())
            .collect())
    }
}

pub fn content_record(page_id: u64, name: &str) -> ContentRecord {
    ContentRecord {
        page_id,
        title: name.replace('_', " "),
        extract: format!("About {name}."),
        thumbnail: Some(Thumbnail {
            source: format!("https://img.example/{name}.jpg"),
            width: 500,
            height: 300,
        }),
    }
}
