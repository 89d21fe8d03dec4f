use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Namespaces whose pages are never encyclopedia articles.
const NON_CONTENT_PREFIXES: &[&str] = &[
    "Special:",
    "Portal:",
    "Wikipedia:",
    "File:",
    "Talk:",
    "User:",
    "Help:",
    "Template:",
    "Category:",
];

/// Identifiers that show up in the top list but are not articles.
const NON_ARTICLE_SENTINELS: &[&str] = &["Main_Page", "Wikipedia:Featured_pictures", "-"];

/// Pageview metrics response for /metrics/pageviews/top/...
#[derive(Debug, Deserialize)]
pub struct TopResponse {
    #[serde(default)]
    pub items: Vec<TopItem>,
}

#[derive(Debug, Deserialize)]
pub struct TopItem {
    #[serde(default)]
    pub articles: Vec<RankedEntry>,
}

/// One row of the daily most-viewed list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RankedEntry {
    /// Article key in underscore form, e.g. `Rust_(programming_language)`.
    pub article: String,
    pub views: u64,
    pub rank: u32,
}

impl RankedEntry {
    pub fn is_content_article(&self) -> bool {
        !NON_ARTICLE_SENTINELS.contains(&self.article.as_str())
            && !NON_CONTENT_PREFIXES
                .iter()
                .any(|prefix| self.article.starts_with(prefix))
    }
}

/// MediaWiki action API response for `action=query`.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
pub struct QueryPages {
    #[serde(default)]
    pub pages: BTreeMap<String, RawPage>,
}

/// A page as the API returns it. Missing pages come back without a `pageid`.
#[derive(Debug, Deserialize)]
pub struct RawPage {
    pub pageid: Option<u64>,
    pub title: String,
    pub extract: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Summary data for a single page from the content endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub page_id: u64,
    pub title: String,
    pub extract: String,
    pub thumbnail: Option<Thumbnail>,
}

impl ContentRecord {
    pub fn from_raw(page: RawPage) -> Option<Self> {
        Some(ContentRecord {
            page_id: page.pageid?,
            title: page.title,
            extract: page.extract.unwrap_or_default(),
            thumbnail: page.thumbnail,
        })
    }

    /// The title in the underscore form used by the metrics API.
    pub fn ranked_key(&self) -> String {
        normalize_title(&self.title)
    }
}

/// A ranked entry merged with its content. This is what the feed shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub extract: String,
    pub page_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    pub views: u64,
}

impl Article {
    pub fn merge(record: ContentRecord, ranked: Option<&RankedEntry>) -> Self {
        Article {
            title: record.title,
            extract: record.extract,
            page_id: record.page_id,
            thumbnail: record.thumbnail,
            views: ranked.map_or(0, |entry| entry.views),
        }
    }

    /// Stable link to the article that survives renames.
    pub fn url(&self, language: &str) -> String {
        format!("https://{language}.wikipedia.org/?curid={}", self.page_id)
    }
}

pub fn normalize_title(title: &str) -> String {
    title.replace(' ', "_")
}
