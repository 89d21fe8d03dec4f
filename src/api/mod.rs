mod client;
mod error;
mod types;

pub use client::{ClientConfig, WikiClient};
pub use error::ApiError;
pub use types::{Article, ContentRecord, RankedEntry, Thumbnail};
