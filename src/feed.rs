use chrono::{DateTime, Local, NaiveDateTime};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::settings::Settings;

const PER_PAGE: &str = "100";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed feed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("post {id} has out-of-range create_at {create_at}")]
    Timestamp { id: String, create_at: i64 },
}

/// A single channel post. Fields beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub id: String,
    /// Epoch milliseconds.
    pub create_at: i64,
    #[serde(default)]
    pub message: String,
}

impl Post {
    /// Creation time in the local timezone.
    pub fn created_at(&self) -> Result<NaiveDateTime, FeedError> {
        DateTime::from_timestamp_millis(self.create_at)
            .map(|t| t.with_timezone(&Local).naive_local())
            .ok_or_else(|| FeedError::Timestamp {
                id: self.id.clone(),
                create_at: self.create_at,
            })
    }
}

/// One page of `/channels/{id}/posts`. Not sorted by time: callers sort by
/// `create_at`. Posts keep the order of the response object, so ties sort
/// the same way on every run.
#[derive(Debug, Default, Deserialize)]
pub struct PostPage {
    #[serde(default)]
    posts: Option<IndexMap<String, Post>>,
}

impl PostPage {
    pub fn is_empty(&self) -> bool {
        self.posts.as_ref().map_or(true, IndexMap::is_empty)
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts.unwrap_or_default().into_values().collect()
    }
}

pub struct FeedClient {
    http: Client,
    posts_url: String,
    token: String,
}

impl FeedClient {
    pub fn new(settings: &Settings) -> Result<Self, FeedError> {
        let http = Client::builder().build()?;
        let posts_url = format!(
            "{}/channels/{}/posts",
            settings.base_url.trim_end_matches('/'),
            settings.channel_id
        );
        Ok(Self {
            http,
            posts_url,
            token: settings.token.clone(),
        })
    }

    /// Fetch up to 100 top-level posts older than `before` (newest page when `None`).
    pub async fn fetch_page(&self, before: Option<&str>) -> Result<PostPage, FeedError> {
        let mut query = vec![
            ("page", "0"),
            ("per_page", PER_PAGE),
            ("skipFetchThreads", "true"),
            ("collapsedThreads", "true"),
        ];
        if let Some(id) = before {
            query.push(("before", id));
        }

        debug!(before = ?before, "GET {}", self.posts_url);
        let response = self
            .http
            .get(&self.posts_url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
