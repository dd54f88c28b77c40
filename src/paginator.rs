use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::feed::{FeedClient, FeedError, Post};

const PAGE_DELAY: Duration = Duration::from_millis(300);

/// Posts keyed by id, iterated in first-fetch order.
///
/// Re-inserting an id replaces the stored post in place, so a post seen on two
/// pages keeps its original position and the latest content.
pub type PostMap = IndexMap<String, Post>;

/// Walks a channel from the newest post backwards until a cutoff date.
pub struct Paginator<'a> {
    client: &'a FeedClient,
    max_pages: Option<usize>,
    progress: ProgressBar,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a FeedClient) -> Self {
        let progress = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            progress.set_style(style);
        }
        Self {
            client,
            max_pages: None,
            progress,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Stop after this many pages even if the cutoff was never reached.
    /// At least one page is always fetched.
    pub fn max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Collect every post created on or after `cutoff` (local midnight).
    ///
    /// Stops at the first post older than the cutoff, at an empty page, or at
    /// the page limit. Any feed error aborts the walk.
    pub async fn collect_until(&self, cutoff: NaiveDate) -> Result<PostMap, FeedError> {
        let result = self.walk(cutoff).await;
        self.progress.finish_and_clear();
        result
    }

    async fn walk(&self, cutoff: NaiveDate) -> Result<PostMap, FeedError> {
        let threshold = cutoff.and_time(NaiveTime::MIN);
        let mut posts = PostMap::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.client.fetch_page(cursor.as_deref()).await?;
            pages += 1;
            if page.is_empty() {
                debug!(pages, "Feed exhausted");
                break;
            }

            let mut batch = page.into_posts();
            batch.sort_by(|a, b| b.create_at.cmp(&a.create_at));
            let oldest = batch.last().map(|p| p.id.clone());
            debug!(page = pages, size = batch.len(), cursor = ?cursor, "Fetched page");

            for post in batch {
                if post.created_at()? < threshold {
                    info!(
                        "Reached {} after {} pages ({} posts kept)",
                        cutoff,
                        pages,
                        posts.len()
                    );
                    return Ok(posts);
                }
                insert(&mut posts, post);
            }

            self.progress
                .set_message(format!("{} pages, {} posts", pages, posts.len()));
            self.progress.tick();

            if self.max_pages.is_some_and(|max| pages >= max) {
                warn!(
                    "Stopped at page limit ({}) before reaching {}",
                    pages, cutoff
                );
                break;
            }

            cursor = oldest;
            tokio::time::sleep(PAGE_DELAY).await;
        }

        info!("Collected {} posts from {} pages", posts.len(), pages);
        Ok(posts)
    }
}

fn insert(posts: &mut PostMap, post: Post) {
    if let Some(prev) = posts.get(&post.id) {
        if prev != &post {
            warn!(id = %post.id, "Post changed between pages, keeping the latest copy");
        }
    }
    posts.insert(post.id.clone(), post);
}
