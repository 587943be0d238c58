use std::collections::HashMap;
use std::sync::Arc;

use doc_store::{Document, DocumentStore, Filter};
use tracing::debug;

use crate::config::AggregationConfig;
use crate::domain::models::{Post, User};
use crate::domain::{POSTS, USERS};
use crate::error::ServiceResult;
use crate::session::Session;

/// A tag page: matching posts plus co-occurring tag suggestions.
#[derive(Debug, Clone)]
pub struct TagPage {
    pub posts: Vec<Post>,
    pub related_tags: Vec<String>,
}

/// Feed & discovery aggregator.
///
/// Pure read-and-reduce over store snapshots: the store's equality queries
/// fetch candidate sets, and all richer filtering, ordering, and tallying
/// happens here. Holds no state beyond a store handle and limits.
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn DocumentStore>,
    limits: AggregationConfig,
}

impl FeedService {
    pub fn new(store: Arc<dyn DocumentStore>, limits: AggregationConfig) -> Self {
        Self { store, limits }
    }

    async fn published_posts(&self) -> ServiceResult<Vec<Post>> {
        let docs = self
            .store
            .query(POSTS, Filter::eq("isDraft", false))
            .await?;
        let posts = docs
            .iter()
            .map(Document::decode::<Post>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Personalized feed: non-draft posts by followed authors, newest
    /// first. An empty follow set yields an empty feed, never a global
    /// fallback.
    pub async fn personal_feed(&self, session: &Session) -> ServiceResult<Vec<Post>> {
        let uid = session.require_uid()?;

        let following = match self.store.get(USERS, uid).await? {
            Some(doc) => doc.decode::<User>()?.following,
            None => Vec::new(),
        };
        if following.is_empty() {
            return Ok(Vec::new());
        }

        let mut posts: Vec<Post> = self
            .published_posts()
            .await?
            .into_iter()
            .filter(|post| following.iter().any(|f| f == &post.author_id))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(uid, count = posts.len(), "assembled personal feed");
        Ok(posts)
    }

    /// Posts by one author, newest first. Drafts appear only when the
    /// caller asks for them (the author viewing their own profile).
    pub async fn author_posts(
        &self,
        author_id: &str,
        include_drafts: bool,
    ) -> ServiceResult<Vec<Post>> {
        let docs = self
            .store
            .query(POSTS, Filter::eq("authorId", author_id))
            .await?;
        let mut posts = docs
            .iter()
            .map(Document::decode::<Post>)
            .collect::<Result<Vec<_>, _>>()?;
        if !include_drafts {
            posts.retain(|post| !post.is_draft);
        }
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Global tag popularity: descending occurrence count over published
    /// posts, ties broken by first-encountered order in the store's native
    /// iteration order. `limit` defaults from config.
    pub async fn popular_tags(&self, limit: Option<usize>) -> ServiceResult<Vec<String>> {
        let limit = limit.unwrap_or(self.limits.popular_tags_limit);
        let posts = self.published_posts().await?;

        let mut tallies = TagTally::new();
        for post in &posts {
            for tag in &post.tags {
                tallies.count(tag);
            }
        }
        Ok(tallies.top(limit))
    }

    /// Tag page: published posts carrying the tag (case-insensitive exact
    /// match), newest first, plus the top co-occurring tags across the
    /// matched set.
    pub async fn posts_by_tag(&self, tag: &str) -> ServiceResult<TagPage> {
        let wanted = tag.to_lowercase();
        let mut matched = Vec::new();
        let mut related = TagTally::new();

        for post in self.published_posts().await? {
            if !post.tags.iter().any(|t| t.to_lowercase() == wanted) {
                continue;
            }
            for other in &post.tags {
                if other.to_lowercase() != wanted {
                    related.count(other);
                }
            }
            matched.push(post);
        }
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(TagPage {
            posts: matched,
            related_tags: related.top(self.limits.related_tags_limit),
        })
    }

    /// Substring search over published posts: title, content, author name,
    /// and tags. Title hits rank first; each bucket stays newest-first.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Post>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<Post> = self
            .published_posts()
            .await?
            .into_iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&needle)
                    || post.content.to_lowercase().contains(&needle)
                    || post.author_name.to_lowercase().contains(&needle)
                    || post.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (title_hits, rest): (Vec<Post>, Vec<Post>) = matches
            .into_iter()
            .partition(|post| post.title.to_lowercase().contains(&needle));

        debug!(
            query = %needle,
            title_hits = title_hits.len(),
            other_hits = rest.len(),
            "search complete"
        );

        let mut results = title_hits;
        results.extend(rest);
        Ok(results)
    }
}

/// Occurrence tally that remembers first-seen order, so count ties resolve
/// stably by encounter order.
struct TagTally {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl TagTally {
    fn new() -> Self {
        Self {
            counts: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn count(&mut self, tag: &str) {
        match self.index.get(tag) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(tag.to_string(), self.counts.len());
                self.counts.push((tag.to_string(), 1));
            }
        }
    }

    fn top(mut self, limit: usize) -> Vec<String> {
        // Stable sort keeps first-seen order within equal counts.
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(limit)
            .map(|(tag, _)| tag)
            .collect()
    }
}
