use std::sync::Arc;

use chrono::Utc;
use doc_store::{Document, DocumentStore, FieldOp};
use serde_json::Value;

use crate::domain::models::Post;
use crate::domain::POSTS;
use crate::error::{ServiceError, ServiceResult};
use crate::session::Session;

/// Author-supplied content for a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
}

/// Author-supplied edits. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_draft: Option<bool>,
}

/// Post authoring: create, draft, and edit operations owned by the author.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Publish a post. Requires both a title and content.
    pub async fn publish(&self, session: &Session, draft: NewPost) -> ServiceResult<Post> {
        session.require_uid()?;
        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(ServiceError::InvalidOperation(
                "a post needs both a title and content".to_string(),
            ));
        }
        self.create_post(session, draft, false).await
    }

    /// Save a draft. Requires a title; content may still be empty.
    pub async fn save_draft(&self, session: &Session, draft: NewPost) -> ServiceResult<Post> {
        session.require_uid()?;
        if draft.title.trim().is_empty() {
            return Err(ServiceError::InvalidOperation(
                "a draft needs a title".to_string(),
            ));
        }
        self.create_post(session, draft, true).await
    }

    async fn create_post(
        &self,
        session: &Session,
        draft: NewPost,
        is_draft: bool,
    ) -> ServiceResult<Post> {
        let now = Utc::now();
        let mut post = Post {
            id: String::new(),
            author_id: session.uid.clone(),
            author_name: session.display_name.clone(),
            title: draft.title.trim().to_string(),
            content: draft.content,
            cover_image: draft.cover_image,
            tags: normalize_tags(draft.tags),
            is_draft,
            likes: 0,
            liked_by: Vec::new(),
            views: 0,
            created_at: now,
            updated_at: now,
        };

        let fields = Document::encode(&post)?;
        post.id = self.store.create(POSTS, fields).await?;
        Ok(post)
    }

    /// Apply author edits to an existing post. Only the author may edit.
    pub async fn update_post(
        &self,
        session: &Session,
        post_id: &str,
        changes: PostChanges,
    ) -> ServiceResult<()> {
        let uid = session.require_uid()?;

        let post: Post = self
            .store
            .get(POSTS, post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", POSTS, post_id)))?
            .decode()?;
        if post.author_id != uid {
            return Err(ServiceError::InvalidOperation(
                "only the author can edit a post".to_string(),
            ));
        }

        let mut ops = Vec::new();
        if let Some(title) = changes.title {
            ops.push(("title".to_string(), FieldOp::Set(Value::from(title))));
        }
        if let Some(content) = changes.content {
            ops.push(("content".to_string(), FieldOp::Set(Value::from(content))));
        }
        if let Some(cover_image) = changes.cover_image {
            ops.push((
                "coverImage".to_string(),
                FieldOp::Set(Value::from(cover_image)),
            ));
        }
        if let Some(tags) = changes.tags {
            ops.push((
                "tags".to_string(),
                FieldOp::Set(Value::from(normalize_tags(tags))),
            ));
        }
        if let Some(is_draft) = changes.is_draft {
            ops.push(("isDraft".to_string(), FieldOp::Set(Value::from(is_draft))));
        }
        if ops.is_empty() {
            return Ok(());
        }
        ops.push((
            "updatedAt".to_string(),
            serde_json::to_value(Utc::now()).map(FieldOp::Set)?,
        ));

        self.store.update(POSTS, post_id, ops).await?;
        Ok(())
    }

    /// Fetch a post, optionally counting the read as a view.
    ///
    /// A failed view increment does not fail the read; it is logged and the
    /// fetched snapshot is returned unchanged.
    pub async fn get_post(&self, post_id: &str, record_view: bool) -> ServiceResult<Post> {
        let mut post: Post = self
            .store
            .get(POSTS, post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", POSTS, post_id)))?
            .decode()?;

        if record_view {
            match self
                .store
                .update(
                    POSTS,
                    post_id,
                    vec![("views".to_string(), FieldOp::IncrementBy(1))],
                )
                .await
            {
                Ok(()) => post.views += 1,
                Err(err) => {
                    tracing::warn!(post_id, error = ?err, "view increment failed");
                }
            }
        }
        Ok(post)
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
