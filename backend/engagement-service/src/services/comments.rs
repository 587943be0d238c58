use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use doc_store::{Document, DocumentStore, Filter};
use uuid::Uuid;

use crate::domain::models::Comment;
use crate::domain::COMMENTS;
use crate::error::{ServiceError, ServiceResult};
use crate::session::Session;

/// A root comment with its direct replies, both ascending by creation time.
#[derive(Debug, Clone)]
pub struct CommentThread {
    pub root: Comment,
    pub replies: Vec<Comment>,
}

/// A comment posted optimistically. `local_id` is the client-generated id
/// shown before the durable write settled; once settled, `comment.id` is
/// the durable id and `ack_pending` is false. Callers evict the local entry
/// keyed by `local_id` when the receipt arrives.
#[derive(Debug, Clone)]
pub struct PendingComment {
    pub local_id: String,
    pub comment: Comment,
    pub ack_pending: bool,
}

/// Comment thread assembler: flat comment documents in, two-level reply
/// tree out.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn DocumentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load all comments for a post and reconstruct the thread tree.
    ///
    /// The store gives no ordering guarantee; the full set is sorted
    /// ascending by creation time, then partitioned into roots and direct
    /// replies. Replies whose parent is not a loaded root are dropped.
    pub async fn assemble(&self, post_id: &str) -> ServiceResult<Vec<CommentThread>> {
        let docs = self
            .store
            .query(COMMENTS, Filter::eq("postId", post_id))
            .await?;

        let mut comments = docs
            .iter()
            .map(Document::decode::<Comment>)
            .collect::<Result<Vec<_>, _>>()?;
        comments.sort_by_key(|c| c.created_at);

        let mut roots = Vec::new();
        let mut replies: HashMap<String, Vec<Comment>> = HashMap::new();
        for comment in comments {
            match &comment.parent_id {
                None => roots.push(comment),
                Some(parent) => replies.entry(parent.clone()).or_default().push(comment),
            }
        }

        let threads = roots
            .into_iter()
            .map(|root| {
                let replies = replies.remove(&root.id).unwrap_or_default();
                CommentThread { root, replies }
            })
            .collect();
        Ok(threads)
    }

    /// Post a comment, optionally as a reply to a root comment.
    ///
    /// The returned receipt carries the client-generated id the caller may
    /// have rendered optimistically, alongside the durable comment. A reply
    /// to a reply is flattened under the target's own root, so nesting never
    /// exceeds one level.
    pub async fn post_comment(
        &self,
        session: &Session,
        post_id: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> ServiceResult<PendingComment> {
        session.require_uid()?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "comment content is empty".to_string(),
            ));
        }

        let parent_id = match reply_to {
            None => None,
            Some(target_id) => Some(self.resolve_reply_root(post_id, target_id).await?),
        };

        let local_id = Uuid::new_v4().to_string();
        let mut comment = Comment {
            id: local_id.clone(),
            post_id: post_id.to_string(),
            author_id: session.uid.clone(),
            author_name: session.display_name.clone(),
            author_photo: session.photo_url.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
            parent_id,
        };

        let fields = Document::encode(&comment)?;
        let durable_id = self.store.create(COMMENTS, fields).await?;
        comment.id = durable_id;

        Ok(PendingComment {
            local_id,
            comment,
            ack_pending: false,
        })
    }

    /// Map a reply target to the root it hangs under. Targets that are
    /// themselves replies flatten to their own parent.
    async fn resolve_reply_root(&self, post_id: &str, target_id: &str) -> ServiceResult<String> {
        let target: Comment = self
            .store
            .get(COMMENTS, target_id)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidOperation(format!("reply target {} does not exist", target_id))
            })?
            .decode()?;

        if target.post_id != post_id {
            return Err(ServiceError::InvalidOperation(
                "reply target belongs to a different post".to_string(),
            ));
        }

        Ok(target.parent_id.unwrap_or_else(|| target_id.to_string()))
    }
}
