use std::sync::Arc;

use doc_store::{DocumentStore, FieldOp};
use serde_json::Value;

use crate::domain::POSTS;
use crate::error::ServiceResult;
use crate::session::Session;

/// Outcome of a like toggle: the new membership state and the optimistic
/// counter derived from the caller's snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOutcome {
    pub likes: i64,
    pub is_liked: bool,
}

/// Engagement counter manager: owns like toggling on a post.
///
/// Counter and membership set live on the same document, so the increment
/// and the set mutation go out in one combined write; `likes == |likedBy|`
/// holds at quiescence without application-level locking.
#[derive(Clone)]
pub struct LikeService {
    store: Arc<dyn DocumentStore>,
}

impl LikeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Flip the acting user's like on a post.
    ///
    /// `current_liked_by` is the membership set the caller loaded with the
    /// post; it is not re-fetched here. On store failure nothing is
    /// committed and the prior state stands.
    pub async fn toggle_like(
        &self,
        session: &Session,
        post_id: &str,
        current_liked_by: &[String],
    ) -> ServiceResult<LikeOutcome> {
        let uid = session.require_uid()?;
        let is_liked = current_liked_by.iter().any(|u| u == uid);

        let ops = if is_liked {
            vec![
                ("likes".to_string(), FieldOp::IncrementBy(-1)),
                (
                    "likedBy".to_string(),
                    FieldOp::RemoveFromSet(Value::from(uid)),
                ),
            ]
        } else {
            vec![
                ("likes".to_string(), FieldOp::IncrementBy(1)),
                ("likedBy".to_string(), FieldOp::AddToSet(Value::from(uid))),
            ]
        };

        self.store.update(POSTS, post_id, ops).await?;

        let count = current_liked_by.len() as i64;
        Ok(LikeOutcome {
            likes: if is_liked { (count - 1).max(0) } else { count + 1 },
            is_liked: !is_liked,
        })
    }

    /// Count a view of a post. System-initiated on read; no identity
    /// required.
    pub async fn record_view(&self, post_id: &str) -> ServiceResult<()> {
        self.store
            .update(
                POSTS,
                post_id,
                vec![("views".to_string(), FieldOp::IncrementBy(1))],
            )
            .await?;
        Ok(())
    }
}
