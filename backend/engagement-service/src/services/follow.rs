use std::sync::Arc;

use doc_store::{DocumentStore, FieldOp};
use serde_json::Value;

use crate::domain::models::User;
use crate::domain::USERS;
use crate::error::{ServiceError, ServiceResult};
use crate::session::Session;

/// Outcome of a follow toggle: the flipped state plus an optimistic local
/// counter (freshly-read count adjusted by the delta just written).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowOutcome {
    pub is_following: bool,
    pub followers_count: i64,
}

/// Relationship manager: owns the follow graph.
///
/// Both sides of a follow relation live on different documents, and the
/// store only guarantees per-document atomicity. The two writes here are
/// sequential and unguarded; a failure of the second after the first leaves
/// a dangling edge and surfaces as `PartialFailure`. Re-running the toggle
/// reconciles from a fresh read.
#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn DocumentStore>,
}

impl FollowService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Flip the follow relation between the acting user and the target
    /// author.
    ///
    /// Present state is observed from a fresh read of the target's
    /// `followers` set. Two toggles issued before the first write settles
    /// read the same stale state and can mis-flip; callers must not issue a
    /// second toggle for the same target until this one resolves.
    pub async fn toggle_follow(
        &self,
        session: &Session,
        target_author_id: &str,
    ) -> ServiceResult<FollowOutcome> {
        let uid = session.require_uid()?;
        if uid == target_author_id {
            return Err(ServiceError::InvalidOperation(
                "you cannot follow yourself".to_string(),
            ));
        }

        let target: User = self
            .store
            .get(USERS, target_author_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", USERS, target_author_id)))?
            .decode()?;

        let is_following = target.followers.iter().any(|f| f == uid);
        let followers_count = target.followers.len() as i64;

        let (target_op, actor_op) = if is_following {
            (
                FieldOp::RemoveFromSet(Value::from(uid)),
                FieldOp::RemoveFromSet(Value::from(target_author_id)),
            )
        } else {
            (
                FieldOp::AddToSet(Value::from(uid)),
                FieldOp::AddToSet(Value::from(target_author_id)),
            )
        };

        self.store
            .update(
                USERS,
                target_author_id,
                vec![("followers".to_string(), target_op)],
            )
            .await?;

        if let Err(err) = self
            .store
            .update(USERS, uid, vec![("following".to_string(), actor_op)])
            .await
        {
            tracing::warn!(
                actor = uid,
                target = target_author_id,
                error = ?err,
                "follow edge left asymmetric: followers committed, following write failed"
            );
            return Err(ServiceError::PartialFailure {
                completed: "target followers",
                source: err,
            });
        }

        let delta = if is_following { -1 } else { 1 };
        Ok(FollowOutcome {
            is_following: !is_following,
            followers_count: followers_count + delta,
        })
    }

    /// Current relation state from a fresh read, for load-time display.
    pub async fn follow_state(
        &self,
        session: &Session,
        author_id: &str,
    ) -> ServiceResult<FollowOutcome> {
        let uid = session.require_uid()?;

        let target: User = self
            .store
            .get(USERS, author_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", USERS, author_id)))?
            .decode()?;

        Ok(FollowOutcome {
            is_following: target.followers.iter().any(|f| f == uid),
            followers_count: target.followers.len() as i64,
        })
    }
}
