use std::sync::Arc;

use chrono::Utc;
use doc_store::{Document, DocumentStore, FieldOp};
use serde_json::Value;

use crate::domain::models::User;
use crate::domain::USERS;
use crate::error::{ServiceError, ServiceResult};
use crate::session::Session;

/// User profile records: signup document creation and owner-only edits.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the user document at signup, keyed by the identity uid, with
    /// empty follow sets.
    pub async fn create_user(&self, session: &Session, email: &str) -> ServiceResult<User> {
        let uid = session.require_uid()?;

        let user = User {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: session.display_name.clone(),
            photo_url: session.photo_url.clone(),
            bio: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: Utc::now(),
        };

        let fields = Document::encode(&user)?;
        self.store.put(USERS, uid, fields).await?;
        Ok(user)
    }

    /// Owner edit of the profile fields. The follow sets are back-reference
    /// data and are never written here.
    pub async fn update_profile(
        &self,
        session: &Session,
        display_name: &str,
        bio: &str,
    ) -> ServiceResult<()> {
        let uid = session.require_uid()?;

        self.store
            .update(
                USERS,
                uid,
                vec![
                    (
                        "displayName".to_string(),
                        FieldOp::Set(Value::from(display_name)),
                    ),
                    ("bio".to_string(), FieldOp::Set(Value::from(bio))),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_user(&self, uid: &str) -> ServiceResult<User> {
        let user = self
            .store
            .get(USERS, uid)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", USERS, uid)))?
            .decode()?;
        Ok(user)
    }
}
