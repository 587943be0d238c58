use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Identity token consumed from the external identity provider.
///
/// There is no ambient current-user state anywhere in this crate: every
/// operation that acts on behalf of a user takes a `&Session` explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl Session {
    pub fn new(
        uid: impl Into<String>,
        display_name: impl Into<String>,
        photo_url: Option<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            photo_url,
        }
    }

    /// Uid of a signed-in identity, or `Unauthenticated`.
    pub fn require_uid(&self) -> ServiceResult<&str> {
        if self.uid.trim().is_empty() {
            return Err(ServiceError::Unauthenticated);
        }
        Ok(&self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_uid_is_unauthenticated() {
        let session = Session::new("  ", "Nobody", None);
        assert!(matches!(
            session.require_uid(),
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[test]
    fn signed_in_uid_passes() {
        let session = Session::new("u1", "Someone", None);
        assert_eq!(session.require_uid().unwrap(), "u1");
    }
}
