use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// User entity - profile plus the follow graph back-references
///
/// `followers` is a back-reference set written by *other* users' follow
/// actions; `following` is the owned side. A uid never appears in its own
/// `followers` or `following`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Post entity
///
/// `likes` and `liked_by` are kept in lockstep by a single combined document
/// write; at quiescence `likes == liked_by.len()`. Drafts never reach public
/// aggregations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Comment entity - immutable once created
///
/// `parent_id` is absent on root comments. When present it names a root
/// comment on the same post; nesting is exactly one level deep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_photo: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::Document;
    use serde_json::json;

    #[test]
    fn sparse_post_document_decodes_with_defaults() {
        let doc = Document {
            id: "p1".to_string(),
            fields: json!({ "authorId": "u1" }).as_object().unwrap().clone(),
        };

        let post: Post = doc.decode().unwrap();
        assert_eq!(post.id, "p1");
        assert_eq!(post.author_id, "u1");
        assert!(post.tags.is_empty());
        assert!(post.liked_by.is_empty());
        assert_eq!(post.likes, 0);
        assert_eq!(post.views, 0);
        assert!(!post.is_draft);
    }

    #[test]
    fn user_document_round_trips_with_store_field_names() {
        let doc = Document {
            id: "u1".to_string(),
            fields: json!({
                "uid": "u1",
                "displayName": "Ada",
                "photoURL": "https://example.com/a.png",
                "followers": ["u2"],
            })
            .as_object()
            .unwrap()
            .clone(),
        };

        let user: User = doc.decode().unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.display_name, "Ada");
        assert_eq!(user.photo_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(user.followers, vec!["u2"]);
        assert!(user.following.is_empty());

        let fields = Document::encode(&user).unwrap();
        assert!(fields.contains_key("displayName"));
        assert!(fields.contains_key("photoURL"));
    }

    #[test]
    fn root_comment_has_no_parent_field_when_encoded() {
        let comment = Comment {
            id: "c1".to_string(),
            post_id: "p1".to_string(),
            author_id: "u1".to_string(),
            author_name: "Ada".to_string(),
            author_photo: None,
            content: "first".to_string(),
            created_at: Utc::now(),
            parent_id: None,
        };

        let fields = Document::encode(&comment).unwrap();
        assert!(!fields.contains_key("parentId"));
        assert!(comment.is_root());
    }
}
