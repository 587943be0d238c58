//! End-to-end checks of the engagement managers against the in-memory
//! store: follow round-trips, like invariants, and thread assembly.

use std::sync::Arc;

use doc_store::{Document, DocumentStore, MemoryStore};
use engagement_service::domain::models::{Post, User};
use engagement_service::domain::{POSTS, USERS};
use engagement_service::error::ServiceError;
use engagement_service::services::{CommentService, FollowService, LikeService, PostService};
use engagement_service::services::posts::NewPost;
use engagement_service::session::Session;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn seed_user(store: &MemoryStore, uid: &str) {
    let user = User {
        uid: uid.to_string(),
        email: format!("{uid}@example.com"),
        display_name: uid.to_string(),
        photo_url: None,
        bio: None,
        followers: Vec::new(),
        following: Vec::new(),
        created_at: chrono::Utc::now(),
    };
    store
        .put(USERS, uid, Document::encode(&user).unwrap())
        .await
        .unwrap();
}

async fn load_user(store: &MemoryStore, uid: &str) -> User {
    store
        .get(USERS, uid)
        .await
        .unwrap()
        .unwrap()
        .decode()
        .unwrap()
}

async fn load_post(store: &MemoryStore, id: &str) -> Post {
    store
        .get(POSTS, id)
        .await
        .unwrap()
        .unwrap()
        .decode()
        .unwrap()
}

#[tokio::test]
async fn follow_toggle_twice_round_trips_to_the_starting_state() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    seed_user(&store, "alice").await;
    seed_user(&store, "bob").await;

    let follows = FollowService::new(store.clone());
    let alice = Session::new("alice", "alice", None);

    let before_bob = load_user(&store, "bob").await;
    let before_alice = load_user(&store, "alice").await;

    let first = follows.toggle_follow(&alice, "bob").await.unwrap();
    assert!(first.is_following);
    let second = follows.toggle_follow(&alice, "bob").await.unwrap();
    assert!(!second.is_following);
    assert_eq!(second.followers_count, before_bob.followers.len() as i64);

    let after_bob = load_user(&store, "bob").await;
    let after_alice = load_user(&store, "alice").await;
    assert_eq!(after_bob.followers, before_bob.followers);
    assert_eq!(after_alice.following, before_alice.following);
}

#[tokio::test]
async fn like_toggle_holds_the_counter_invariant_through_publish_flow() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let posts = PostService::new(store.clone());
    let likes = LikeService::new(store.clone());

    let author = Session::new("author", "Author", None);
    let reader = Session::new("reader", "Reader", None);

    let post = posts
        .publish(
            &author,
            NewPost {
                title: "Counters".to_string(),
                content: "and sets".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = likes
        .toggle_like(&reader, &post.id, &post.liked_by)
        .await
        .unwrap();
    assert!(outcome.is_liked);

    let stored = load_post(&store, &post.id).await;
    assert_eq!(stored.likes, stored.liked_by.len() as i64);
    assert!(stored.liked_by.contains(&"reader".to_string()));

    // Toggle back with a fresh snapshot; membership and counter drop
    // together.
    let outcome = likes
        .toggle_like(&reader, &post.id, &stored.liked_by)
        .await
        .unwrap();
    assert!(!outcome.is_liked);

    let stored = load_post(&store, &post.id).await;
    assert_eq!(stored.likes, 0);
    assert!(stored.liked_by.is_empty());
}

#[tokio::test]
async fn two_clients_liking_concurrently_converge() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let posts = PostService::new(store.clone());
    let likes = LikeService::new(store.clone());

    let author = Session::new("author", "Author", None);
    let post = posts
        .publish(
            &author,
            NewPost {
                title: "Race".to_string(),
                content: "tolerant".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Both clients loaded the post before either wrote; the commutative
    // field ops still converge to the correct final state.
    let snapshot = post.liked_by.clone();
    let session_a = Session::new("u1", "U1", None);
    let session_b = Session::new("u2", "U2", None);
    let a = likes.toggle_like(&session_a, &post.id, &snapshot);
    let b = likes.toggle_like(&session_b, &post.id, &snapshot);
    let (ra, rb) = tokio::join!(a, b);
    ra.unwrap();
    rb.unwrap();

    let stored = load_post(&store, &post.id).await;
    assert_eq!(stored.likes, 2);
    assert_eq!(stored.liked_by.len(), 2);
}

#[tokio::test]
async fn partial_follow_failure_is_reported_and_self_heals_on_retry() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    seed_user(&store, "alice").await;
    seed_user(&store, "bob").await;

    let follows = FollowService::new(store.clone());
    let alice = Session::new("alice", "alice", None);

    store.fail_updates_after(1);
    let err = follows.toggle_follow(&alice, "bob").await.unwrap_err();
    assert!(matches!(err, ServiceError::PartialFailure { .. }));
    store.clear_failures();

    // First retry observes the dangling edge and unwinds it; the second
    // lands the symmetric follow.
    follows.toggle_follow(&alice, "bob").await.unwrap();
    let outcome = follows.toggle_follow(&alice, "bob").await.unwrap();
    assert!(outcome.is_following);

    let bob = load_user(&store, "bob").await;
    let alice_doc = load_user(&store, "alice").await;
    assert_eq!(bob.followers, vec!["alice"]);
    assert_eq!(alice_doc.following, vec!["bob"]);
}

#[tokio::test]
async fn comment_flow_builds_the_expected_tree() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let comments = CommentService::new(store);

    let ada = Session::new("ada", "Ada", None);
    let grace = Session::new("grace", "Grace", None);

    let first = comments
        .post_comment(&ada, "p1", "first!", None)
        .await
        .unwrap();
    let reply = comments
        .post_comment(&grace, "p1", "welcome", Some(&first.comment.id))
        .await
        .unwrap();
    comments
        .post_comment(&ada, "p1", "second thread", None)
        .await
        .unwrap();

    let threads = comments.assemble("p1").await.unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].root.id, first.comment.id);
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].replies[0].id, reply.comment.id);
    assert!(threads[1].replies.is_empty());
}
