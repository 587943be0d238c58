pub mod comments;
pub mod feed;
pub mod follow;
pub mod likes;
pub mod posts;
pub mod profile;

pub use comments::CommentService;
pub use feed::FeedService;
pub use follow::FollowService;
pub use likes::LikeService;
pub use posts::PostService;
pub use profile::ProfileService;
