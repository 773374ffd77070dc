pub mod accounts;
pub mod comments;
pub mod interactions;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod sessions;
pub mod trends;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use interactions::InteractionService;
pub use media::MediaService;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use sessions::SessionService;
pub use trends::TrendsCache;
