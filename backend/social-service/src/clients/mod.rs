//! REST clients for the services the backend delegates to
//!
//! Chat and file hosting sit behind traits so handlers can be tested
//! without the real providers.

pub mod chat;
pub mod file_host;
pub mod google;

pub use chat::{ChatService, ChatUser, ChatUserUpdate, StreamChatClient};
pub use file_host::{FileHost, UploadThingClient};
pub use google::{GoogleOAuthClient, GoogleUser, OAuthError};
