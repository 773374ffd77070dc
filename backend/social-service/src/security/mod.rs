/// Security primitives for social-service
///
/// - **password**: Argon2id password hashing
/// - **tokens**: opaque session tokens and their stored digests, OAuth state
///   and PKCE values
pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{generate_session_token, hash_session_token};
