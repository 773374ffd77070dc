//! SQL access, one module per table.
//!
//! Functions that belong to a multi-statement write take a
//! `&mut Transaction`; the rest take the pool or any executor.

pub mod bookmarks;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod sessions;
pub mod users;
