//! Axum host for the dispatch engine.
//!
//! Decodes HTTP requests into engine contexts, carries the session id
//! in a cookie, serves forward destinations from a pages directory,
//! and maps pipeline errors onto HTTP statuses.

pub mod cookie;
pub mod extract;
pub mod respond;
pub mod serve;

pub use extract::TempStore;
pub use respond::PageWriter;
pub use serve::{router, serve, SiteServer};
