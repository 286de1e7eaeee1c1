//! Repository Module
//!
//! Data access layer for the server.
//! Documents and their routes live in a plain key/value cache.

pub mod cache;
pub mod route;

// Re-export for convenience
pub use cache::{MemoryCache, RouteCache};
pub use route as route_repository;
