//! Core domain types
//!
//! These types describe a single orchestration call against the remote job
//! service (request, handle, status, result) and the routes extracted from an
//! ingested API description. They are shared between the client (which
//! produces runs) and the server (which caches routes and dispatches them).

pub mod document;
pub mod poll;
pub mod run;
