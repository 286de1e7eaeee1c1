//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between repositories and the job service client.

pub mod dispatch;
pub mod document;
pub mod normalizer;

// Re-export for convenience
pub use dispatch as dispatch_service;
pub use document as document_service;
