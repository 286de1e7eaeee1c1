//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the remote job service and with
//! callers of the Relay HTTP API.

pub mod document;
pub mod run;
