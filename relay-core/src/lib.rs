//! Relay Core
//!
//! Core types shared by the Relay job service client and the Relay HTTP server.
//!
//! This crate contains:
//! - Domain types: runs, run states, polling configuration and API routes
//! - DTOs: request/response bodies exchanged over HTTP

pub mod domain;
pub mod dto;
