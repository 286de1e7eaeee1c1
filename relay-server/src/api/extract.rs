//! Request extractors
//!
//! Wrap axum's extractors so that a rejected path, query or body renders as
//! an `ApiError` like every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::api::error::ApiError;

/// JSON body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
