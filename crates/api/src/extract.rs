//! Request extractors whose rejections render as [`AppError`] JSON.
//!
//! Plain `axum::Json` and `axum::extract::Query` answer malformed input with
//! a text body; these wrappers keep the `{"error","code"}` shape.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
