// src/utils/path.rs

use axum::extract::FromRequestParts;

use crate::error::AppError;

/// `axum::extract::Path` with the same rejection treatment as `AppJson`:
/// an unparsable id answers 400 `{"error": ...}`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
