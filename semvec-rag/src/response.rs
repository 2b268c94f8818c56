//! Uniform success/failure envelope returned across the API boundary.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `{success: true, data}` or `{success: false, error}`.
///
/// Exactly one of `data` and `error` is set. Internal errors are reduced to
/// their [`user_message`](crate::RagError::user_message) so no component
/// error reaches a client unconverted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// The result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// A user-facing message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// A failed response carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}
