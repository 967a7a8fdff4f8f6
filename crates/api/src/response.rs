//! Success envelope for API handlers.
//!
//! Successful responses are `{ "data": ... }`; failures are rendered by
//! [`crate::error::AppError`] as `{ "error", "code" }`.

use serde::Serialize;

/// `{ "data": T }` wrapper around a handler's payload.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
