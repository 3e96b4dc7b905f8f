// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::stellar::{HorizonError, TxError};
use crate::storage::StorageError;

/// HTTP error envelope returned by every endpoint.
///
/// All handlers catch domain failures at the top level and map them into
/// this structure; partial success is never reported as success.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl From<HorizonError> for ApiError {
    /// Ledger-layer failures surface with the gateway's own detail preserved
    /// verbatim. Rejections and activation failures are upstream faults, not
    /// client errors.
    fn from(err: HorizonError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl From<TxError> for ApiError {
    /// Assembly failures are caller or configuration faults, not ledger
    /// faults; amount and memo violations surface as client errors.
    fn from(err: TxError) -> Self {
        match err {
            TxError::AmountOutOfRange(_) | TxError::MemoTooLong(_) => {
                Self::bad_request(err.to_string())
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    /// Default record-store mapping. Handlers override where a missing row
    /// has a more specific meaning (e.g. an unconfigured institution).
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(detail) => Self::not_found(detail),
            StorageError::AlreadyExists(detail) => Self::conflict(detail),
            StorageError::InvalidState(detail) => Self::conflict(detail),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
