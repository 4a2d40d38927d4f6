/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - AuthError / RepoError を統一的に変換
 * - provider 側の詳細はログにのみ残し、クライアントには返さない
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::identity::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bearer token is required")]
    MissingCredential,
    #[error("malformed identity token")]
    MalformedToken,
    #[error("identity token failed validation")]
    InvalidToken,
    #[error("could not resolve identity")]
    IdentityLookupFailed,
    #[error("unauthorized user login")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("conflict")]
    Conflict,
    #[error("request timed out")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                "MISSING_CREDENTIAL",
                "bearer token is required".into(),
            ),
            AppError::MalformedToken => (
                StatusCode::UNAUTHORIZED,
                "MALFORMED_TOKEN",
                "malformed identity token".into(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "identity token failed validation".into(),
            ),
            AppError::IdentityLookupFailed => (
                StatusCode::BAD_GATEWAY,
                "IDENTITY_LOOKUP_FAILED",
                "could not resolve identity".into(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized user login".into(),
            ),
            // 他人の tweet か存在しない id かは区別しない
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "you can't delete someone else's tweet".into(),
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Conflict => (StatusCode::CONFLICT, "CONFLICT", "conflict".into()),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                "request timed out".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => AppError::MissingCredential,
            AuthError::MalformedToken => AppError::MalformedToken,
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::IdentityLookupFailed => AppError::IdentityLookupFailed,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(id) => {
                tracing::warn!(%id, "post id collision");
                AppError::Conflict
            }
        }
    }
}
