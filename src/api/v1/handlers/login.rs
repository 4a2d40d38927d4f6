/*
 * Responsibility
 * - POST /login
 * - 検証済み Identity と client が送ってきた Email の一致確認のみ (session は発行しない)
 */
use axum::{Json, extract::rejection::JsonRejection};

use crate::{
    api::v1::{dto::login::LoginRequest, extractors::CurrentIdentity},
    error::AppError,
};

pub async fn login(
    CurrentIdentity(identity): CurrentIdentity,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<String, AppError> {
    tracing::info!("endpoint hit: login");

    let Json(req) = req.map_err(|e| AppError::bad_request("INVALID_JSON", e.body_text()))?;

    if req.email != identity.email() {
        tracing::warn!(issuer = identity.issuer(), "login email does not match identity");
        return Err(AppError::Unauthorized);
    }

    Ok(format!("Login verified. Email: {}", identity.email()))
}
