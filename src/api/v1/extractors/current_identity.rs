use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::identity::Identity;
use crate::state::AppState;

/// Handler で、検証済み Identity を引数として受け取るための extractor
/// auth middleware が Identity を request.extensions() に insert 済みである前提
/// 見つからない場合は MissingCredential (middleware 未設定のルート)
pub struct CurrentIdentity(pub Identity);

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AppError::MissingCredential)
    }
}
