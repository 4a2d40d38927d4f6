//! bearer token (DID token) 検証 → Identity を extensions に入れる
//!
//! 1. `Authorization: Bearer <token>` を取り出す (無ければ MissingCredential)
//! 2. IdentityVerifier で検証 (失敗時は handler を呼ばずに返す)
//! 3. Identity を extensions に格納し、`CurrentIdentity` extractor 経由で handler へ渡す
//!
//! 所有者チェック (author == identity.email) は handler 側の責務。

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// 保護したいルートに `from_fn_with_state` で掛ける。
///
/// 例：
/// ```ignore
/// post(create_tweet).route_layer(middleware::from_fn_with_state(state.clone(), require_identity))
/// ```
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = match state.identity.verify_header(header).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                method = %req.method(),
                uri = %req.uri(),
                "bearer authentication rejected"
            );
            return Err(err.into());
        }
    };

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
