/*
 * Responsibility
 * - URL 構造を定義
 * - Bearer が必要なメソッドだけに route_layer で require_identity を掛ける
 *   (GET /tweet/{id} は公開、DELETE /tweet/{id} は保護)
 */
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::api::v1::handlers::{
    health::health,
    home::home,
    login::login,
    tweets::{create_tweet, delete_tweet, get_tweet, list_tweets},
};
use crate::middleware::auth::access::require_identity;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let gate = || middleware::from_fn_with_state(state.clone(), require_identity);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/tweets", get(list_tweets))
        .route("/tweet", post(create_tweet).route_layer(gate()))
        .route(
            "/tweet/{id}",
            get(get_tweet).merge(delete(delete_tweet).route_layer(gate())),
        )
        .route("/login", post(login).route_layer(gate()))
}
