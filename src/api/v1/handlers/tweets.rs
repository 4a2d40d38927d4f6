/*
 * Responsibility
 * - /tweets, /tweet 系 handler
 * - 作成/削除は CurrentIdentity を引数で受け取り、author の決定と所有者チェックをここで行う
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::tweets::{CreateTweetRequest, TweetResponse},
        extractors::CurrentIdentity,
    },
    error::AppError,
    repos::post_repo::Post,
    state::AppState,
};

pub async fn list_tweets(State(state): State<AppState>) -> Json<Vec<TweetResponse>> {
    tracing::info!("endpoint hit: list_tweets");

    let posts = state.posts.list().await;
    Json(posts.into_iter().map(TweetResponse::from).collect())
}

pub async fn get_tweet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TweetResponse>, AppError> {
    tracing::info!(%id, "endpoint hit: get_tweet");

    let post = state
        .posts
        .get(&id)
        .await
        .ok_or(AppError::not_found("tweet"))?;

    Ok(Json(post.into()))
}

pub async fn create_tweet(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    req: Result<Json<CreateTweetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TweetResponse>), AppError> {
    tracing::info!(author = identity.email(), "endpoint hit: create_tweet");

    let Json(req) = req.map_err(|e| AppError::bad_request("INVALID_JSON", e.body_text()))?;

    // author は必ず検証済み Identity から決める (request の値は信用しない)
    let post = Post {
        id: Uuid::new_v4().to_string(),
        body: req.body,
        author: identity.email().to_string(),
    };

    let created = state.posts.append(post).await?;
    tracing::info!(id = %created.id, "tweet created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<&'static str, AppError> {
    tracing::info!(%id, author = identity.email(), "endpoint hit: delete_tweet");

    // id 一致 かつ author 一致の最初の 1 件だけを消す。
    // 存在しない id と他人の tweet は同じ Forbidden で返す。
    let removed = state
        .posts
        .remove_if(|p| p.id == id && p.author == identity.email())
        .await;

    match removed {
        Some(_) => {
            tracing::info!(%id, "tweet deleted");
            Ok("Tweet has been deleted.")
        }
        None => Err(AppError::Forbidden),
    }
}
