/*
 * Responsibility
 * - Tweets の request/response DTO
 * - author / id はサーバ側で決めるので request には持たせない
 */
use serde::{Deserialize, Serialize};

use crate::repos::post_repo::Post;

/// Unknown fields (`author`, `id`, ...) are ignored on purpose.
#[derive(Debug, Deserialize)]
pub struct CreateTweetRequest {
    #[serde(alias = "Copy")]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub id: String,
    pub body: String,
    pub author: String,
}

impl From<Post> for TweetResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            body: post.body,
            author: post.author,
        }
    }
}
