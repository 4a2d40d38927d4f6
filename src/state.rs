/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - posts: PostStore, identity: IdentityVerifier
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::post_repo::PostStore;
use crate::services::identity::IdentityVerifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub posts: PostStore,
    pub identity: Arc<IdentityVerifier>,
}

impl AppState {
    pub fn new(posts: PostStore, identity: Arc<IdentityVerifier>) -> Self {
        Self { posts, identity }
    }
}
