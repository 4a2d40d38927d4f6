/*
 * Responsibility
 * - posts (tweets) の in-memory ストア
 * - list / get / append / remove_if のみ公開し、Vec を直接触らせない
 * - read-modify-write は 1 つの write guard の中で完結させる
 */
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub body: String,
    pub author: String,
}

/// Process-lifetime post collection. Cheap to clone; clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct PostStore {
    posts: Arc<RwLock<Vec<Post>>>,
}

impl PostStore {
    pub fn new(seed: Vec<Post>) -> Self {
        Self {
            posts: Arc::new(RwLock::new(seed)),
        }
    }

    /// Store seeded with the default welcome post.
    pub fn seeded() -> Self {
        Self::new(vec![Post {
            id: "1".to_string(),
            body: "This is our first default tweet!".to_string(),
            author: "maricris@magic.link".to_string(),
        }])
    }

    pub async fn list(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }

    /// First post with `id`, in insertion order.
    pub async fn get(&self, id: &str) -> Option<Post> {
        self.posts.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn append(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Conflict(post.id));
        }
        posts.push(post.clone());
        Ok(post)
    }

    /// Removes and returns the first post matching `predicate`.
    pub async fn remove_if<F>(&self, predicate: F) -> Option<Post>
    where
        F: Fn(&Post) -> bool,
    {
        let mut posts = self.posts.write().await;
        let index = posts.iter().position(predicate)?;
        Some(posts.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }
}
