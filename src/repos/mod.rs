/*
 * Responsibility
 * - データアクセス層 (in-memory)
 */
pub mod error;
pub mod post_repo;
