/*
 * Responsibility
 * - handler が受け取る extractor の公開インターフェース
 */
mod current_identity;

pub use current_identity::CurrentIdentity;
