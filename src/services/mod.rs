/*
 * Responsibility
 * - 外部サービス連携 (identity provider) をまとめる
 */
pub mod identity;
