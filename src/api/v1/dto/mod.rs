pub mod login;
pub mod tweets;
