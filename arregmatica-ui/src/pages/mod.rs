//! Pages
//!
//! Top-level page components for each route.

pub mod admin;
pub mod chat;
pub mod feed;
pub mod leaderboard;
pub mod login;
pub mod quiz;
pub mod tools;

pub use admin::Admin;
pub use chat::Chat;
pub use feed::Feed;
pub use leaderboard::Leaderboard;
pub use login::Login;
pub use quiz::Quiz;
pub use tools::Tools;
