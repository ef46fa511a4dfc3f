//! UI Components
//!
//! Reusable Leptos components for the Arregmatica client.

pub mod loading;
pub mod nav;
pub mod post_card;
pub mod toast;

pub use loading::{InlineLoading, ListSkeleton, Loading};
pub use nav::Nav;
pub use post_card::PostCard;
pub use toast::Toast;
