//! Real-Time Subscriptions
//!
//! Pushes committed store writes to WebSocket clients.
//!
//! ## Architecture
//!
//! - **SubscriptionHub**: Manages all active connections and their topics
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! A bridge task consumes the store's event broadcast and fans each event
//! out to every connection whose topic is a path prefix of the event.
//!
//! ## Usage
//!
//! Clients connect to `/ws` and subscribe to store path prefixes:
//! - `accounts/{uid}/posts` - One account's posts
//! - `groups/{name}/messages` - A chat group's messages
//! - `stories` - All stories
//! - `scores` - Score records (leaderboard updates)
//! - `` (empty topic) - Everything
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['groups/rustaceans/messages']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionId, HubConfig, HubError, SubscriptionHub};
pub use messages::{ClientMessage, ServerMessage};
