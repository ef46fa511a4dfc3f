//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;

/// Local storage key for the persisted session
const SESSION_KEY: &str = "arregmatica_session";

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Signed-in session, if any
    pub session: RwSignal<Option<SessionInfo>>,
    /// WebSocket connection status
    pub ws_connected: RwSignal<bool>,
    /// Bumped when a post, like or comment changes anywhere in the feed
    pub feed_version: RwSignal<u64>,
    /// Bumped when a group or message changes
    pub chat_version: RwSignal<u64>,
    /// Bumped when a score changes
    pub scores_version: RwSignal<u64>,
    /// Bumped when a story is posted or expires
    pub stories_version: RwSignal<u64>,
    /// Global loading state
    pub loading: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// A signed-in session as returned by the auth endpoints
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SessionInfo {
    pub token: String,
    pub uid: String,
    pub username: String,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        session: create_rw_signal(load_session()),
        ws_connected: create_rw_signal(false),
        feed_version: create_rw_signal(0),
        chat_version: create_rw_signal(0),
        scores_version: create_rw_signal(0),
        stories_version: create_rw_signal(0),
        loading: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Whether a user session is active
    pub fn signed_in(&self) -> bool {
        self.session.get().is_some()
    }

    /// Bearer token of the active session
    pub fn token(&self) -> Option<String> {
        self.session.get().map(|s| s.token)
    }

    /// Record a new session and persist it across reloads
    pub fn set_session(&self, session: SessionInfo) {
        save_session(Some(&session));
        self.session.set(Some(session));
    }

    /// Drop the active session
    pub fn clear_session(&self) {
        save_session(None);
        self.session.set(None);
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        }).forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        }).forget();
    }

    /// Clear error message
    pub fn clear_error(&self) {
        self.error.set(None);
    }
}

/// Load the persisted session from local storage
fn load_session() -> Option<SessionInfo> {
    let window = web_sys::window()?;
    let storage = window.local_storage().ok()??;
    let raw = storage.get_item(SESSION_KEY).ok()??;
    serde_json::from_str(&raw).ok()
}

/// Persist (or clear) the session in local storage
fn save_session(session: Option<&SessionInfo>) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            match session.and_then(|s| serde_json::to_string(s).ok()) {
                Some(raw) => {
                    let _ = storage.set_item(SESSION_KEY, &raw);
                }
                None => {
                    let _ = storage.remove_item(SESSION_KEY);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roundtrip() {
        let session = SessionInfo {
            token: "a".repeat(64),
            uid: "u1".to_string(),
            username: "ada".to_string(),
        };
        let raw = serde_json::to_string(&session).unwrap();
        let parsed: SessionInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_session_parses_server_shape() {
        // Matches what POST /auth/login returns
        let raw = r#"{"token":"deadbeef","uid":"u42","username":"grace"}"#;
        let parsed: SessionInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.username, "grace");
    }
}
