use std::sync::Arc;

use crate::session::SessionManager;

/// Shared state handed to every connection.
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}
