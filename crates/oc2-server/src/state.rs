use oc2_core::Relay;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    /// Largest request body read before a submission is rejected.
    pub body_limit: usize,
}

impl AppState {
    pub fn new(relay: Arc<Relay>, body_limit: usize) -> Self {
        Self { relay, body_limit }
    }
}
