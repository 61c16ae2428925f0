use std::sync::Arc;

use spidycore::Orchestrator;

/// Error type returned by dispatcher endpoints
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared dependencies handed to every handler
#[derive(Clone)]
pub struct HandlerDeps {
    pub orchestrator: Arc<Orchestrator>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}
