//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use democopilot_core::clock::Clock;
use democopilot_core::provider::CollaboratorProvider;
use democopilot_orchestration::application::coordinator::SessionCoordinator;
use democopilot_orchestration::config::EngineConfig;
use tokio::sync::broadcast;

use crate::events::{BroadcastObserver, DemoEvent, EVENT_BUFFER};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of live sessions.
    pub coordinator: Arc<SessionCoordinator>,
    /// Directory searched for named scripts.
    pub script_dir: PathBuf,
    /// Source of the SSE event stream. The coordinator's broadcast observer
    /// publishes here.
    pub events: broadcast::Sender<DemoEvent>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        script_dir: PathBuf,
        events: broadcast::Sender<DemoEvent>,
    ) -> Self {
        Self {
            coordinator,
            script_dir,
            events,
        }
    }

    /// Builds a coordinator over `provider` whose sessions publish to the
    /// event stream.
    #[must_use]
    pub fn with_provider(
        provider: Arc<dyn CollaboratorProvider>,
        clock: Arc<dyn Clock>,
        engine: EngineConfig,
        script_dir: PathBuf,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let coordinator = SessionCoordinator::new(provider, clock, engine)
            .with_observer(Arc::new(BroadcastObserver::new(events.clone())));
        Self::new(Arc::new(coordinator), script_dir, events)
    }
}
