//! Server-sent event stream of session activity.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Router, routing::get};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Query parameters for GET /api/v1/events.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// Only forward events for this session.
    pub session_id: Option<Uuid>,
}

/// GET /api/v1/events
async fn event_stream(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(session_id = ?filter.session_id, "event stream subscriber connected");

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(move |received| {
        let wanted = filter.session_id;
        async move {
            let event = match received {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "event stream subscriber lagged");
                    return None;
                }
            };
            if wanted.is_some_and(|id| id != event.session_id()) {
                return None;
            }
            match Event::default().event(event.name()).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    warn!(error = %e, "failed to encode event");
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Returns the event stream router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(event_stream))
}
