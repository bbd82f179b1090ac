use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use std::convert::Infallible;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{middleware::auth::OptionalAuth, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/views/stream", get(stream_views))
}

/// Server-sent `view_invalidated` events. Anonymous subscribers only see
/// public views; a user's own booking list changes go to that user.
async fn stream_views(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let viewer = caller.map(|c| c.user_id);
    let rx = state.views_tx.subscribe();

    // Lagged receivers drop the missed events; clients refetch on the next one.
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = result.ok()?;
        if !event.visible_to(viewer) {
            return None;
        }
        Event::default()
            .event("view_invalidated")
            .json_data(&event)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
