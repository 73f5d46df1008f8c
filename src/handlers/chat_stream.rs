use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::sse::Sse,
};
use log::info;
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::auth::middleware::BearerToken;
use crate::state::AppState;
use crate::stream::relay::{relay_chat, RelayStream};

/// Attach the browser's EventSource to a stashed chat request. The pending
/// request is claimed exactly once; a second attach on the same id is a 404.
pub async fn chat_stream(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    Extension(BearerToken(bearer)): Extension<BearerToken>,
) -> Result<Sse<RelayStream>, StatusCode> {
    let stream_id = params
        .get("stream_id")
        .cloned()
        .ok_or(StatusCode::BAD_REQUEST)?;
    let request = state
        .streams
        .claim(&stream_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    info!("attaching relay for stream {stream_id}");

    let cancel = state.streams.register(stream_id.clone());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(relay_chat(
        state.backend.clone(),
        state.streams.clone(),
        stream_id,
        request,
        bearer,
        tx,
        cancel,
    ));

    Ok(Sse::new(RelayStream::new(rx)))
}

/// Tear down a running relay. Safe to call for unknown or finished streams.
pub async fn cancel_stream(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<&'static str, StatusCode> {
    if let Some(stream_id) = params.get("stream_id") {
        info!("cancelling stream: {stream_id}");
        state.streams.cancel(stream_id);
        Ok("stream cancelled")
    } else {
        Ok("no stream id provided")
    }
}
