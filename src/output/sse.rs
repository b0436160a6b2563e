//! Server-Sent Events for the browser renderer

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::avatar::ModelManifest;
use crate::output::broadcast::RenderFrame;
use crate::AppState;

/// Create the merged `params` / `model` / `status` event stream
pub fn create_stream(app_state: Arc<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Late joiners get the current model right away
    let current = app_state.snapshot().model;
    let initial = tokio_stream::iter(current.map(|m| model_event(&m)));

    // Lagged receivers skip the frames they missed
    let frames = BroadcastStream::new(app_state.subscribe_frames())
        .filter_map(|result| result.ok().map(|frame| params_event(&frame)));
    let models = BroadcastStream::new(app_state.subscribe_models())
        .filter_map(|result| result.ok().map(|manifest| model_event(&manifest)));
    let status = BroadcastStream::new(app_state.subscribe_status())
        .filter_map(|result| result.ok().map(|message| status_event(&message)));

    let stream = initial
        .chain(frames.merge(models).merge(status))
        .map(Ok::<_, Infallible>);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn params_event(frame: &RenderFrame) -> Event {
    json_event("params", frame)
}

fn model_event(manifest: &ModelManifest) -> Event {
    json_event("model", manifest)
}

fn status_event(message: &str) -> Event {
    Event::default().event("status").data(message)
}

fn json_event<T: serde::Serialize>(name: &str, value: &T) -> Event {
    match serde_json::to_string(value) {
        Ok(data) => Event::default().event(name).data(data),
        Err(e) => {
            tracing::error!("Failed to serialize {} event: {}", name, e);
            Event::default().event(name).data("{}")
        }
    }
}
