use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures::stream::{Stream, StreamExt};
use log::{error, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, BackendError};
use crate::models::chat::ChatStreamRequest;
use crate::stream::{Fragment, RelayMessage, SseParser, StreamEvent, CANCELLED_SENTINEL, DONE_SENTINEL};

/// Result of pumping one chat stream. Exactly one outcome per pump: natural
/// end-of-data without the sentinel still counts as completion, a transport
/// error is fail-stop, and a fired cancellation token wins over both.
#[derive(Debug, PartialEq)]
pub enum PumpOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Drive a byte stream through the SSE parser, handing fragments to `sink`
/// in arrival order. Stops consuming as soon as the `[DONE]` sentinel is
/// parsed; the rest of the transport stream is never polled.
pub async fn pump_sse<S, B, E, F>(
    mut source: S,
    cancel: &CancellationToken,
    mut sink: F,
) -> PumpOutcome
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: FnMut(Fragment),
{
    let mut parser = SseParser::new();
    let mut events = Vec::new();

    while let Some(item) = source.next().await {
        if cancel.is_cancelled() {
            return PumpOutcome::Cancelled;
        }
        match item {
            Ok(chunk) => {
                parser.feed(chunk.as_ref(), &mut events);
                for event in events.drain(..) {
                    match event {
                        StreamEvent::Fragment(fragment) => sink(fragment),
                        StreamEvent::Done => return PumpOutcome::Completed,
                    }
                }
            }
            Err(e) => return PumpOutcome::Failed(e.to_string()),
        }
    }

    parser.finish(&mut events);
    for event in events.drain(..) {
        if let StreamEvent::Fragment(fragment) = event {
            sink(fragment);
        }
    }
    PumpOutcome::Completed
}

/// Process-wide registry of stashed chat requests (waiting for their
/// EventSource to attach; claimed exactly once) and live relay cancellation
/// tokens, shared through `AppState`.
#[derive(Clone, Default)]
pub struct StreamRegistry {
    pending: Arc<dashmap::DashMap<String, ChatStreamRequest>>,
    cancel_tokens: Arc<dashmap::DashMap<String, CancellationToken>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stash(&self, request: ChatStreamRequest) -> String {
        let stream_id = uuid::Uuid::new_v4().to_string();
        self.pending.insert(stream_id.clone(), request);
        stream_id
    }

    pub fn claim(&self, stream_id: &str) -> Option<ChatStreamRequest> {
        self.pending.remove(stream_id).map(|(_, request)| request)
    }

    pub fn register(&self, stream_id: String) -> CancellationToken {
        let token = CancellationToken::new();
        self.cancel_tokens.insert(stream_id, token.clone());
        token
    }

    pub fn cancel(&self, stream_id: &str) {
        if let Some((_, token)) = self.cancel_tokens.remove(stream_id) {
            token.cancel();
        }
    }

    pub fn release(&self, stream_id: &str) {
        self.cancel_tokens.remove(stream_id);
    }
}

/// SSE body handed to axum: drains the relay channel until the relay task
/// finishes and drops its sender. Cancellation flows through the task, which
/// always emits a terminal event before hanging up, so the client hears
/// `[CANCELLED]` instead of a bare connection drop.
pub struct RelayStream {
    receiver: mpsc::UnboundedReceiver<Result<Event, Infallible>>,
}

impl RelayStream {
    pub fn new(receiver: mpsc::UnboundedReceiver<Result<Event, Infallible>>) -> Self {
        Self { receiver }
    }
}

impl Stream for RelayStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

fn relay_event(message: &RelayMessage) -> Event {
    Event::default().data(serde_json::to_string(message).unwrap_or_default())
}

/// Connect to the backend's chat stream and relay it to the browser. Every
/// failure path terminates in exactly one terminal relay event.
pub async fn relay_chat(
    backend: Backend,
    registry: StreamRegistry,
    stream_id: String,
    request: ChatStreamRequest,
    bearer: String,
    tx: mpsc::UnboundedSender<Result<Event, Infallible>>,
    cancel: CancellationToken,
) {
    let response = match backend.open_chat_stream(&bearer, &request).await {
        Ok(response) => response,
        Err(BackendError::SessionExpired) => {
            info!("chat stream {stream_id} rejected: session expired");
            let _ = tx.send(Ok(relay_event(&RelayMessage::session_expired())));
            registry.release(&stream_id);
            return;
        }
        Err(e) => {
            error!("failed to open chat stream {stream_id}: {e}");
            let _ = tx.send(Ok(relay_event(&RelayMessage::error(e.to_string()))));
            registry.release(&stream_id);
            return;
        }
    };

    let outcome = pump_sse(response.bytes_stream(), &cancel, |fragment| {
        let _ = tx.send(Ok(relay_event(&RelayMessage::content(fragment.body()))));
    })
    .await;

    match outcome {
        PumpOutcome::Completed => {
            let _ = tx.send(Ok(Event::default().data(DONE_SENTINEL)));
        }
        PumpOutcome::Cancelled => {
            info!("chat stream {stream_id} cancelled");
            let _ = tx.send(Ok(Event::default().data(CANCELLED_SENTINEL)));
        }
        PumpOutcome::Failed(reason) => {
            error!("chat stream {stream_id} failed: {reason}");
            let _ = tx.send(Ok(relay_event(&RelayMessage::error(format!(
                "stream interrupted: {reason}"
            )))));
        }
    }
    registry.release(&stream_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok(bytes: &[u8]) -> Result<Vec<u8>, String> {
        Ok(bytes.to_vec())
    }

    #[tokio::test]
    async fn natural_end_completes() {
        let source = stream::iter(vec![
            ok(b"data: {\"content\":\"a\"}\n"),
            ok(b"data: {\"content\":\"b\"}\n"),
        ]);
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();
        let outcome = pump_sse(source, &cancel, |f| seen.push(f.body().to_string())).await;
        assert_eq!(outcome, PumpOutcome::Completed);
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn stops_reading_after_done() {
        let polled = Arc::new(AtomicUsize::new(0));
        let counter = polled.clone();
        let source = stream::iter(vec![
            ok(b"data: {\"content\":\"a\"}\n"),
            ok(b"data: [DONE]\n"),
            ok(b"data: {\"content\":\"c\"}\n"),
        ])
        .map(move |chunk| {
            counter.fetch_add(1, Ordering::SeqCst);
            chunk
        });
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();
        let outcome = pump_sse(source, &cancel, |f| seen.push(f.body().to_string())).await;
        assert_eq!(outcome, PumpOutcome::Completed);
        assert_eq!(seen, vec!["a"]);
        // The chunk after the sentinel was never pulled from the transport.
        assert_eq!(polled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_fail_stop() {
        let source = stream::iter(vec![
            ok(b"data: {\"content\":\"a\"}\n"),
            Err("connection reset".to_string()),
            ok(b"data: {\"content\":\"b\"}\n"),
        ]);
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();
        let outcome = pump_sse(source, &cancel, |f| seen.push(f.body().to_string())).await;
        assert_eq!(outcome, PumpOutcome::Failed("connection reset".to_string()));
        assert_eq!(seen, vec!["a"]);
    }

    #[tokio::test]
    async fn cancellation_token_stops_the_pump() {
        let source = stream::iter(vec![ok(b"data: {\"content\":\"a\"}\n")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut seen = Vec::new();
        let outcome = pump_sse(source, &cancel, |f| seen.push(f.body().to_string())).await;
        assert_eq!(outcome, PumpOutcome::Cancelled);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn registry_claim_is_exactly_once() {
        let registry = StreamRegistry::new();
        let request = ChatStreamRequest {
            kb_id: "kb1".to_string(),
            message: "hi".to_string(),
            history: vec![],
        };
        let id = registry.stash(request);
        assert!(registry.claim(&id).is_some());
        assert!(registry.claim(&id).is_none());
    }

    #[tokio::test]
    async fn registry_cancel_fires_the_token() {
        let registry = StreamRegistry::new();
        let token = registry.register("s1".to_string());
        assert!(!token.is_cancelled());
        registry.cancel("s1");
        assert!(token.is_cancelled());
        // Cancelling an unknown stream is a no-op.
        registry.cancel("s1");
    }
}
