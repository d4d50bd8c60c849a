//! Stream helpers shared by the presenters' event loops.

use futures::{stream::BoxStream, FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::contracts::EventStream;

/// Yields every value sent on `receiver` until all senders are dropped.
pub fn receiver_stream<T: Send + 'static>(receiver: mpsc::UnboundedReceiver<T>) -> EventStream<T> {
    UnboundedReceiverStream::new(receiver).boxed()
}

/// Awaits the next item of an optional stream; a missing stream never yields.
pub(crate) async fn next_event<T>(stream: &mut Option<BoxStream<'static, T>>) -> Option<T> {
    match stream {
        Some(stream) => stream.next().await,
        None => futures::future::pending().await,
    }
}

/// Takes every item already queued on `stream` without waiting. A stream
/// found finished is cleared.
pub(crate) fn ready_events<T>(stream: &mut Option<BoxStream<'static, T>>) -> Vec<T> {
    let mut ready = Vec::new();
    while let Some(events) = stream.as_mut() {
        match events.next().now_or_never() {
            Some(Some(event)) => ready.push(event),
            Some(None) => *stream = None,
            None => break,
        }
    }
    ready
}
