//! Batch splitting and result correlation.
//!
//! An arbitrarily long list of pending operations is partitioned into
//! consecutive chunks of at most [`MAX_BATCH_SIZE`], each dispatched as one
//! batch command. Chunks run strictly sequentially; per-item outcomes are
//! correlated positionally and delivered through one-shot completion handles
//! created before the first chunk is sent.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use strata_protocol::{BatchEntry, BatchRequest, BatchResponse, Command, SubRequest, MAX_BATCH_SIZE};

use crate::cancel::CancellationToken;
use crate::error::{remote_from_response, ClientError, ClientResult};
use crate::runner::CommandRunner;

/// Caller-visible future for one submitted item, resolved exactly once.
///
/// Resolves to [`ClientError::Cancelled`] if the driving task goes away
/// before delivering an outcome.
#[derive(Debug)]
pub struct CompletionHandle<T> {
    rx: oneshot::Receiver<ClientResult<T>>,
}

impl<T> CompletionHandle<T> {
    /// A handle that is already resolved, for items that never reach the
    /// network (local precondition failures).
    pub(crate) fn ready(result: ClientResult<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl<T> Future for CompletionHandle<T> {
    type Output = ClientResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ClientError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Decodes one success payload into the item's result type. Boxed per item
/// so each save can capture its own base state.
pub(crate) type EntryDecoder<T> =
    Box<dyn FnOnce(Option<&serde_json::Value>) -> ClientResult<T> + Send>;

/// One pending batch member: its sub-request, its single-assignment result
/// slot, and the decoder for its success payload.
pub(crate) struct BatchItem<T> {
    request: SubRequest,
    tx: oneshot::Sender<ClientResult<T>>,
    decode: EntryDecoder<T>,
}

pub(crate) fn batch_item<T>(
    command: &Command,
    decode: EntryDecoder<T>,
) -> (BatchItem<T>, CompletionHandle<T>) {
    let (tx, rx) = oneshot::channel();
    (
        BatchItem {
            request: SubRequest::from_command(command),
            tx,
            decode,
        },
        CompletionHandle { rx },
    )
}

/// Drive all chunks for one batch operation, sequentially.
///
/// A chunk is not dispatched until the previous chunk's response has been
/// fully resolved, and never after cancellation: items in unstarted chunks
/// resolve as cancelled, not failed.
pub(crate) async fn run_chunks<T: Send + 'static>(
    runner: Arc<dyn CommandRunner>,
    items: Vec<BatchItem<T>>,
    session_token: Option<String>,
    cancel: CancellationToken,
) {
    let total = items.len();
    debug!(total, chunks = total.div_ceil(MAX_BATCH_SIZE), "running batch chunks");

    let mut remaining = items;
    let mut chunk_index = 0usize;
    while !remaining.is_empty() {
        let rest = if remaining.len() > MAX_BATCH_SIZE {
            remaining.split_off(MAX_BATCH_SIZE)
        } else {
            Vec::new()
        };
        let chunk = std::mem::replace(&mut remaining, rest);

        if cancel.is_cancelled() {
            debug!(chunk = chunk_index, "cancelled before dispatch");
            for item in chunk.into_iter().chain(remaining) {
                let _ = item.tx.send(Err(ClientError::Cancelled));
            }
            return;
        }

        dispatch_chunk(&runner, chunk, &session_token, &cancel, chunk_index).await;
        chunk_index += 1;
    }
}

async fn dispatch_chunk<T>(
    runner: &Arc<dyn CommandRunner>,
    chunk: Vec<BatchItem<T>>,
    session_token: &Option<String>,
    cancel: &CancellationToken,
    chunk_index: usize,
) {
    let size = chunk.len();
    let envelope = BatchRequest::new(chunk.iter().map(|item| item.request.clone()).collect());
    let command = match envelope.into_command(session_token.clone()) {
        Ok(command) => command,
        Err(e) => return fail_chunk(chunk, ClientError::from(e)),
    };

    debug!(chunk = chunk_index, size, "dispatching batch chunk");
    let response = match runner.run_command(command, None, None, cancel).await {
        Ok(response) => response,
        Err(e) => return fail_chunk(chunk, e),
    };
    if !response.is_success() {
        return fail_chunk(chunk, remote_from_response(&response));
    }

    let decoded = match BatchResponse::from_body(&response.body) {
        Ok(decoded) => decoded,
        Err(e) => return fail_chunk(chunk, ClientError::from(e)),
    };
    if decoded.results.len() != size {
        warn!(
            chunk = chunk_index,
            expected = size,
            actual = decoded.results.len(),
            "batch result count mismatch"
        );
        return fail_chunk(
            chunk,
            ClientError::InconsistentBatch {
                expected: size,
                actual: decoded.results.len(),
            },
        );
    }

    // Counts match: resolve every slot in this chunk positionally, all at
    // once. One member's error never touches its siblings.
    for (item, entry) in chunk.into_iter().zip(decoded.results) {
        let outcome = match entry {
            BatchEntry::Success(success) => (item.decode)(success.as_ref()),
            BatchEntry::Error(error) => Err(ClientError::Remote {
                code: error.code,
                message: error.message,
            }),
        };
        let _ = item.tx.send(outcome);
    }
}

fn fail_chunk<T>(chunk: Vec<BatchItem<T>>, error: ClientError) {
    for item in chunk {
        let _ = item.tx.send(Err(error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_handle_resolves_immediately() {
        let handle = CompletionHandle::ready(Ok(7));
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn dropped_sender_reads_as_cancelled() {
        let (tx, rx) = oneshot::channel::<ClientResult<u32>>();
        drop(tx);
        let handle = CompletionHandle { rx };
        assert!(matches!(handle.await, Err(ClientError::Cancelled)));
    }

    #[test]
    fn batch_item_captures_sub_request() {
        let command = Command::delete("/1/classes/Starship/x");
        let (item, _handle) =
            batch_item::<()>(&command, Box::new(|_: Option<&serde_json::Value>| Ok(())));
        assert_eq!(item.request.path, "/1/classes/Starship/x");
        assert!(item.request.body.is_none());
    }
}
