//! The object controller: translates local object state and pending field
//! operations into REST commands, and reconciles responses into new
//! canonical states.
//!
//! The controller holds no per-call state. Every operation works on the
//! states it is handed, so concurrent calls never contend.

use std::sync::Arc;

use tracing::debug;

use strata_protocol::{endpoints, Command, CommandResponse, MAX_BATCH_SIZE};
use strata_types::{FieldOperationSet, ObjectState};

use crate::batch::{batch_item, run_chunks, BatchItem, CompletionHandle, EntryDecoder};
use crate::cancel::CancellationToken;
use crate::error::{remote_from_response, ClientError, ClientResult};
use crate::runner::CommandRunner;

/// Per-call options threaded onto every command.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub session_token: Option<String>,
}

/// Executes fetch, save, and delete operations against the store, singly or
/// in bounded-size network batches.
pub struct ObjectController {
    runner: Arc<dyn CommandRunner>,
}

impl ObjectController {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Fetch the authoritative state of one existing object.
    ///
    /// The result is a complete replacement: fields absent from the response
    /// are absent from the new state.
    pub async fn fetch(
        &self,
        state: &ObjectState,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> ClientResult<ObjectState> {
        let object_id = state.object_id().ok_or_else(|| {
            ClientError::InvalidState("cannot fetch an object without an object id".into())
        })?;
        let command = Command::get(endpoints::object(state.class_name(), object_id))
            .with_session_token(options.session_token.clone());
        debug!(class = state.class_name(), object_id, "fetch");
        let response = self.runner.run_command(command, None, None, cancel).await?;
        decode_object_response(&response, state)
    }

    /// Save one object's pending operations: POST to create when the state
    /// has no id yet, PUT to update otherwise.
    ///
    /// Fields the server does not echo back, including fields that were the
    /// subject of a pending operation, are absent from the result; callers
    /// needing the full object must fetch it.
    pub async fn save(
        &self,
        state: &ObjectState,
        operations: &FieldOperationSet,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> ClientResult<ObjectState> {
        let command =
            save_command(state, operations).with_session_token(options.session_token.clone());
        debug!(
            class = state.class_name(),
            creating = state.object_id().is_none(),
            fields = operations.len(),
            "save"
        );
        let response = self.runner.run_command(command, None, None, cancel).await?;
        decode_object_response(&response, state)
    }

    /// Delete one existing object. A not-found answer surfaces as the
    /// server's structured error, never as silent success.
    pub async fn delete(
        &self,
        state: &ObjectState,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        let object_id = state.object_id().ok_or_else(|| {
            ClientError::InvalidState("cannot delete an object without an object id".into())
        })?;
        let command = Command::delete(endpoints::object(state.class_name(), object_id))
            .with_session_token(options.session_token.clone());
        debug!(class = state.class_name(), object_id, "delete");
        let response = self.runner.run_command(command, None, None, cancel).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(remote_from_response(&response))
        }
    }

    /// Save many objects through the batch endpoint, one completion handle
    /// per input position.
    ///
    /// `states` and `operations` are parallel sequences and must be equal
    /// length. Handles resolve independently: one item's server error never
    /// affects its siblings.
    pub fn save_all(
        &self,
        states: Vec<ObjectState>,
        operations: Vec<FieldOperationSet>,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<CompletionHandle<ObjectState>>> {
        if states.len() != operations.len() {
            return Err(ClientError::InvalidState(format!(
                "save_all requires parallel sequences: {} states, {} operation sets",
                states.len(),
                operations.len()
            )));
        }

        let mut items = Vec::with_capacity(states.len());
        let mut handles = Vec::with_capacity(states.len());
        for (state, ops) in states.into_iter().zip(operations) {
            let command = save_command(&state, &ops);
            let decode: EntryDecoder<ObjectState> =
                Box::new(move |body| decode_batch_save_entry(body, &state));
            let (item, handle) = batch_item(&command, decode);
            items.push(item);
            handles.push(handle);
        }

        debug!(
            total = handles.len(),
            chunks = handles.len().div_ceil(MAX_BATCH_SIZE),
            "save_all"
        );
        self.spawn_driver(items, options, cancel);
        Ok(handles)
    }

    /// Delete many objects through the batch endpoint, one completion handle
    /// per input position.
    ///
    /// States without an object id fail their handle locally with a contract
    /// violation and are excluded from the network batches.
    pub fn delete_all(
        &self,
        states: Vec<ObjectState>,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Vec<CompletionHandle<()>> {
        let mut items = Vec::with_capacity(states.len());
        let mut handles = Vec::with_capacity(states.len());
        for state in states {
            match state.object_id() {
                Some(object_id) => {
                    let command = Command::delete(endpoints::object(state.class_name(), object_id));
                    let decode: EntryDecoder<()> =
                        Box::new(|_: Option<&serde_json::Value>| Ok(()));
                    let (item, handle) = batch_item(&command, decode);
                    items.push(item);
                    handles.push(handle);
                }
                None => handles.push(CompletionHandle::ready(Err(ClientError::InvalidState(
                    "cannot delete an object without an object id".into(),
                )))),
            }
        }

        debug!(
            total = handles.len(),
            dispatched = items.len(),
            chunks = items.len().div_ceil(MAX_BATCH_SIZE),
            "delete_all"
        );
        self.spawn_driver(items, options, cancel);
        handles
    }

    /// Start the sequential chunk driver. An empty item list performs zero
    /// network calls.
    fn spawn_driver<T: Send + 'static>(
        &self,
        items: Vec<BatchItem<T>>,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) {
        if items.is_empty() {
            return;
        }
        tokio::spawn(run_chunks(
            Arc::clone(&self.runner),
            items,
            options.session_token.clone(),
            cancel.clone(),
        ));
    }
}

/// Build the single-object save command: POST to the class for creates, PUT
/// to the object for updates. Shared verbatim by the batch path.
fn save_command(state: &ObjectState, operations: &FieldOperationSet) -> Command {
    let body = operations.encode_body();
    match state.object_id() {
        Some(object_id) => Command::put(endpoints::object(state.class_name(), object_id), body),
        None => Command::post(endpoints::class(state.class_name()), body),
    }
}

fn decode_object_response(
    response: &CommandResponse,
    base: &ObjectState,
) -> ClientResult<ObjectState> {
    if !response.is_success() {
        return Err(remote_from_response(response));
    }
    Ok(ObjectState::from_response(&response.body, base)?)
}

fn decode_batch_save_entry(
    body: Option<&serde_json::Value>,
    base: &ObjectState,
) -> ClientResult<ObjectState> {
    let body = body
        .ok_or_else(|| ClientError::Decode("save success entry is missing an object body".into()))?;
    Ok(ObjectState::from_response(body, base)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use strata_protocol::Method;

    use crate::cancel::CancellationSource;
    use crate::runner::testing::MockRunner;
    use crate::runner::ProgressSink;

    fn starship(object_id: Option<String>) -> ObjectState {
        let mut builder = ObjectState::builder("Starship").with_field("hull", "steel");
        if let Some(object_id) = object_id {
            builder = builder.with_object_id(object_id);
        }
        builder.build()
    }

    fn cargo_ops() -> FieldOperationSet {
        let mut operations = FieldOperationSet::new();
        operations.set("cargo", "spice");
        operations
    }

    fn saved_body(i: usize) -> serde_json::Value {
        json!({
            "__type": "Object",
            "className": "Starship",
            "objectId": format!("ship{i}"),
            "engine": "ion",
            "createdAt": "2015-09-18T18:11:28.943Z",
        })
    }

    fn save_results(ids: std::ops::Range<usize>) -> serde_json::Value {
        let results: Vec<_> = ids.map(|i| json!({"success": saved_body(i)})).collect();
        json!({"results": results})
    }

    fn delete_results(count: usize) -> serde_json::Value {
        let results: Vec<_> = (0..count).map(|_| json!({"success": null})).collect();
        json!({"results": results})
    }

    fn batch_requests(command: &Command) -> Vec<serde_json::Value> {
        command.body.as_ref().unwrap()["requests"]
            .as_array()
            .unwrap()
            .clone()
    }

    // ---- single-object operations ----

    #[tokio::test]
    async fn fetch_replaces_state_completely() {
        let runner = MockRunner::single(200, saved_body(0));
        let controller = ObjectController::new(runner.clone());
        let state = starship(Some("ship0".into()));

        let fetched = controller
            .fetch(&state, &RequestOptions::default(), &CancellationToken::never())
            .await
            .unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].method, Method::Get);
        assert_eq!(commands[0].path, "/1/classes/Starship/ship0");

        assert_eq!(fetched.get("engine").and_then(|v| v.as_str()), Some("ion"));
        assert!(!fetched.contains_key("hull"));
        assert!(fetched.created_at().is_some());
        assert!(fetched.updated_at().is_some());
    }

    #[tokio::test]
    async fn fetch_without_id_is_contract_violation() {
        let runner = MockRunner::single(200, saved_body(0));
        let controller = ObjectController::new(runner.clone());

        let err = controller
            .fetch(&starship(None), &RequestOptions::default(), &CancellationToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidState(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn fetch_surfaces_remote_error() {
        let runner = MockRunner::single(404, json!({"code": 101, "error": "Object not found."}));
        let controller = ObjectController::new(runner);

        let err = controller
            .fetch(
                &starship(Some("gone".into())),
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Remote { code: 101, .. }));
    }

    #[tokio::test]
    async fn save_update_puts_operations_body() {
        let runner = MockRunner::single(200, saved_body(0));
        let controller = ObjectController::new(runner.clone());
        let state = starship(Some("ship0".into()));

        let saved = controller
            .save(&state, &cargo_ops(), &RequestOptions::default(), &CancellationToken::never())
            .await
            .unwrap();

        let commands = runner.commands();
        assert_eq!(commands[0].method, Method::Put);
        assert_eq!(commands[0].path, "/1/classes/Starship/ship0");
        assert_eq!(commands[0].body, Some(json!({"cargo": "spice"})));

        // The operation set never folds into the result; only echoed fields exist.
        assert_eq!(saved.get("engine").and_then(|v| v.as_str()), Some("ion"));
        assert!(!saved.contains_key("cargo"));
        assert!(!saved.contains_key("hull"));
        assert!(saved.created_at().is_some());
        assert!(saved.updated_at().is_some());
    }

    #[tokio::test]
    async fn save_create_posts_to_class() {
        let runner = MockRunner::single(201, saved_body(0));
        let controller = ObjectController::new(runner.clone());
        let draft = starship(None);
        assert!(draft.is_new());

        let saved = controller
            .save(&draft, &cargo_ops(), &RequestOptions::default(), &CancellationToken::never())
            .await
            .unwrap();

        let commands = runner.commands();
        assert_eq!(commands[0].method, Method::Post);
        assert_eq!(commands[0].path, "/1/classes/Starship");

        assert_eq!(saved.object_id(), Some("ship0"));
        assert!(!saved.is_new());
    }

    #[tokio::test]
    async fn save_update_carries_identity_forward() {
        // Update responses typically echo only changed fields.
        let runner = MockRunner::single(200, json!({"updatedAt": "2015-09-19T00:00:00.000Z"}));
        let controller = ObjectController::new(runner);
        let state = starship(Some("ship0".into()));

        let saved = controller
            .save(&state, &cargo_ops(), &RequestOptions::default(), &CancellationToken::never())
            .await
            .unwrap();
        assert_eq!(saved.object_id(), Some("ship0"));
        assert_eq!(saved.class_name(), "Starship");
        assert!(saved.is_empty());
    }

    #[tokio::test]
    async fn delete_issues_delete_command() {
        let runner = MockRunner::single(200, json!({}));
        let controller = ObjectController::new(runner.clone());

        controller
            .delete(
                &starship(Some("ship0".into())),
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .await
            .unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].method, Method::Delete);
        assert_eq!(commands[0].path, "/1/classes/Starship/ship0");
    }

    #[tokio::test]
    async fn delete_not_found_is_remote_error() {
        let runner = MockRunner::single(404, json!({"code": 101, "error": "Object not found."}));
        let controller = ObjectController::new(runner);

        let err = controller
            .delete(
                &starship(Some("gone".into())),
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Remote { code: 101, .. }));
    }

    #[tokio::test]
    async fn delete_without_id_is_contract_violation() {
        let runner = MockRunner::single(200, json!({}));
        let controller = ObjectController::new(runner.clone());

        let err = controller
            .delete(&starship(None), &RequestOptions::default(), &CancellationToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidState(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn session_token_reaches_command() {
        let runner = MockRunner::single(200, saved_body(0));
        let controller = ObjectController::new(runner.clone());
        let options = RequestOptions {
            session_token: Some("tok".into()),
        };

        controller
            .fetch(&starship(Some("ship0".into())), &options, &CancellationToken::never())
            .await
            .unwrap();
        assert_eq!(runner.commands()[0].session_token.as_deref(), Some("tok"));
    }

    // ---- batch save ----

    #[tokio::test]
    async fn save_all_thirty_in_one_batch() {
        let runner = MockRunner::single(200, save_results(0..30));
        let controller = ObjectController::new(runner.clone());

        // Half creates, half updates.
        let states: Vec<_> = (0..30)
            .map(|i| starship((i % 2 == 1).then(|| format!("ship{i}"))))
            .collect();
        let operations = vec![cargo_ops(); 30];

        let handles = controller
            .save_all(states, operations, &RequestOptions::default(), &CancellationToken::never())
            .unwrap();
        assert_eq!(handles.len(), 30);

        for (i, handle) in handles.into_iter().enumerate() {
            let saved = handle.await.unwrap();
            assert_eq!(saved.object_id(), Some(format!("ship{i}").as_str()));
            assert_eq!(saved.get("engine").and_then(|v| v.as_str()), Some("ion"));
            assert!(!saved.contains_key("cargo"));
            assert!(!saved.contains_key("hull"));
            assert!(saved.created_at().is_some());
            assert!(saved.updated_at().is_some());
        }

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].path, "/1/batch");
        let requests = batch_requests(&commands[0]);
        assert_eq!(requests.len(), 30);
        assert_eq!(requests[0]["method"], "POST");
        assert_eq!(requests[0]["path"], "/1/classes/Starship");
        assert_eq!(requests[1]["method"], "PUT");
        assert_eq!(requests[1]["path"], "/1/classes/Starship/ship1");
        assert_eq!(requests[0]["body"], json!({"cargo": "spice"}));
    }

    #[tokio::test]
    async fn save_all_splits_into_sequential_chunks() {
        let runner = MockRunner::new(vec![
            CommandResponse::new(200, save_results(0..50)),
            CommandResponse::new(200, save_results(50..100)),
            CommandResponse::new(200, save_results(100..102)),
        ]);
        let controller = ObjectController::new(runner.clone());

        let states: Vec<_> = (0..102).map(|i| starship(Some(format!("ship{i}")))).collect();
        let operations = vec![cargo_ops(); 102];

        let handles = controller
            .save_all(states, operations, &RequestOptions::default(), &CancellationToken::never())
            .unwrap();
        assert_eq!(handles.len(), 102);

        // Outcome order matches input order across chunk boundaries.
        for (i, handle) in handles.into_iter().enumerate() {
            let saved = handle.await.unwrap();
            assert_eq!(saved.object_id(), Some(format!("ship{i}").as_str()));
        }

        let commands = runner.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands.iter().all(|c| c.path == "/1/batch"));
        assert_eq!(batch_requests(&commands[0]).len(), 50);
        assert_eq!(batch_requests(&commands[1]).len(), 50);
        assert_eq!(batch_requests(&commands[2]).len(), 2);
    }

    #[tokio::test]
    async fn save_all_mixed_results_resolve_independently() {
        let results = json!({"results": [
            {"success": saved_body(0)},
            {"error": {"code": 101, "error": "Object not found."}},
            {"success": saved_body(2)},
        ]});
        let runner = MockRunner::single(200, results);
        let controller = ObjectController::new(runner);

        let states: Vec<_> = (0..3).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller
            .save_all(
                states,
                vec![cargo_ops(); 3],
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .unwrap();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await);
        }
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(ClientError::Remote { code: 101, .. })));
        assert!(outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn save_all_rejects_mismatched_sequences() {
        let runner = MockRunner::single(200, json!({}));
        let controller = ObjectController::new(runner.clone());

        let err = controller
            .save_all(
                vec![starship(None)],
                Vec::new(),
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidState(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn save_all_empty_input_makes_no_calls() {
        let runner = MockRunner::single(200, json!({}));
        let controller = ObjectController::new(runner.clone());

        let handles = controller
            .save_all(
                Vec::new(),
                Vec::new(),
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .unwrap();
        assert!(handles.is_empty());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn save_all_single_item_still_uses_batch_endpoint() {
        let runner = MockRunner::single(200, save_results(0..1));
        let controller = ObjectController::new(runner.clone());

        let handles = controller
            .save_all(
                vec![starship(None)],
                vec![cargo_ops()],
                &RequestOptions::default(),
                &CancellationToken::never(),
            )
            .unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].path, "/1/batch");
        assert_eq!(batch_requests(&commands[0]).len(), 1);
    }

    // ---- batch delete ----

    #[tokio::test]
    async fn delete_all_thirty_in_one_batch() {
        let runner = MockRunner::single(200, delete_results(30));
        let controller = ObjectController::new(runner.clone());

        let states: Vec<_> = (0..30).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller.delete_all(
            states,
            &RequestOptions::default(),
            &CancellationToken::never(),
        );
        assert_eq!(handles.len(), 30);
        for handle in handles {
            handle.await.unwrap();
        }

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].path, "/1/batch");
        let requests = batch_requests(&commands[0]);
        assert_eq!(requests.len(), 30);
        assert_eq!(requests[7]["method"], "DELETE");
        assert!(requests[7].get("body").is_none());
    }

    #[tokio::test]
    async fn delete_all_splits_into_sequential_chunks() {
        let runner = MockRunner::new(vec![
            CommandResponse::new(200, delete_results(50)),
            CommandResponse::new(200, delete_results(50)),
            CommandResponse::new(200, delete_results(2)),
        ]);
        let controller = ObjectController::new(runner.clone());

        let states: Vec<_> = (0..102).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller.delete_all(
            states,
            &RequestOptions::default(),
            &CancellationToken::never(),
        );
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(runner.call_count(), 3);
    }

    #[tokio::test]
    async fn delete_all_partial_failures_stay_positional() {
        let results: Vec<_> = (0..30)
            .map(|i| {
                if i % 2 == 0 {
                    json!({"error": {"code": 101, "error": "Object not found."}})
                } else {
                    json!({"success": null})
                }
            })
            .collect();
        let runner = MockRunner::single(200, json!({"results": results}));
        let controller = ObjectController::new(runner.clone());

        let states: Vec<_> = (0..30).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller.delete_all(
            states,
            &RequestOptions::default(),
            &CancellationToken::never(),
        );

        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await;
            if i % 2 == 0 {
                assert!(matches!(outcome, Err(ClientError::Remote { code: 101, .. })));
            } else {
                outcome.unwrap();
            }
        }
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn delete_all_missing_ids_fail_locally() {
        let runner = MockRunner::single(200, delete_results(15));
        let controller = ObjectController::new(runner.clone());

        let states: Vec<_> = (0..30)
            .map(|i| starship((i % 2 == 1).then(|| format!("ship{i}"))))
            .collect();
        let handles = controller.delete_all(
            states,
            &RequestOptions::default(),
            &CancellationToken::never(),
        );
        assert_eq!(handles.len(), 30);

        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await;
            if i % 2 == 0 {
                assert!(matches!(outcome, Err(ClientError::InvalidState(_))));
            } else {
                outcome.unwrap();
            }
        }

        // Only the 15 addressable states reach the wire.
        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(batch_requests(&commands[0]).len(), 15);
    }

    #[tokio::test]
    async fn delete_all_count_mismatch_fails_whole_chunk() {
        // 30 requests answered with 36 results: a client/server contract
        // violation that must not be partially interpreted.
        let runner = MockRunner::single(200, delete_results(36));
        let controller = ObjectController::new(runner.clone());

        let states: Vec<_> = (0..30).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller.delete_all(
            states,
            &RequestOptions::default(),
            &CancellationToken::never(),
        );

        for handle in handles {
            assert!(matches!(
                handle.await,
                Err(ClientError::InconsistentBatch {
                    expected: 30,
                    actual: 36
                })
            ));
        }
        assert_eq!(runner.call_count(), 1);
    }

    // ---- cancellation ----

    #[tokio::test]
    async fn pre_cancelled_batch_sends_nothing() {
        let runner = MockRunner::single(200, delete_results(30));
        let controller = ObjectController::new(runner.clone());
        let source = CancellationSource::new();
        source.cancel();

        let states: Vec<_> = (0..30).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller.delete_all(states, &RequestOptions::default(), &source.token());

        for handle in handles {
            assert!(matches!(handle.await, Err(ClientError::Cancelled)));
        }
        assert_eq!(runner.call_count(), 0);
    }

    /// Runner wrapper that trips the cancellation source as soon as the
    /// first chunk's round trip completes.
    struct CancelAfterFirstCall {
        inner: Arc<MockRunner>,
        source: CancellationSource,
    }

    #[async_trait::async_trait]
    impl CommandRunner for CancelAfterFirstCall {
        async fn run_command(
            &self,
            command: Command,
            upload_progress: Option<ProgressSink>,
            download_progress: Option<ProgressSink>,
            cancel: &CancellationToken,
        ) -> ClientResult<CommandResponse> {
            let response = self
                .inner
                .run_command(command, upload_progress, download_progress, cancel)
                .await;
            self.source.cancel();
            response
        }
    }

    #[tokio::test]
    async fn cancel_between_chunks_cancels_unstarted_chunks() {
        let inner = MockRunner::new(vec![CommandResponse::new(200, delete_results(50))]);
        let source = CancellationSource::new();
        let token = source.token();
        let runner = Arc::new(CancelAfterFirstCall {
            inner: inner.clone(),
            source,
        });
        let controller = ObjectController::new(runner);

        let states: Vec<_> = (0..102).map(|i| starship(Some(format!("ship{i}")))).collect();
        let handles = controller.delete_all(states, &RequestOptions::default(), &token);

        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await;
            if i < 50 {
                outcome.unwrap();
            } else {
                assert!(matches!(outcome, Err(ClientError::Cancelled)));
            }
        }
        assert_eq!(inner.call_count(), 1);
    }
}
