//! The command runner seam: the one collaborator that touches the network.

use std::sync::Arc;

use async_trait::async_trait;

use strata_protocol::{Command, CommandResponse};

use crate::cancel::CancellationToken;
use crate::error::ClientResult;

/// Fraction-complete callback for transfer progress, in `[0.0, 1.0]`.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Executes one encoded command and returns its decoded response.
///
/// Implementations must surface non-2xx statuses through the returned
/// [`CommandResponse`] rather than erring; only failures that produce no
/// decodable response at all (connection loss, aborted I/O) err. Retry and
/// backoff policy, if any, lives behind this seam.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_command(
        &self,
        command: Command,
        upload_progress: Option<ProgressSink>,
        download_progress: Option<ProgressSink>,
        cancel: &CancellationToken,
    ) -> ClientResult<CommandResponse>;
}
