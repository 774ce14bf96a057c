//! Runs a crawl on a dedicated worker thread and hands the serialized
//! result bundle back over a channel.

use crate::crawl::{CrawlOptions, execute_crawl};
use crate::error::{CoreError, Result};
use silky_scanner::bundle::{self, ResultBundle};
use silky_scanner::{StopHandle, Termination};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type WorkerMessage = Result<(Termination, Vec<u8>)>;

pub struct WorkerHandle {
    receiver: oneshot::Receiver<WorkerMessage>,
    stop: StopHandle,
    thread: Option<JoinHandle<()>>,
    timeout: Duration,
    grace: Duration,
}

#[derive(Debug, Clone)]
pub struct HandoffOutcome {
    pub bundle: ResultBundle,
    pub termination: Termination,
    /// The worker hit the handoff timeout and was told to stop.
    pub timed_out: bool,
}

/// Starts `options` on its own thread with its own tokio runtime.
///
/// The worker always answers with a bundle, partial if it was stopped.
pub fn spawn_worker(options: CrawlOptions, timeout: Duration) -> Result<WorkerHandle> {
    let (sender, receiver) = oneshot::channel::<WorkerMessage>();
    let stop = StopHandle::new();
    let worker_stop = stop.clone();
    let grace = Duration::from_secs(options.page_timeout_secs + 5);

    let thread = std::thread::Builder::new()
        .name("silky-crawl-worker".to_string())
        .spawn(move || {
            let message = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(async move {
                    let outcome = execute_crawl(options, None, Some(worker_stop)).await?;
                    let bytes = bundle::serialize(&outcome.bundle)?;
                    Ok::<_, CoreError>((outcome.termination, bytes))
                }),
                Err(e) => Err(CoreError::WorkerStart(e.to_string())),
            };

            if sender.send(message).is_err() {
                debug!("Crawl worker finished after the parent stopped listening");
            }
        })
        .map_err(|e| CoreError::WorkerStart(e.to_string()))?;

    Ok(WorkerHandle {
        receiver,
        stop,
        thread: Some(thread),
        timeout,
        grace,
    })
}

impl WorkerHandle {
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Overrides how long to wait for a stopped worker's partial bundle.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Waits for the worker's bundle. On timeout the worker is stopped and
    /// its partial bundle collected.
    pub async fn receive(mut self) -> Result<HandoffOutcome> {
        let (message, timed_out) = match tokio::time::timeout(self.timeout, &mut self.receiver).await {
            Ok(message) => (message, false),
            Err(_) => {
                warn!(
                    "Crawl worker hit the {} s limit; stopping it",
                    self.timeout.as_secs()
                );
                self.stop.stop();
                match tokio::time::timeout(self.grace, &mut self.receiver).await {
                    Ok(message) => (message, true),
                    Err(_) => return Err(CoreError::HandoffTimeout(self.timeout.as_secs())),
                }
            }
        };

        let (termination, bytes) = message.map_err(|_| CoreError::WorkerDisconnected)??;
        let bundle = bundle::deserialize(&bytes)?;

        if let Some(thread) = self.thread.take() {
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => warn!("Crawl worker thread panicked after reporting"),
                Err(e) => warn!("Failed to join crawl worker thread: {}", e),
            }
        }

        Ok(HandoffOutcome {
            bundle,
            termination,
            timed_out,
        })
    }
}
