use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::dispatch::dispatcher::Dispatcher;

/// Background worker that runs dispatch rounds on a fixed interval
pub struct DispatchWorker {
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
}

impl DispatchWorker {
    /// Create a new DispatchWorker instance
    pub fn new(dispatcher: Arc<Dispatcher>, interval: Duration) -> Self {
        Self {
            dispatcher,
            interval,
        }
    }

    /// Run until the shutdown channel flips to `true`
    ///
    /// # Loop
    /// - Sleeps for the configured interval
    /// - Skips the round when the scheduler holds nothing
    /// - Otherwise runs one full round and logs its outcome
    ///
    /// A round in progress is always finished before the worker exits.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "Dispatch worker started ({} printers, every {:?})",
            self.dispatcher.printer_count(),
            self.interval
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            if self.dispatcher.heap().lock().await.is_empty() {
                debug!("Dispatch worker found no jobs, sleeping...");
                continue;
            }

            let report = self.dispatcher.run().await;
            info!(
                "Dispatch round finished: printed={}, remaining={}, halted_on_delayed={}",
                report.printed.len(),
                report.remaining,
                report.halted_on_delayed
            );
        }

        info!("Dispatch worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spooler::{shared, JobHeap, JobKind};

    #[tokio::test(start_paused = true)]
    async fn test_worker_drains_scheduler_and_stops() {
        let mut heap = JobHeap::default();
        heap.insert(JobKind::Pdf, 2).unwrap();
        heap.insert(JobKind::Image, 1).unwrap();
        let dispatcher = Arc::new(Dispatcher::new(shared(heap), 2, Duration::ZERO));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = DispatchWorker::new(dispatcher.clone(), Duration::from_secs(1));
        let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

        sleep(Duration::from_secs(3)).await;
        assert!(dispatcher.heap().lock().await.is_empty());
        assert_eq!(dispatcher.history().await.len(), 2);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
