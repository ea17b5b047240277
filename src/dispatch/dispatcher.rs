use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::dispatch::history::History;
use crate::dispatch::printer::{Printer, Roster};
use crate::error::{Result, SpoolerError};
use crate::spooler::{Job, JobStatus, SharedHeap};

/// Outcome of one dispatch round
#[derive(Debug, Default, Serialize)]
pub struct DispatchReport {
    /// Jobs printed during the round, in the order they finished
    pub printed: Vec<Job>,
    /// Jobs still held by the scheduler when the round ended
    pub remaining: usize,
    /// True when the round stopped because every remaining job is delayed
    pub halted_on_delayed: bool,
    /// True when jobs remain but every printer is offline
    pub no_printer_online: bool,
}

/// Feeds queued jobs to a roster of simulated printers.
///
/// Printers are served one after another inside a single control flow. The
/// scheduler lock is only held while a job is being extracted.
pub struct Dispatcher {
    heap: SharedHeap,
    printer_count: usize,
    roster: Mutex<Roster>,
    time_scale: Duration,
    history: Mutex<History>,
    round: Mutex<()>,
}

impl Dispatcher {
    /// `time_scale` is the simulated time spent per unit of a job's
    /// estimated duration.
    pub fn new(heap: SharedHeap, printers: usize, time_scale: Duration) -> Self {
        let printer_count = printers.max(1);
        Self {
            heap,
            printer_count,
            roster: Mutex::new(Roster::new(printer_count)),
            time_scale,
            history: Mutex::new(History::new()),
            round: Mutex::new(()),
        }
    }

    pub fn printer_count(&self) -> usize {
        self.printer_count
    }

    pub fn heap(&self) -> &SharedHeap {
        &self.heap
    }

    pub async fn printers(&self) -> Vec<Printer> {
        self.roster.lock().await.list()
    }

    pub async fn online_printers(&self) -> usize {
        self.roster.lock().await.online_ids().len()
    }

    /// Switch a printer online or offline. A round in progress picks the
    /// change up on its next pass.
    pub async fn toggle_printer(&self, id: usize) -> Result<Printer> {
        self.roster.lock().await.toggle(id)
    }

    /// Run one dispatch round.
    ///
    /// Each pass offers every online printer the most urgent queued job. The
    /// round ends when the scheduler is empty, no printer is online, or a
    /// whole pass finds nothing eligible. Only one round runs at a time.
    pub async fn run(&self) -> DispatchReport {
        let _round = self.round.lock().await;
        let mut report = DispatchReport::default();

        loop {
            let online = self.roster.lock().await.online_ids();
            let mut active = 0;

            for slot in online {
                let next = self.heap.lock().await.extract_next();
                let Some(job) = next else { break };

                let finished = self.print(slot, job).await;
                self.finish(slot, &finished).await;
                report.printed.push(finished);
                active += 1;
            }

            if active == 0 {
                break;
            }
        }

        let heap = self.heap.lock().await;
        report.remaining = heap.len();
        report.halted_on_delayed =
            report.remaining > 0 && heap.count_by_status(&JobStatus::Queued) == 0;
        report.no_printer_online =
            report.remaining > 0 && self.roster.lock().await.first_online().is_none();

        if report.no_printer_online {
            warn!(
                "No printer is online, pausing dispatch ({} waiting)",
                report.remaining
            );
        } else if report.halted_on_delayed {
            warn!(
                "All remaining jobs are delayed, pausing dispatch ({} waiting)",
                report.remaining
            );
        } else if report.remaining == 0 {
            info!("All jobs completed ({} printed)", report.printed.len());
        }
        report
    }

    /// Pull one job out of the scheduler by id and print it on the first
    /// online printer, whatever its status. Waits for a running round to
    /// finish first.
    ///
    /// # Errors
    /// - `NotFound` when the scheduler does not hold `id`
    /// - `NoPrinterOnline` when every printer is offline; the job stays queued
    pub async fn start_job(&self, id: &str) -> Result<Job> {
        let _round = self.round.lock().await;

        let (slot, job) = {
            let mut heap = self.heap.lock().await;
            heap.find_by_id(id)?;
            let slot = self
                .roster
                .lock()
                .await
                .first_online()
                .ok_or(SpoolerError::NoPrinterOnline)?;
            (slot, heap.remove_by_id(id)?)
        };

        info!("Manually starting job {} on printer {}", id, slot);
        let finished = self.print(slot, job).await;
        self.finish(slot, &finished).await;
        Ok(finished)
    }

    /// Finished jobs, most recent first
    pub async fn history(&self) -> Vec<Job> {
        self.history.lock().await.list()
    }

    pub async fn clear_history(&self) -> usize {
        self.history.lock().await.clear()
    }

    /// Simulate printing a job that has already left the scheduler
    async fn print(&self, slot: usize, mut job: Job) -> Job {
        job.status = JobStatus::Printing;
        job.printer = Some(slot);
        info!(
            "Printer {} processing job {} ({} units)",
            slot, job.id, job.estimated_duration
        );

        sleep(self.time_scale.saturating_mul(job.estimated_duration)).await;

        job.status = JobStatus::Done;
        job.completed_at = Some(Utc::now());
        info!("Printer {} finished job {}", slot, job.id);
        job
    }

    async fn finish(&self, slot: usize, job: &Job) {
        if let Err(e) = self.roster.lock().await.record_completion(slot) {
            warn!("Could not count job {} for printer {}: {}", job.id, slot, e);
        }
        self.history.lock().await.record(job.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::printer::PrinterStatus;
    use crate::spooler::{shared, JobHeap, JobKind};

    fn dispatcher_with(priorities: &[i64], printers: usize) -> (Dispatcher, Vec<String>) {
        let mut heap = JobHeap::default();
        let ids = priorities
            .iter()
            .map(|p| heap.insert(JobKind::Pdf, *p).unwrap().id)
            .collect();
        (Dispatcher::new(shared(heap), printers, Duration::ZERO), ids)
    }

    #[tokio::test]
    async fn test_round_prints_everything_in_priority_order() {
        let (dispatcher, _) = dispatcher_with(&[5, 1, 3, 1, 4], 2);

        let report = dispatcher.run().await;
        let priorities: Vec<u8> = report.printed.iter().map(|j| j.priority).collect();

        assert_eq!(priorities, vec![1, 1, 3, 4, 5]);
        assert_eq!(report.remaining, 0);
        assert!(!report.halted_on_delayed);
        assert!(report.printed.iter().all(|j| j.status == JobStatus::Done));
        assert!(report.printed.iter().all(|j| j.completed_at.is_some()));
    }

    #[tokio::test]
    async fn test_printer_slots_rotate() {
        let (dispatcher, _) = dispatcher_with(&[1, 2, 3, 4, 5], 2);

        let report = dispatcher.run().await;
        let slots: Vec<usize> = report.printed.iter().filter_map(|j| j.printer).collect();
        assert_eq!(slots, vec![1, 2, 1, 2, 1]);
    }

    #[tokio::test]
    async fn test_round_halts_on_delayed_jobs() {
        let (dispatcher, ids) = dispatcher_with(&[1, 2, 3], 5);
        dispatcher
            .heap()
            .lock()
            .await
            .update_status(&ids[0], JobStatus::delayed("out of toner"))
            .unwrap();

        let report = dispatcher.run().await;

        assert_eq!(report.printed.len(), 2);
        assert_eq!(report.remaining, 1);
        assert!(report.halted_on_delayed);
        assert_eq!(dispatcher.heap().lock().await.peek().unwrap().id, ids[0]);
    }

    #[tokio::test]
    async fn test_history_records_printed_jobs() {
        let (dispatcher, ids) = dispatcher_with(&[2, 1], 1);

        dispatcher.run().await;
        let history = dispatcher.history().await;

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, ids[0]);
        assert_eq!(history[1].id, ids[1]);
        assert_eq!(dispatcher.clear_history().await, 2);
        assert!(dispatcher.history().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_time_scales_with_duration() {
        let mut heap = JobHeap::default();
        let job = heap.insert(JobKind::Text, 1).unwrap();
        let dispatcher = Dispatcher::new(shared(heap), 1, Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        dispatcher.run().await;

        let expected = Duration::from_millis(100) * job.estimated_duration;
        assert!(started.elapsed() >= expected);
    }

    #[tokio::test]
    async fn test_offline_printers_are_skipped() {
        let (dispatcher, _) = dispatcher_with(&[1, 2, 3, 4], 3);
        let printer = dispatcher.toggle_printer(2).await.unwrap();
        assert_eq!(printer.status, PrinterStatus::Offline);

        let report = dispatcher.run().await;
        let slots: Vec<usize> = report.printed.iter().filter_map(|j| j.printer).collect();
        assert_eq!(slots, vec![1, 3, 1, 3]);
        assert_eq!(dispatcher.online_printers().await, 2);

        let counts: Vec<u64> = dispatcher
            .printers()
            .await
            .iter()
            .map(|p| p.jobs_processed)
            .collect();
        assert_eq!(counts, vec![2, 0, 2]);
    }

    #[tokio::test]
    async fn test_round_with_every_printer_offline() {
        let (dispatcher, ids) = dispatcher_with(&[2, 1], 2);
        dispatcher.toggle_printer(1).await.unwrap();
        dispatcher.toggle_printer(2).await.unwrap();

        let report = dispatcher.run().await;
        assert!(report.printed.is_empty());
        assert_eq!(report.remaining, 2);
        assert!(report.no_printer_online);
        assert!(!report.halted_on_delayed);
        assert_eq!(dispatcher.heap().lock().await.peek().unwrap().id, ids[1]);
    }

    #[tokio::test]
    async fn test_toggle_unknown_printer() {
        let (dispatcher, _) = dispatcher_with(&[], 2);
        assert!(matches!(
            dispatcher.toggle_printer(3).await,
            Err(SpoolerError::PrinterNotFound(3))
        ));
    }

    #[tokio::test]
    async fn test_start_job_prints_chosen_job() {
        let (dispatcher, ids) = dispatcher_with(&[1, 2, 5], 2);
        dispatcher.toggle_printer(1).await.unwrap();

        let job = dispatcher.start_job(&ids[2]).await.unwrap();
        assert_eq!(job.id, ids[2]);
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.printer, Some(2));

        let heap = dispatcher.heap().lock().await;
        assert_eq!(heap.len(), 2);
        assert!(heap.find_by_id(&ids[2]).is_err());
        heap.check_invariants().unwrap();
        drop(heap);

        assert_eq!(dispatcher.history().await[0].id, ids[2]);
        assert_eq!(dispatcher.printers().await[1].jobs_processed, 1);
    }

    #[tokio::test]
    async fn test_start_job_overrides_delay() {
        let (dispatcher, ids) = dispatcher_with(&[3], 1);
        dispatcher
            .heap()
            .lock()
            .await
            .update_status(&ids[0], JobStatus::delayed("waiting for paper"))
            .unwrap();

        let job = dispatcher.start_job(&ids[0]).await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(dispatcher.heap().lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_start_job_failures_leave_scheduler_alone() {
        let (dispatcher, ids) = dispatcher_with(&[2, 1], 1);
        let before = dispatcher.heap().lock().await.snapshot();

        assert!(matches!(
            dispatcher.start_job("PDF99").await,
            Err(SpoolerError::NotFound(_))
        ));

        dispatcher.toggle_printer(1).await.unwrap();
        assert!(matches!(
            dispatcher.start_job(&ids[0]).await,
            Err(SpoolerError::NoPrinterOnline)
        ));

        assert_eq!(dispatcher.heap().lock().await.snapshot(), before);
        assert!(dispatcher.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_scheduler_round() {
        let (dispatcher, _) = dispatcher_with(&[], 3);
        let report = dispatcher.run().await;

        assert!(report.printed.is_empty());
        assert_eq!(report.remaining, 0);
        assert!(!report.halted_on_delayed);
        assert!(!report.no_printer_online);
    }
}
