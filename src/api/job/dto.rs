use serde::Serialize;

use crate::dispatch::{DispatchReport, Printer};
use crate::spooler::Job;

/// Response carrying a single job
#[derive(Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: Job,
}

/// Response for job listings (queue or history)
#[derive(Serialize)]
pub struct JobListResponse {
    pub total: usize,
    pub jobs: Vec<Job>,
}

/// Dashboard counters
#[derive(Serialize)]
pub struct SummaryResponse {
    pub total: usize,
    pub queued: usize,
    pub delayed: usize,
    pub printers: usize,
    pub online: usize,
}

/// Response for a dispatch round
#[derive(Serialize)]
pub struct DispatchResponse {
    pub message: String,
    pub report: DispatchReport,
}

#[derive(Serialize)]
pub struct PrinterResponse {
    pub message: String,
    pub printer: Printer,
}

#[derive(Serialize)]
pub struct PrinterListResponse {
    pub total: usize,
    pub online: usize,
    pub printers: Vec<Printer>,
}
