use std::sync::Arc;

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::{error, info, warn};

use super::dto::{
    DispatchResponse, JobListResponse, JobResponse, PrinterListResponse, PrinterResponse,
    SummaryResponse,
};
use super::models::{NewJob, RequestedStatus, StatusUpdate};
use crate::api::validation::ErrorResponse;
use crate::dispatch::{Dispatcher, PrinterStatus};
use crate::error::SpoolerError;
use crate::spooler::{JobStatus, SharedHeap};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Scheduler operation failed
    #[error(transparent)]
    Spooler(#[from] SpoolerError),

    /// Request was well-formed JSON but not acceptable
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Spooler(SpoolerError::NotFound(id)) => {
                warn!("Job not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("Job with id {} not found", id)}),
                })
            }
            ServiceError::Spooler(SpoolerError::CapacityExceeded(max)) => {
                warn!("Scheduler full at {} jobs", max);
                HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "Queue is full".to_string(),
                    fields: serde_json::json!({"message": format!("At most {} jobs can be queued", max)}),
                })
            }
            ServiceError::Spooler(SpoolerError::PrinterNotFound(id)) => {
                warn!("Printer not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("Printer with id {} not found", id)}),
                })
            }
            ServiceError::Spooler(SpoolerError::NoPrinterOnline) => {
                warn!("No printer online");
                HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "No printer available".to_string(),
                    fields: serde_json::json!({"message": "Every printer is offline"}),
                })
            }
            ServiceError::Spooler(e) => {
                error!("Scheduler error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Scheduler error occurred"}),
                })
            }
            ServiceError::ValidationError(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
        }
    }
}

/// Job service: the presentation layer's only way into the scheduler
pub struct JobService {
    dispatcher: Arc<Dispatcher>,
}

impl JobService {
    /// Create a new JobService instance
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn heap(&self) -> &SharedHeap {
        self.dispatcher.heap()
    }

    /// Submit a job
    ///
    /// # Returns
    /// - `Ok(JobResponse)` - Job queued with its generated id
    /// - `Err(ServiceError)` - Scheduler at capacity
    pub async fn create_job(&self, new_job: &NewJob) -> Result<JobResponse, ServiceError> {
        info!(
            "Service: Creating {} job with priority={}",
            new_job.kind, new_job.priority
        );

        let job = self
            .heap()
            .lock()
            .await
            .insert(new_job.kind, new_job.priority)?;

        info!("Service: Job created successfully with id={}", job.id);
        Ok(JobResponse {
            message: "Job created successfully".to_string(),
            job,
        })
    }

    /// Queued jobs sorted by priority
    pub async fn list_jobs(&self) -> JobListResponse {
        let jobs = self.heap().lock().await.by_priority();
        JobListResponse {
            total: jobs.len(),
            jobs,
        }
    }

    pub async fn get_job(&self, id: &str) -> Result<JobResponse, ServiceError> {
        let job = self.heap().lock().await.find_by_id(id)?.clone();
        Ok(JobResponse {
            message: "Job found".to_string(),
            job,
        })
    }

    /// Cancel a job that has not been dispatched yet
    pub async fn cancel_job(&self, id: &str) -> Result<JobResponse, ServiceError> {
        let job = self.heap().lock().await.remove_by_id(id)?;
        info!("Service: Job {} cancelled", id);
        Ok(JobResponse {
            message: format!("Job {} removed", id),
            job,
        })
    }

    /// Drop every waiting job. Generated ids keep counting from where they were.
    pub async fn clear_queue(&self) -> usize {
        let dropped = self.heap().lock().await.clear();
        info!("Service: Queue cleared ({} jobs)", dropped);
        dropped
    }

    /// Print one job right away, ahead of the queue order
    pub async fn start_job(&self, id: &str) -> Result<JobResponse, ServiceError> {
        let job = self.dispatcher.start_job(id).await?;
        info!("Service: Job {} started manually", id);
        Ok(JobResponse {
            message: format!("Job {} printed", id),
            job,
        })
    }

    pub async fn update_priority(
        &self,
        id: &str,
        priority: i64,
    ) -> Result<JobResponse, ServiceError> {
        let job = self.heap().lock().await.update_priority(id, priority)?;
        info!("Service: Job {} priority updated to {}", id, job.priority);
        Ok(JobResponse {
            message: "Priority updated".to_string(),
            job,
        })
    }

    /// Delay a job with a reason, or put it back in the queue
    pub async fn update_status(
        &self,
        id: &str,
        update: &StatusUpdate,
    ) -> Result<JobResponse, ServiceError> {
        let status = match (update.status, update.reason.as_deref()) {
            (RequestedStatus::Queued, _) => JobStatus::Queued,
            (RequestedStatus::Delayed, Some(reason)) if !reason.trim().is_empty() => {
                JobStatus::delayed(reason)
            }
            (RequestedStatus::Delayed, _) => {
                return Err(ServiceError::ValidationError(
                    "A reason is required to delay a job".to_string(),
                ))
            }
        };

        let job = self.heap().lock().await.update_status(id, status)?;
        info!("Service: Job {} is now {}", id, job.status);
        Ok(JobResponse {
            message: "Status updated".to_string(),
            job,
        })
    }

    pub async fn summary(&self) -> SummaryResponse {
        let online = self.dispatcher.online_printers().await;
        let heap = self.heap().lock().await;
        SummaryResponse {
            total: heap.len(),
            queued: heap.count_by_status(&JobStatus::Queued),
            delayed: heap.count_by_status(&JobStatus::delayed("")),
            printers: self.dispatcher.printer_count(),
            online,
        }
    }

    /// Run one dispatch round now
    pub async fn dispatch(&self) -> DispatchResponse {
        let report = self.dispatcher.run().await;
        let message = if report.no_printer_online {
            "No printer is online".to_string()
        } else if report.halted_on_delayed {
            "All remaining jobs are delayed".to_string()
        } else if report.remaining == 0 {
            "All jobs completed".to_string()
        } else {
            format!("{} jobs printed", report.printed.len())
        };
        DispatchResponse { message, report }
    }

    pub async fn history(&self) -> JobListResponse {
        let jobs = self.dispatcher.history().await;
        JobListResponse {
            total: jobs.len(),
            jobs,
        }
    }

    pub async fn clear_history(&self) -> usize {
        let dropped = self.dispatcher.clear_history().await;
        info!("Service: Job history cleared ({} entries)", dropped);
        dropped
    }

    pub async fn list_printers(&self) -> PrinterListResponse {
        let printers = self.dispatcher.printers().await;
        PrinterListResponse {
            total: printers.len(),
            online: printers
                .iter()
                .filter(|p| p.status == PrinterStatus::Online)
                .count(),
            printers,
        }
    }

    pub async fn toggle_printer(&self, id: usize) -> Result<PrinterResponse, ServiceError> {
        let printer = self.dispatcher.toggle_printer(id).await?;
        info!("Service: Printer {} set {}", id, printer.status);
        Ok(PrinterResponse {
            message: format!("Printer {} is now {}", id, printer.status),
            printer,
        })
    }
}
