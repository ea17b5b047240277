use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use tokio::time::{timeout, Duration};
use tracing::{debug, error};

use crate::api::job::JobService;

/// How long a readiness check waits for the scheduler lock
const READY_TIMEOUT: Duration = Duration::from_secs(1);

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    scheduler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// General health check including the number of tracked jobs.
/// Use for load balancers and uptime monitors.
#[get("/health")]
async fn health_check(service: web::Data<JobService>) -> impl Responder {
    let jobs = service.heap().lock().await.len();
    debug!("Health check: {} jobs tracked", jobs);
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        scheduler: "available".to_string(),
        jobs: Some(jobs),
        error: None,
    })
}

/// Readiness check endpoint
///
/// Ready when the scheduler lock can be taken promptly. A long dispatch round
/// never holds the lock, so a timeout here means something is stuck.
#[get("/ready")]
async fn readiness_check(service: web::Data<JobService>) -> impl Responder {
    match timeout(READY_TIMEOUT, service.heap().lock()).await {
        Ok(heap) => HttpResponse::Ok().json(HealthResponse {
            status: "ready".to_string(),
            scheduler: "available".to_string(),
            jobs: Some(heap.len()),
            error: None,
        }),
        Err(_) => {
            error!("Readiness check failed: scheduler lock not acquired within {:?}", READY_TIMEOUT);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "not_ready".to_string(),
                scheduler: "busy".to_string(),
                jobs: None,
                error: Some("Scheduler lock timed out".to_string()),
            })
        }
    }
}

/// Liveness check endpoint
///
/// Simple check that the process is alive. Does not touch the scheduler.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        scheduler: "not_checked".to_string(),
        jobs: None,
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}
