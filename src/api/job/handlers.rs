use actix_web::{
    delete, get, patch, post,
    web::{scope, Data, Path, ServiceConfig},
    HttpResponse,
};
use actix_web_validator::Json;

use super::models::{NewJob, PriorityUpdate, StatusUpdate};
use super::service::{JobService, ServiceError};

#[post("")]
async fn create_job(
    service: Data<JobService>,
    job: Json<NewJob>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.create_job(&job).await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("")]
async fn list_jobs(service: Data<JobService>) -> HttpResponse {
    HttpResponse::Ok().json(service.list_jobs().await)
}

#[delete("")]
async fn clear_queue(service: Data<JobService>) -> HttpResponse {
    let cleared = service.clear_queue().await;
    HttpResponse::Ok().json(serde_json::json!({"message": "Queue cleared", "cleared": cleared}))
}

#[get("/summary")]
async fn summary(service: Data<JobService>) -> HttpResponse {
    HttpResponse::Ok().json(service.summary().await)
}

#[post("/dispatch")]
async fn dispatch(service: Data<JobService>) -> HttpResponse {
    HttpResponse::Ok().json(service.dispatch().await)
}

#[get("/history")]
async fn history(service: Data<JobService>) -> HttpResponse {
    HttpResponse::Ok().json(service.history().await)
}

#[delete("/history")]
async fn clear_history(service: Data<JobService>) -> HttpResponse {
    let cleared = service.clear_history().await;
    HttpResponse::Ok().json(serde_json::json!({"message": "Job history cleared", "cleared": cleared}))
}

#[get("/{id}")]
async fn get_job(
    service: Data<JobService>,
    id: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.get_job(&id).await?))
}

#[delete("/{id}")]
async fn cancel_job(
    service: Data<JobService>,
    id: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.cancel_job(&id).await?))
}

#[post("/{id}/start")]
async fn start_job(
    service: Data<JobService>,
    id: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.start_job(&id).await?))
}

#[patch("/{id}/priority")]
async fn update_priority(
    service: Data<JobService>,
    id: Path<String>,
    body: Json<PriorityUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.update_priority(&id, body.priority).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[patch("/{id}/status")]
async fn update_status(
    service: Data<JobService>,
    id: Path<String>,
    body: Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.update_status(&id, &body).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn job_config(config: &mut ServiceConfig) {
    // Fixed paths go before "/{id}" so they are not captured as ids
    config.service(
        scope("/jobs")
            .service(create_job)
            .service(list_jobs)
            .service(clear_queue)
            .service(summary)
            .service(dispatch)
            .service(history)
            .service(clear_history)
            .service(get_job)
            .service(cancel_job)
            .service(start_job)
            .service(update_priority)
            .service(update_status),
    );
}
