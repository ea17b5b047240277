use actix_web::{
    get, patch,
    web::{scope, Data, Path, ServiceConfig},
    HttpResponse,
};

use crate::api::job::service::{JobService, ServiceError};

#[get("")]
async fn list_printers(service: Data<JobService>) -> HttpResponse {
    HttpResponse::Ok().json(service.list_printers().await)
}

/// Switch a printer between online and offline
#[patch("/{id}")]
async fn toggle_printer(
    service: Data<JobService>,
    id: Path<usize>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.toggle_printer(id.into_inner()).await?))
}

pub fn printer_config(config: &mut ServiceConfig) {
    config.service(scope("/printers").service(list_printers).service(toggle_printer));
}
