use actix_web::{HttpResponse, get, post, web};
use healthwatch::{LibsqlStore, Orchestrator};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

macros_utils::routes! {
    route scheduled_services,
    route start_service,
    route pause_service,
    route resume_service,
    route reset_notifications,
    route notification_budget,
    route recent_checks,
}

#[derive(Debug, Deserialize)]
pub struct ResumeQuery {
    #[serde(default = "notify_by_default")]
    notify: bool,
}

fn notify_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ChecksQuery {
    limit: Option<usize>,
}

/// Services with an active timer
#[get("/services/scheduled")]
pub async fn scheduled_services(engine: web::Data<Orchestrator>) -> HttpResponse {
    HttpResponse::Ok().json(engine.scheduler().scheduled_ids())
}

#[post("/services/{id}/start")]
pub async fn start_service(engine: web::Data<Orchestrator>, id: web::Path<String>) -> Result<HttpResponse, AppError> {
    let started = engine.scheduler().start(&id).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id.as_str(), "started": started })))
}

#[post("/services/{id}/pause")]
pub async fn pause_service(engine: web::Data<Orchestrator>, id: web::Path<String>) -> Result<HttpResponse, AppError> {
    engine.scheduler().pause(&id).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id.as_str(), "status": "paused" })))
}

/// `?notify=false` resumes without announcing it
#[post("/services/{id}/resume")]
pub async fn resume_service(
    engine: web::Data<Orchestrator>,
    id: web::Path<String>,
    query: web::Query<ResumeQuery>,
) -> Result<HttpResponse, AppError> {
    let started = engine.scheduler().resume(&id, query.notify).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id.as_str(), "started": started })))
}

#[post("/services/{id}/notifications/reset")]
pub async fn reset_notifications(engine: web::Data<Orchestrator>, id: web::Path<String>) -> HttpResponse {
    let cleared = engine.dispatcher().reset_notification_count(&id);
    HttpResponse::Ok().json(json!({ "id": id.as_str(), "cleared": cleared }))
}

/// Current cooldown window, `null` when none is open
#[get("/services/{id}/notifications")]
pub async fn notification_budget(engine: web::Data<Orchestrator>, id: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(engine.dispatcher().budget_snapshot(&id))
}

#[get("/services/{id}/checks")]
pub async fn recent_checks(
    store: web::Data<LibsqlStore>,
    id: web::Path<String>,
    query: web::Query<ChecksQuery>,
) -> Result<HttpResponse, AppError> {
    let records = store.recent_records(&id, query.limit.unwrap_or(50)).await?;
    Ok(HttpResponse::Ok().json(records))
}
