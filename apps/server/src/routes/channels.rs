use actix_web::{HttpResponse, post, web};
use healthwatch::Orchestrator;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

macros_utils::routes! {
    route test_channel,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestMessage {
    message: Option<String>,
}

/// Push a test message through a channel, ignoring mutes and cooldowns
#[post("/channels/{id}/test")]
pub async fn test_channel(
    engine: web::Data<Orchestrator>,
    id: web::Path<String>,
    body: Option<web::Json<TestMessage>>,
) -> Result<HttpResponse, AppError> {
    let message = body
        .and_then(|b| b.into_inner().message)
        .unwrap_or_else(|| format!("healthwatch {} test message", healthwatch::VERSION));

    engine.dispatcher().send_test(&id, &message).await?;
    Ok(HttpResponse::Ok().json(json!({ "channel": id.as_str(), "sent": true })))
}
