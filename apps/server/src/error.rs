use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use healthwatch::SchedulerError;
use healthwatch::notifications::NotificationError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("{0}")]
    Store(#[from] healthwatch::StoreError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Scheduler(SchedulerError::ServiceNotFound(_))
            | AppError::Notification(NotificationError::ChannelNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Notification(NotificationError::ChannelDisabled(_)) => StatusCode::CONFLICT,
            AppError::Notification(NotificationError::Sender(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_service_is_not_found() {
        let err = AppError::from(SchedulerError::ServiceNotFound("svc".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failure_is_internal() {
        let err = AppError::from(SchedulerError::Store(healthwatch::StoreError::Pool("exhausted".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn disabled_channel_conflicts() {
        let err = AppError::from(NotificationError::ChannelDisabled("ops".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
