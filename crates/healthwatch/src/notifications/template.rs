//! Alert message rendering.
//!
//! Templates are tera strings rendered with these variables:
//! `service_name`, `service_url`, `status` (upper case), `response_time`
//! (ms), `time` and `max_attempts`.

use chrono::{DateTime, Utc};
use tera::{Context, Tera};

use crate::models::{MessageTemplate, MonitoredService, ServiceStatus};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// What a message is being rendered about
#[derive(Debug, Clone, Copy)]
pub struct AlertContext<'a> {
    pub service: &'a MonitoredService,
    pub status: ServiceStatus,
    pub response_time_ms: u64,
    pub time: DateTime<Utc>,
}

impl AlertContext<'_> {
    fn status_label(&self) -> String {
        self.status.as_str().to_uppercase()
    }

    fn tera_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("service_name", &self.service.name);
        context.insert("service_url", &self.service.url);
        context.insert("status", &self.status_label());
        context.insert("response_time", &self.response_time_ms);
        context.insert("time", &self.time.format(TIME_FORMAT).to_string());
        context.insert("max_attempts", &self.service.alert_budget());
        context
    }
}

/// The message used when no template applies
pub fn default_message(ctx: &AlertContext<'_>) -> String {
    format!(
        "{} is {}. Response time: {}ms. Time: {}",
        ctx.service.name,
        ctx.status_label(),
        ctx.response_time_ms,
        ctx.time.format(TIME_FORMAT)
    )
}

/// Render the template body matching the alert's status.
///
/// Down alerts use `down_message`, everything else `up_message`.
pub fn render(template: &MessageTemplate, ctx: &AlertContext<'_>) -> Result<String, tera::Error> {
    let body = match ctx.status {
        ServiceStatus::Down => &template.down_message,
        _ => &template.up_message,
    };
    Tera::one_off(body, &ctx.tera_context(), false)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn service() -> MonitoredService {
        MonitoredService::new("svc", "Billing API", "https://billing.example.com")
    }

    #[test]
    fn default_message_names_service_and_status() {
        let service = service();
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let ctx = AlertContext { service: &service, status: ServiceStatus::Down, response_time_ms: 0, time };

        assert_eq!(
            default_message(&ctx),
            "Billing API is DOWN. Response time: 0ms. Time: 2024-05-01 12:30:00 UTC"
        );
    }

    #[test]
    fn template_picks_body_by_status() {
        let service = service();
        let template = MessageTemplate {
            id: "tpl".into(),
            down_message: "{{ service_name }} unreachable ({{ status }})".into(),
            up_message: "{{ service_name }} back after {{ response_time }}ms".into(),
        };
        let time = Utc::now();

        let down = AlertContext { service: &service, status: ServiceStatus::Down, response_time_ms: 0, time };
        let up = AlertContext { service: &service, status: ServiceStatus::Up, response_time_ms: 87, time };

        assert_eq!(render(&template, &down).unwrap(), "Billing API unreachable (DOWN)");
        assert_eq!(render(&template, &up).unwrap(), "Billing API back after 87ms");
    }

    #[test]
    fn broken_template_is_an_error() {
        let service = service();
        let template = MessageTemplate { id: "tpl".into(), down_message: "{{ unclosed".into(), up_message: String::new() };
        let ctx = AlertContext { service: &service, status: ServiceStatus::Down, response_time_ms: 0, time: Utc::now() };

        assert!(render(&template, &ctx).is_err());
    }
}
