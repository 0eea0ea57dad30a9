mod common;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use common::{CHANNEL_ID, Harness, channel, monitored};
use healthwatch::models::{MessageTemplate, MonitoredService};
use healthwatch::notifications::NotificationError;
use healthwatch::store::ServiceStore;
use healthwatch::{NotificationDispatcher, ServiceStatus};

fn template() -> MessageTemplate {
    MessageTemplate {
        id: "short".into(),
        down_message: "{{ service_name }} {{ status }} ({{ max_attempts }} tries)".into(),
        up_message: "{{ service_name }} {{ status }} in {{ response_time }}ms".into(),
    }
}

async fn harness_with(service: MonitoredService) -> Harness {
    let h = Harness::new();
    h.add_service(service).await;
    h
}

#[tokio::test]
async fn down_alert_carries_budget_suffix() {
    let h = harness_with(monitored("api")).await;
    let service = h.service("api").await;

    assert!(h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await);
    assert!(h.dispatcher.dispatch(&service, ServiceStatus::Up, 87).await);

    let messages = h.sender.messages();
    assert_eq!(messages[0], "Service api is DOWN. Response time: 0ms. Time: 2024-01-01 00:00:00 UTC Alert 1/3");
    assert_eq!(messages[1], "Service api is UP. Response time: 87ms. Time: 2024-01-01 00:00:00 UTC");
}

#[tokio::test]
async fn up_alerts_ignore_the_budget() {
    let h = harness_with(monitored("api").with_max_retry_attempts(1)).await;
    let service = h.service("api").await;

    h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await;
    assert!(h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await, "suppressed counts as handled");
    for _ in 0..3 {
        h.dispatcher.dispatch(&service, ServiceStatus::Up, 10).await;
    }

    assert_eq!(h.sender.count(), 4);
    assert_eq!(h.dispatcher.budget_snapshot("api").map(|b| b.count), Some(1));
}

#[tokio::test]
async fn template_is_rendered_per_status() {
    let h = harness_with(monitored("api").with_template("short")).await;
    h.store.insert_template(template()).await;
    let service = h.service("api").await;

    h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await;
    h.dispatcher.dispatch(&service, ServiceStatus::Up, 42).await;

    assert_eq!(h.sender.messages(), vec!["Service api DOWN (3 tries) Alert 1/3", "Service api UP in 42ms"]);
}

#[tokio::test]
async fn missing_or_broken_template_falls_back_to_default() {
    let h = harness_with(monitored("api").with_template("nope")).await;
    h.store
        .insert_template(MessageTemplate { id: "broken".into(), down_message: "{{ oops".into(), up_message: String::new() })
        .await;
    h.store.insert_service(monitored("web").with_template("broken")).await;

    h.dispatcher.dispatch(&h.service("api").await, ServiceStatus::Down, 0).await;
    h.dispatcher.dispatch(&h.service("web").await, ServiceStatus::Down, 0).await;

    let messages = h.sender.messages();
    assert!(messages[0].starts_with("Service api is DOWN."));
    assert!(messages[1].starts_with("Service web is DOWN."));
}

#[tokio::test]
async fn muted_service_is_handled_without_sending() {
    let h = harness_with(monitored("api").muted()).await;
    let service = h.service("api").await;

    assert!(h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await);
    assert_eq!(h.sender.count(), 0);
    assert!(h.dispatcher.budget_snapshot("api").is_none());
}

#[tokio::test]
async fn unusable_channels_report_failure() {
    let h = Harness::new();
    h.store.insert_channel(channel("off", false)).await;
    let mut no_channel = monitored("a");
    no_channel.notification_channel = None;
    let disabled = monitored("b").with_channel("off");
    let missing = monitored("c").with_channel("gone");

    for service in [no_channel, disabled, missing] {
        h.store.insert_service(service.clone()).await;
        assert!(!h.dispatcher.dispatch(&service, ServiceStatus::Up, 0).await, "{} should fail", service.id);
    }
    assert_eq!(h.sender.count(), 0);
}

#[tokio::test]
async fn sender_failure_reports_failure() {
    let h = harness_with(monitored("api")).await;
    h.sender.set_failing(true);

    assert!(!h.dispatcher.dispatch(&h.service("api").await, ServiceStatus::Down, 0).await);
    // the attempt still consumed budget
    assert_eq!(h.dispatcher.budget_snapshot("api").map(|b| b.count), Some(1));
}

#[tokio::test]
async fn channel_without_sender_reports_failure() {
    let h = harness_with(monitored("api")).await;
    let store: Arc<dyn ServiceStore> = h.store.clone();
    let dispatcher = NotificationDispatcher::new(store, HashMap::new(), Duration::minutes(5), h.clock.clone());

    assert!(!dispatcher.dispatch(&h.service("api").await, ServiceStatus::Down, 0).await);
}

#[tokio::test]
async fn reset_clears_the_window() {
    let h = harness_with(monitored("api")).await;
    let service = h.service("api").await;
    h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await;
    h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await;

    assert!(h.dispatcher.reset_notification_count("api"));
    assert!(!h.dispatcher.reset_notification_count("api"));

    h.dispatcher.dispatch(&service, ServiceStatus::Down, 0).await;
    assert!(h.sender.messages()[2].ends_with("Alert 1/3"));
}

#[tokio::test]
async fn test_message_bypasses_mute_and_budget() {
    let h = harness_with(monitored("api").muted().with_max_retry_attempts(1)).await;
    h.store.insert_channel(channel("off", false)).await;

    h.dispatcher.send_test(CHANNEL_ID, "hello from healthwatch").await.unwrap();
    h.dispatcher.send_test(CHANNEL_ID, "again").await.unwrap();
    assert_eq!(h.sender.messages(), vec!["hello from healthwatch", "again"]);

    assert!(matches!(h.dispatcher.send_test("off", "x").await, Err(NotificationError::ChannelDisabled(_))));
    assert!(matches!(h.dispatcher.send_test("gone", "x").await, Err(NotificationError::ChannelNotFound(_))));
}
