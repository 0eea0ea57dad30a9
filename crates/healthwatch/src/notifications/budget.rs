use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Alerts sent for one service inside the current cooldown window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationBudget {
    pub window_start: DateTime<Utc>,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    /// Send; `count` is this alert's position in the window
    Proceed { count: u32 },
    /// Budget exhausted for the current window
    Suppressed { count: u32 },
}

/// Per-service down-alert throttling, memory only.
///
/// Within one cooldown window at most `budget` alerts go out; once the window
/// has fully elapsed the next alert opens a fresh window at count 1.
pub struct BudgetStore {
    cooldown: Duration,
    entries: Mutex<HashMap<String, NotificationBudget>>,
}

impl BudgetStore {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, entries: Mutex::new(HashMap::new()) }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, NotificationBudget>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether a down alert for `service_id` may go out at `now`,
    /// consuming one unit of budget when it may.
    pub fn evaluate(&self, service_id: &str, budget: u32, now: DateTime<Utc>) -> BudgetDecision {
        let mut entries = self.entries();
        let fresh = NotificationBudget { window_start: now, count: 1 };

        let Some(entry) = entries.get_mut(service_id) else {
            entries.insert(service_id.to_string(), fresh);
            return BudgetDecision::Proceed { count: 1 };
        };

        if now - entry.window_start >= self.cooldown {
            *entry = fresh;
            return BudgetDecision::Proceed { count: 1 };
        }

        // A budget of one means a single alert per incident window.
        if budget <= 1 || entry.count >= budget {
            return BudgetDecision::Suppressed { count: entry.count };
        }

        entry.count += 1;
        BudgetDecision::Proceed { count: entry.count }
    }

    pub fn get(&self, service_id: &str) -> Option<NotificationBudget> {
        self.entries().get(service_id).copied()
    }

    /// Forget the service's window; true if there was one
    pub fn reset(&self, service_id: &str) -> bool {
        self.entries().remove(service_id).is_some()
    }
}
