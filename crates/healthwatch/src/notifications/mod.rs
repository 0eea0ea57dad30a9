//! Alerting: cooldown budgets, message rendering and channel transports.

pub mod budget;
pub mod dispatcher;
pub mod senders;
pub mod template;

use thiserror::Error;

pub use budget::{BudgetDecision, BudgetStore, NotificationBudget};
pub use dispatcher::NotificationDispatcher;
pub use senders::{ChannelSender, SenderError};

use crate::error::StoreError;
use crate::models::ChannelKind;

/// Why a message could not be delivered
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification channel not found: {0}")]
    ChannelNotFound(String),
    #[error("notification channel is disabled: {0}")]
    ChannelDisabled(String),
    #[error("no sender registered for {0} channels")]
    NoSender(ChannelKind),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("sender error: {0}")]
    Sender(#[from] SenderError),
}
