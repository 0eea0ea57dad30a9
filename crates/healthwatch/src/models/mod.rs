//! Records the engine reads and writes through the store.

pub mod channel;
pub mod check;
pub mod service;
pub mod template;

pub use channel::{AlertChannelConfig, ChannelKind, ChannelSettings};
pub use check::CheckRecord;
pub use service::{AlertMute, MonitoredService, ServiceStatus};
pub use template::MessageTemplate;
