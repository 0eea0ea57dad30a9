use serde::{Deserialize, Serialize};

/// Alert message template owned by the CRUD layer.
///
/// Bodies are tera templates; see `notifications::template` for the
/// variables available to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub down_message: String,
    pub up_message: String,
}
