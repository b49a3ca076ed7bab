//! User integration events.
//!
//! `UserCreated` is produced by the (external) registration service; this
//! backend only consumes it, to provision a cart for the new user.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use mokka_core::UserId;

use crate::event::Event;
use crate::topics::TOPIC_USER_CREATED;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreated {
    pub user_id: UserId,
    /// Opaque identity payload owned by the registration service; carried
    /// through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_data: Option<JsonValue>,
}

impl UserCreated {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            identity_data: None,
        }
    }
}

impl Event for UserCreated {
    fn topic(&self) -> &'static str {
        TOPIC_USER_CREATED
    }

    fn event_type(&self) -> &'static str {
        "user.created"
    }
}
