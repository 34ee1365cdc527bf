//! Label model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-form tag; a snippet may carry any number of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: usize,
}

impl Label {
    pub fn new(name: String) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            created_at: Utc::now(),
            usage_count: 0,
        }
    }
}
