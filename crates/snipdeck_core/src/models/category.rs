//! Category model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single-valued grouping assigned to every snippet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: usize,
}

impl Category {
    /// Create a category with a fresh id and zero usage.
    ///
    /// `name` is stored as given; callers sanitize first.
    pub fn new(name: String, sort_order: i32, color: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            sort_order,
            color,
            created_at: Utc::now(),
            usage_count: 0,
        }
    }

    /// Create a category under a caller-chosen id (orphan adoption).
    pub fn with_id(id: Uuid, name: String, sort_order: i32) -> Self {
        Self {
            id,
            ..Self::new(name, sort_order, None)
        }
    }
}
