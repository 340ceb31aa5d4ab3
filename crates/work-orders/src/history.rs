//! Status history log

use crate::order::{OrderId, OrderStatus, StatusChange, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit row per status change (creation included)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub id: i64,
    pub order: OrderId,
    /// Empty on creation
    pub previous: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub user: Option<UserId>,
    pub comment: String,
    pub at: DateTime<Utc>,
}

impl OrderHistoryEntry {
    /// Entry for a freshly created order
    pub fn creation(id: i64, order: OrderId, status: OrderStatus, user: Option<UserId>) -> Self {
        Self {
            id,
            order,
            previous: None,
            new_status: status,
            user,
            comment: "Order created".to_string(),
            at: Utc::now(),
        }
    }

    /// Entry derived from a state-machine transition
    pub fn from_change(id: i64, order: OrderId, change: StatusChange, comment: impl Into<String>) -> Self {
        Self {
            id,
            order,
            previous: Some(change.from),
            new_status: change.to,
            user: change.by,
            comment: comment.into(),
            at: change.at,
        }
    }
}
