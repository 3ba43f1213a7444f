//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// ```text
/// Preparing ──► Delivering ──► Completed
///     │
///     └──────────────────────────► Cancelled
/// ```
///
/// Completed and Cancelled are terminal. Any edge from a non-terminal
/// status to any other status is accepted, e.g. Preparing ──► Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order was placed and is being prepared.
    #[default]
    Preparing,

    /// Order is on its way to the customer.
    Delivering,

    /// Order was handed over (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Preparing,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns true if line items can still change in this status.
    pub fn can_modify_items(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if an order in this status may be moved to `next`.
    ///
    /// Staying in the same status is always allowed (a re-save).
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next || !self.is_terminal()
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0:?}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_preparing() {
        assert_eq!(OrderStatus::default(), OrderStatus::Preparing);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Preparing.is_terminal());
        assert!(!OrderStatus::Delivering.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_non_terminal_can_go_anywhere() {
        for next in OrderStatus::ALL {
            assert!(OrderStatus::Preparing.can_transition_to(next));
            assert!(OrderStatus::Delivering.can_transition_to(next));
        }
    }

    #[test]
    fn test_terminal_only_stays() {
        assert!(OrderStatus::Completed.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Delivering));
    }

    #[test]
    fn test_items_frozen_in_terminal_statuses() {
        assert!(OrderStatus::Preparing.can_modify_items());
        assert!(OrderStatus::Delivering.can_modify_items());
        assert!(!OrderStatus::Completed.can_modify_items());
        assert!(!OrderStatus::Cancelled.can_modify_items());
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("COMPLETED".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert!("new".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serialization_is_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Delivering).unwrap();
        assert_eq!(json, "\"delivering\"");
    }
}
