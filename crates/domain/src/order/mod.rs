//! Order aggregate and related types.

mod aggregate;
mod commands;
mod item;
mod state;

pub use aggregate::Order;
pub use commands::*;
pub use item::OrderItem;
pub use state::{OrderStatus, UnknownStatus};

use common::OrderId;
use serde::{Deserialize, Serialize};

/// Outcome of [`Order::transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub previous: OrderStatus,
    pub current: OrderStatus,
}

impl StatusChange {
    /// Returns true if the status actually changed.
    pub fn is_change(&self) -> bool {
        self.previous != self.current
    }

    /// Returns true on the first arrival in `Completed`.
    pub fn completes_order(&self) -> bool {
        self.previous != OrderStatus::Completed && self.current == OrderStatus::Completed
    }
}
