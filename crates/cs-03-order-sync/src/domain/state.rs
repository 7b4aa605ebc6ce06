//! Order status state graph.
//!
//! ```text
//! pending ──→ confirmed ──→ preparing ──→ ready ──→ delivered
//!    │            │
//!    └────────────┴──→ cancelled
//! ```
//!
//! `delivered` and `cancelled` have no outgoing edges.

use shared_types::OrderStatus;

/// Statuses reachable from `from` in one step.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[Preparing, Cancelled],
        Preparing => &[Ready],
        Ready => &[Delivered],
        Delivered | Cancelled => &[],
    }
}

pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}
