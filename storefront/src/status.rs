//! Order status normalization.
//!
//! The backend may send an explicit status, an activity timeline, or both.
//! An explicit status that names a known state always wins; otherwise the
//! status is derived from the timeline, where the latest mapped event wins.

use cyclecare_api::{ActivityEvent, Order};
use serde::{Deserialize, Serialize};

/// Canonical order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet reviewed
    Pending,
    /// Accepted by the workshop
    Accepted,
    /// A mechanic is assigned
    Assigned,
    /// Work has begun
    Started,
    /// Work is done
    Completed,
    /// Called off; terminal and outside the step sequence
    Cancelled,
}

impl OrderStatus {
    /// Progress steps in order. `Cancelled` is not a step.
    pub const STEPS: [Self; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::Assigned,
        Self::Started,
        Self::Completed,
    ];

    /// Parse an explicit status field (case-insensitive, whitespace ignored).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "assigned" => Some(Self::Assigned),
            "started" => Some(Self::Started),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Position in [`Self::STEPS`]; `None` for `Cancelled`.
    #[must_use]
    pub fn step_index(self) -> Option<usize> {
        Self::STEPS.iter().position(|s| *s == self)
    }

    /// Whether the order can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Order placed",
            Self::Accepted => "Accepted",
            Self::Assigned => "Mechanic assigned",
            Self::Started => "Service in progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical status an activity event kind stands for.
///
/// Kinds are matched after lowercasing and turning `-` and spaces into `_`.
#[must_use]
pub fn status_for_event(kind: &str) -> Option<OrderStatus> {
    let kind = kind.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    let status = match kind.as_str() {
        "created" | "order_created" | "placed" | "order_placed" | "pending" => OrderStatus::Pending,
        "accepted" | "order_accepted" | "confirmed" | "order_confirmed" => OrderStatus::Accepted,
        "assigned" | "mechanic_assigned" | "order_assigned" => OrderStatus::Assigned,
        "started" | "service_started" | "order_started" | "in_progress" => OrderStatus::Started,
        "completed" | "service_completed" | "order_completed" | "delivered" => OrderStatus::Completed,
        "cancelled" | "canceled" | "order_cancelled" | "order_canceled" => OrderStatus::Cancelled,
        _ => return None,
    };
    Some(status)
}

/// Where an order's status comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusSource<'a> {
    /// The explicit status field names a known state.
    Authoritative(OrderStatus),
    /// Status must be derived from the activity timeline.
    Derived(&'a [ActivityEvent]),
}

impl<'a> StatusSource<'a> {
    /// Pick the source for `order`.
    #[must_use]
    pub fn of(order: &'a Order) -> Self {
        match order.status.as_deref().and_then(OrderStatus::parse) {
            Some(status) => Self::Authoritative(status),
            None => Self::Derived(&order.activity),
        }
    }

    /// Resolve to a canonical status.
    #[must_use]
    pub fn resolve(&self) -> OrderStatus {
        match self {
            Self::Authoritative(status) => *status,
            Self::Derived(activity) => mapped_timeline(activity)
                .last()
                .copied()
                .unwrap_or(OrderStatus::Pending),
        }
    }
}

/// Status plus the step to highlight in a progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStatus {
    /// Canonical status
    pub status: OrderStatus,
    /// Index into [`OrderStatus::STEPS`]
    pub progress_index: usize,
}

/// Mapped statuses in chronological order.
///
/// The sort is stable, so events sharing a timestamp keep the order in
/// which the backend listed them.
fn mapped_timeline(activity: &[ActivityEvent]) -> Vec<OrderStatus> {
    let mut events: Vec<&ActivityEvent> = activity.iter().collect();
    events.sort_by_key(|e| e.timestamp);
    events
        .into_iter()
        .filter_map(|e| status_for_event(&e.kind))
        .collect()
}

/// Normalize an order's status.
#[must_use]
pub fn normalize(order: &Order) -> NormalizedStatus {
    let status = StatusSource::of(order).resolve();
    let progress_index = match status.step_index() {
        Some(index) => index,
        // Cancelled shows how far the order got before it was called off
        None => mapped_timeline(&order.activity)
            .into_iter()
            .filter_map(OrderStatus::step_index)
            .max()
            .unwrap_or(0),
    };
    NormalizedStatus {
        status,
        progress_index,
    }
}

/// Canonical status of `order`.
#[must_use]
pub fn normalize_status(order: &Order) -> OrderStatus {
    normalize(order).status
}

/// Progress step of `order`.
#[must_use]
pub fn progress_index(order: &Order) -> usize {
    normalize(order).progress_index
}
