//! Order history, tracking and cancellation.
//!
//! Every order is held together with its normalized status so views never
//! re-derive it. Responses that no longer match what was asked for (after a
//! sign-out or a new tracking request) are dropped.

use crate::environment::{AppEnvironment, Backend, IdentityProvider};
use crate::error::ApiFailure;
use crate::request::{request_effect, Loadable};
use crate::status::{normalize, NormalizedStatus};
use cyclecare_api::{Order, OrderId, UserId};
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// An order with its normalized status.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    /// Order as returned by the backend
    pub order: Order,
    /// Normalized status and progress step
    pub status: NormalizedStatus,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let status = normalize(&order);
        Self { order, status }
    }
}

/// Order state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderState {
    /// Orders of the signed-in account, newest first
    pub orders: Loadable<Vec<OrderView>>,
    /// Account whose orders were requested
    pub orders_for: Option<UserId>,
    /// Order on the tracking page
    pub tracked: Loadable<OrderView>,
    /// Order the tracking page asked for
    pub tracking: Option<OrderId>,
    /// Order whose cancellation is in flight
    pub cancelling: Option<OrderId>,
    /// Inline error for the last cancellation
    pub error: Option<String>,
}

impl OrderState {
    fn find(&self, id: &OrderId) -> Option<&OrderView> {
        let listed = self
            .orders
            .value()
            .and_then(|orders| orders.iter().find(|v| &v.order.id == id));
        listed.or_else(|| self.tracked.value().filter(|v| &v.order.id == id))
    }

    fn replace(&mut self, view: &OrderView) {
        if let Some(orders) = self.orders.value_mut() {
            for existing in orders.iter_mut().filter(|v| v.order.id == view.order.id) {
                *existing = view.clone();
            }
        }
        if let Some(tracked) = self.tracked.value_mut() {
            if tracked.order.id == view.order.id {
                *tracked = view.clone();
            }
        }
    }
}

/// Order actions.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Fetch an account's orders
    LoadForUser {
        /// Account
        user_id: UserId,
    },
    /// Orders arrived
    Loaded {
        /// Account they belong to
        user_id: UserId,
        /// Orders
        orders: Vec<Order>,
    },
    /// Orders request failed
    LoadFailed {
        /// Account the request was for
        user_id: UserId,
        /// What went wrong
        failure: ApiFailure,
    },
    /// Open the tracking page of an order
    Track {
        /// Order
        id: OrderId,
    },
    /// Tracked order arrived
    Tracked(Order),
    /// Tracked order request failed
    TrackFailed {
        /// Order the request was for
        id: OrderId,
        /// What went wrong
        failure: ApiFailure,
    },
    /// Cancel an order
    Cancel {
        /// Order
        id: OrderId,
    },
    /// Cancellation went through
    Cancelled(Order),
    /// Cancellation failed
    CancelFailed {
        /// Order the request was for
        id: OrderId,
        /// What went wrong
        failure: ApiFailure,
    },
    /// Forget everything (sign-out)
    Reset,
}

impl OrderAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::LoadFailed { failure, .. }
            | Self::TrackFailed { failure, .. }
            | Self::CancelFailed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Order reducer.
#[derive(Debug, Clone, Copy)]
pub struct OrderReducer<B, I> {
    _env: PhantomData<fn() -> (B, I)>,
}

impl<B, I> OrderReducer<B, I> {
    /// Create a new order reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _env: PhantomData }
    }
}

impl<B, I> Default for OrderReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> Reducer for OrderReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = OrderState;
    type Action = OrderAction;
    type Environment = AppEnvironment<B, I>;

    #[allow(clippy::too_many_lines)] // Request and response arms for three operations
    fn reduce(
        &self,
        state: &mut OrderState,
        action: OrderAction,
        env: &AppEnvironment<B, I>,
    ) -> SmallVec<[Effect<OrderAction>; 4]> {
        match action {
            OrderAction::LoadForUser { user_id } => {
                state.orders = Loadable::Pending;
                state.orders_for = Some(user_id.clone());
                let backend = env.backend.clone();
                let requested = user_id.clone();
                smallvec![request_effect(
                    async move {
                        let orders = backend.orders_by_user(&user_id).await?;
                        Ok::<_, cyclecare_api::ApiError>((user_id, orders))
                    },
                    |(user_id, orders)| OrderAction::Loaded { user_id, orders },
                    |failure| OrderAction::LoadFailed {
                        user_id: requested,
                        failure,
                    },
                )]
            },

            OrderAction::Loaded { user_id, orders } => {
                if state.orders_for.as_ref() != Some(&user_id) {
                    tracing::debug!(user_id = %user_id, "Dropping orders for another account");
                    return smallvec![Effect::None];
                }
                let mut views: Vec<OrderView> = orders.into_iter().map(OrderView::from).collect();
                views.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
                state.orders = Loadable::Fulfilled(views);
                smallvec![Effect::None]
            },

            OrderAction::LoadFailed { user_id, failure } => {
                if state.orders_for.as_ref() != Some(&user_id) {
                    tracing::debug!(user_id = %user_id, "Dropping orders failure for another account");
                    return smallvec![Effect::None];
                }
                tracing::warn!(error = %failure, "Failed to load orders");
                state.orders = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },

            OrderAction::Track { id } => {
                state.tracked = Loadable::Pending;
                state.tracking = Some(id.clone());
                let backend = env.backend.clone();
                let requested = id.clone();
                smallvec![request_effect(
                    async move { backend.order_by_id(&id).await },
                    OrderAction::Tracked,
                    |failure| OrderAction::TrackFailed { id: requested, failure },
                )]
            },

            OrderAction::Tracked(order) => {
                if state.tracking.as_ref() != Some(&order.id) {
                    tracing::debug!(order_id = %order.id, "Dropping stale tracking response");
                    return smallvec![Effect::None];
                }
                let view = OrderView::from(order);
                tracing::debug!(order_id = %view.order.id, status = ?view.status.status, "Order tracked");
                state.tracked = Loadable::Fulfilled(view);
                smallvec![Effect::None]
            },

            OrderAction::TrackFailed { id, failure } => {
                if state.tracking.as_ref() != Some(&id) {
                    tracing::debug!(order_id = %id, "Dropping stale tracking failure");
                    return smallvec![Effect::None];
                }
                state.tracked = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },

            OrderAction::Cancel { id } => {
                if state.cancelling.is_some() {
                    return smallvec![Effect::None];
                }
                match state.find(&id).map(|v| v.status.status.is_terminal()) {
                    None => {
                        state.error = Some("Order not found".to_string());
                        return smallvec![Effect::None];
                    },
                    Some(true) => {
                        state.error = Some("This order can no longer be cancelled".to_string());
                        return smallvec![Effect::None];
                    },
                    Some(false) => {},
                }

                state.error = None;
                state.cancelling = Some(id.clone());
                let backend = env.backend.clone();
                let requested = id.clone();
                smallvec![request_effect(
                    async move { backend.cancel_order(&id).await },
                    OrderAction::Cancelled,
                    |failure| OrderAction::CancelFailed { id: requested, failure },
                )]
            },

            OrderAction::Cancelled(order) => {
                tracing::info!(order_id = %order.id, "Order cancelled");
                state.cancelling = None;
                let view = OrderView::from(order);
                state.replace(&view);
                smallvec![Effect::None]
            },

            OrderAction::CancelFailed { id, failure } => {
                if state.cancelling.as_ref() != Some(&id) {
                    return smallvec![Effect::None];
                }
                state.cancelling = None;
                state.error = Some(failure.message);
                smallvec![Effect::None]
            },

            OrderAction::Reset => {
                *state = OrderState::default();
                smallvec![Effect::None]
            },
        }
    }
}
