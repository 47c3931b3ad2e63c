//! Request lifecycle helpers.
//!
//! Each backend call a slice makes goes through [`request_effect`], which turns
//! the call into an [`Effect::Future`] resolving to either the fulfilled or the
//! rejected action. The slice tracks progress with a [`Loadable`].

use crate::error::ApiFailure;
use cyclecare_core::effect::Effect;
use std::future::Future;

/// Progress of a single remote value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Loadable<T> {
    /// Not requested yet.
    #[default]
    Idle,
    /// Request in flight.
    Pending,
    /// Request succeeded.
    Fulfilled(T),
    /// Request failed.
    Rejected(ApiFailure),
}

impl<T> Loadable<T> {
    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Loaded value.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Fulfilled(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable access to the loaded value.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Fulfilled(value) => Some(value),
            _ => None,
        }
    }

    /// Failure of the last request.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiFailure> {
        match self {
            Self::Rejected(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Run one backend call and map its outcome to an action.
pub fn request_effect<A, T, E, Fut, OnOk, OnErr>(
    request: Fut,
    on_ok: OnOk,
    on_err: OnErr,
) -> Effect<A>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Into<ApiFailure> + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    OnOk: FnOnce(T) -> A + Send + 'static,
    OnErr: FnOnce(ApiFailure) -> A + Send + 'static,
{
    Effect::future(async move {
        match request.await {
            Ok(value) => Some(on_ok(value)),
            Err(error) => {
                let failure: ApiFailure = error.into();
                tracing::debug!(kind = ?failure.kind, message = %failure.message, "Request rejected");
                Some(on_err(failure))
            },
        }
    })
}
