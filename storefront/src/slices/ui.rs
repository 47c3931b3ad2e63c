//! Route, notices and the booking fault panel.

use cyclecare_api::OrderId;
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, SmallVec};
use std::time::Duration;

/// How long an info notice stays up.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Current screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    /// Landing page
    #[default]
    Home,
    /// Phone sign-in
    Login,
    /// Booking wizard
    Booking,
    /// Account area
    Account,
    /// Tracking page of one order
    OrderTracking(OrderId),
}

impl Route {
    /// Path for links and deep links.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Booking => "/book".to_string(),
            Self::Account => "/account".to_string(),
            Self::OrderTracking(id) => format!("/orders/{id}"),
        }
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Something failed
    Error,
    /// Something needs attention
    Warning,
    /// Informational, dismissed automatically
    Info,
}

/// A dismissable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Handle used to dismiss it
    pub id: u64,
    /// Severity
    pub level: NoticeLevel,
    /// Text
    pub message: String,
}

/// UI state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Current screen
    pub route: Route,
    /// Visible notices, oldest first
    pub notices: Vec<Notice>,
    /// Message of the booking fault panel, when shown
    pub fault: Option<String>,
    next_notice: u64,
}

/// UI actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Go to a screen
    Navigate(Route),
    /// Show a notice
    Notify {
        /// Severity
        level: NoticeLevel,
        /// Text
        message: String,
    },
    /// Hide a notice
    Dismiss {
        /// Notice handle
        id: u64,
    },
    /// Replace the booking screen with the fault panel
    ShowFault {
        /// What went wrong
        message: String,
    },
    /// Close the fault panel (the wizard is reset alongside)
    RetryAfterFault,
}

/// UI reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiReducer;

impl UiReducer {
    /// Create a new UI reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for UiReducer {
    type State = UiState;
    type Action = UiAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut UiState,
        action: UiAction,
        _env: &(),
    ) -> SmallVec<[Effect<UiAction>; 4]> {
        match action {
            UiAction::Navigate(route) => {
                tracing::debug!(path = %route.path(), "Navigating");
                state.route = route;
                smallvec![Effect::None]
            },
            UiAction::Notify { level, message } => {
                state.next_notice += 1;
                let id = state.next_notice;
                state.notices.push(Notice { id, level, message });

                if level == NoticeLevel::Info {
                    smallvec![Effect::Delay {
                        duration: NOTICE_TTL,
                        action: Box::new(UiAction::Dismiss { id }),
                    }]
                } else {
                    smallvec![Effect::None]
                }
            },
            UiAction::Dismiss { id } => {
                state.notices.retain(|n| n.id != id);
                smallvec![Effect::None]
            },
            UiAction::ShowFault { message } => {
                tracing::warn!(%message, "Booking fault");
                state.fault = Some(message);
                smallvec![Effect::None]
            },
            UiAction::RetryAfterFault => {
                state.fault = None;
                state.route = Route::Booking;
                smallvec![Effect::None]
            },
        }
    }
}
