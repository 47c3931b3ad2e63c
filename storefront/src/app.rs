//! Root state, actions and reducer.
//!
//! [`AppReducer`] routes every [`AppAction`] to the slice that owns it and
//! lifts the slice's effects back into `AppAction`. Coordination between
//! slices happens here and nowhere else:
//!
//! - `Boot` restores the session and loads cities, content and the catalog.
//! - Any request rejected with 401 expires the session and sends the
//!   customer to the login screen.
//! - A loaded city list feeds the booking wizard's service area.
//! - Customer details saved by the wizard refresh the signed-in account.
//! - A booking fault opens the fault panel; retrying restarts the wizard.

use crate::booking::{BookingAction, BookingReducer, BookingState};
use crate::environment::{AppEnvironment, Backend, IdentityProvider};
use crate::error::ApiFailure;
use crate::slices::auth::SESSION_EXPIRED;
use crate::slices::{
    AuthAction, AuthReducer, AuthState, CityAction, CityReducer, CityState, ContentAction,
    ContentReducer, ContentState, NoticeLevel, OrderAction, OrderReducer, OrderState, Route,
    ServicesAction, ServicesReducer, ServicesState, UiAction, UiReducer, UiState,
};
use cyclecare_core::composition::scope;
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::SmallVec;

type AppEffects = SmallVec<[Effect<AppAction>; 4]>;

/// Whole storefront state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Session
    pub auth: AuthState,
    /// City list and selection
    pub city: CityState,
    /// Landing and contact content
    pub content: ContentState,
    /// Service catalog
    pub services: ServicesState,
    /// Orders of the signed-in account and the tracked order
    pub order: OrderState,
    /// Booking wizard
    pub booking: BookingState,
    /// Route, notices and fault panel
    pub ui: UiState,
}

/// Every input the storefront reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Application started
    Boot,
    /// Auth slice
    Auth(AuthAction),
    /// City slice
    City(CityAction),
    /// Content slice
    Content(ContentAction),
    /// Services slice
    Services(ServicesAction),
    /// Order slice
    Order(OrderAction),
    /// Booking wizard
    Booking(BookingAction),
    /// UI slice
    Ui(UiAction),
}

impl AppAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Auth(action) => action.failure(),
            Self::City(action) => action.failure(),
            Self::Content(action) => action.failure(),
            Self::Services(action) => action.failure(),
            Self::Order(action) => action.failure(),
            Self::Booking(action) => action.failure(),
            Self::Boot | Self::Ui(_) => None,
        }
    }
}

/// Root reducer.
#[derive(Debug, Clone, Copy)]
pub struct AppReducer<B, I> {
    auth: AuthReducer<B, I>,
    city: CityReducer<B, I>,
    content: ContentReducer<B, I>,
    services: ServicesReducer<B, I>,
    order: OrderReducer<B, I>,
    booking: BookingReducer<B, I>,
    ui: UiReducer,
}

impl<B, I> AppReducer<B, I> {
    /// Create the root reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auth: AuthReducer::new(),
            city: CityReducer::new(),
            content: ContentReducer::new(),
            services: ServicesReducer::new(),
            order: OrderReducer::new(),
            booking: BookingReducer::new(),
            ui: UiReducer::new(),
        }
    }
}

impl<B, I> Default for AppReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> AppReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    fn ui(&self, state: &mut AppState, action: UiAction) -> AppEffects {
        scope(&self.ui, &mut state.ui, action, &(), AppAction::Ui)
    }

    fn notify(&self, state: &mut AppState, level: NoticeLevel, message: &str) -> AppEffects {
        self.ui(
            state,
            UiAction::Notify {
                level,
                message: message.to_string(),
            },
        )
    }

    fn expire_session(&self, state: &mut AppState, env: &AppEnvironment<B, I>) -> AppEffects {
        let mut effects = scope(
            &self.auth,
            &mut state.auth,
            AuthAction::SessionExpired,
            env,
            AppAction::Auth,
        );
        effects.extend(scope(&self.order, &mut state.order, OrderAction::Reset, env, AppAction::Order));
        effects.extend(self.ui(state, UiAction::Navigate(Route::Login)));
        effects.extend(self.notify(state, NoticeLevel::Error, SESSION_EXPIRED));
        effects
    }

    fn reduce_auth(
        &self,
        state: &mut AppState,
        action: AuthAction,
        env: &AppEnvironment<B, I>,
    ) -> AppEffects {
        let signed_in = matches!(action, AuthAction::SignedIn { .. });
        let logged_out = action == AuthAction::Logout;

        let mut effects = scope(&self.auth, &mut state.auth, action, env, AppAction::Auth);

        if signed_in && state.auth.is_authenticated() {
            effects.extend(self.ui(state, UiAction::Navigate(Route::Home)));
            effects.extend(self.notify(state, NoticeLevel::Info, "Signed in"));
        }
        if logged_out {
            effects.extend(scope(&self.order, &mut state.order, OrderAction::Reset, env, AppAction::Order));
            effects.extend(scope(
                &self.booking,
                &mut state.booking,
                BookingAction::Reset,
                env,
                AppAction::Booking,
            ));
            effects.extend(self.ui(state, UiAction::Navigate(Route::Home)));
        }
        effects
    }

    fn reduce_city(
        &self,
        state: &mut AppState,
        action: CityAction,
        env: &AppEnvironment<B, I>,
    ) -> AppEffects {
        let cities = match &action {
            CityAction::Loaded { cities, .. } => Some(cities.clone()),
            _ => None,
        };

        let mut effects = scope(&self.city, &mut state.city, action, env, AppAction::City);

        if let Some(cities) = cities {
            effects.extend(scope(
                &self.booking,
                &mut state.booking,
                BookingAction::UseCities(cities),
                env,
                AppAction::Booking,
            ));
        }
        effects
    }

    fn reduce_booking(
        &self,
        state: &mut AppState,
        action: BookingAction,
        env: &AppEnvironment<B, I>,
    ) -> AppEffects {
        let saved = match &action {
            BookingAction::CustomerSaved(user) => Some(user.clone()),
            _ => None,
        };
        let was_confirmed = state.booking.created_order.is_some();

        let mut effects = scope(&self.booking, &mut state.booking, action, env, AppAction::Booking);

        if let Some(user) = saved {
            effects.extend(scope(
                &self.auth,
                &mut state.auth,
                AuthAction::UserUpdated(user),
                env,
                AppAction::Auth,
            ));
        }
        if !was_confirmed && state.booking.created_order.is_some() {
            effects.extend(self.notify(state, NoticeLevel::Info, "Booking confirmed"));
        }
        if let Some(message) = state.booking.fault.take() {
            effects.extend(self.ui(state, UiAction::ShowFault { message }));
        }
        effects
    }

    fn reduce_ui(
        &self,
        state: &mut AppState,
        action: UiAction,
        env: &AppEnvironment<B, I>,
    ) -> AppEffects {
        let follow_up = match &action {
            UiAction::RetryAfterFault => Some(AppAction::Booking(BookingAction::Start {
                user: state.auth.user().cloned(),
                service: state.booking.service.clone(),
            })),
            UiAction::Navigate(Route::OrderTracking(id)) => {
                Some(AppAction::Order(OrderAction::Track { id: id.clone() }))
            },
            UiAction::Navigate(Route::Account) => state
                .auth
                .user_id
                .clone()
                .map(|user_id| AppAction::Order(OrderAction::LoadForUser { user_id })),
            _ => None,
        };

        let mut effects = self.ui(state, action);
        if let Some(follow_up) = follow_up {
            effects.extend(self.reduce(state, follow_up, env));
        }
        effects
    }
}

impl<B, I> Reducer for AppReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment<B, I>;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &AppEnvironment<B, I>,
    ) -> AppEffects {
        let unauthorized = action.failure().is_some_and(ApiFailure::is_unauthorized);

        let mut effects = match action {
            AppAction::Boot => {
                tracing::info!("Booting storefront");
                let mut effects = AppEffects::new();
                for action in [
                    AppAction::Auth(AuthAction::Restore),
                    AppAction::City(CityAction::Load),
                    AppAction::Content(ContentAction::Load),
                    AppAction::Services(ServicesAction::Load),
                ] {
                    effects.extend(self.reduce(state, action, env));
                }
                effects
            },
            AppAction::Auth(action) => self.reduce_auth(state, action, env),
            AppAction::City(action) => self.reduce_city(state, action, env),
            AppAction::Content(action) => {
                scope(&self.content, &mut state.content, action, env, AppAction::Content)
            },
            AppAction::Services(action) => {
                scope(&self.services, &mut state.services, action, env, AppAction::Services)
            },
            AppAction::Order(action) => scope(&self.order, &mut state.order, action, env, AppAction::Order),
            AppAction::Booking(action) => self.reduce_booking(state, action, env),
            AppAction::Ui(action) => self.reduce_ui(state, action, env),
        };

        if unauthorized {
            tracing::warn!("Backend rejected the session");
            effects.extend(self.expire_session(state, env));
        }
        effects
    }
}
