//! Phone/OTP sign-in and the persisted session.
//!
//! Flow: request a code for a phone number, verify it with the identity
//! provider, exchange the identity token for a backend account, then persist
//! the session token under `token`.

use crate::environment::{AppEnvironment, Backend, IdentityProvider, OtpChallenge};
use crate::error::ApiFailure;
use crate::request::{request_effect, Loadable};
use crate::storage::{read_effect, write_effect, TOKEN_KEY, USER_ID_KEY};
use crate::validation::sanitize_phone;
use cyclecare_api::{RegisterUser, User, UserId};
use cyclecare_core::effect::Effect;
use cyclecare_core::reducer::Reducer;
use cyclecare_core::{smallvec, DateTime, SmallVec, Utc};
use std::marker::PhantomData;

/// Message shown after the backend rejects the session.
pub const SESSION_EXPIRED: &str = "Your session expired. Please sign in again.";

/// Minimum gap between two code requests.
pub const OTP_RESEND_COOLDOWN_SECS: i64 = 30;

/// Auth state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    /// Phone number being signed in, digits only
    pub phone: String,
    /// Outstanding code challenge
    pub challenge: Loadable<OtpChallenge>,
    /// When the last code was requested
    pub otp_sent_at: Option<DateTime<Utc>>,
    /// Signed-in account
    pub session: Loadable<User>,
    /// Bearer token of the current session
    pub token: Option<String>,
    /// Id of the signed-in account
    pub user_id: Option<UserId>,
    /// Inline error for the sign-in form
    pub error: Option<String>,
}

impl AuthState {
    /// Whether a session token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Signed-in account, once loaded.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.session.value()
    }
}

/// Auth actions.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    /// Pick up a session persisted by an earlier run
    Restore,
    /// Persisted session values were read
    Restored {
        /// Stored bearer token
        token: Option<String>,
        /// Stored account id
        user_id: Option<UserId>,
    },
    /// Phone input changed
    SetPhone(String),
    /// Ask the identity provider for a code
    RequestOtp,
    /// Code was sent
    OtpSent(OtpChallenge),
    /// Code could not be sent
    OtpFailed(ApiFailure),
    /// Submit the received code
    VerifyOtp {
        /// Code typed by the customer
        code: String,
    },
    /// Account is ready
    SignedIn {
        /// Backend account
        user: User,
        /// Identity token, used as bearer when the backend issues none
        identity_token: String,
    },
    /// Verification or registration failed
    SignInFailed(ApiFailure),
    /// Restored account arrived
    UserLoaded(User),
    /// Restored account could not be fetched
    RestoreFailed(ApiFailure),
    /// Account changed elsewhere (e.g. profile saved during booking)
    UserUpdated(User),
    /// Sign out
    Logout,
    /// Backend rejected the session token
    SessionExpired,
}

impl AuthAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::OtpFailed(failure) | Self::SignInFailed(failure) | Self::RestoreFailed(failure) => {
                Some(failure)
            },
            _ => None,
        }
    }
}

/// Auth reducer.
#[derive(Debug, Clone, Copy)]
pub struct AuthReducer<B, I> {
    _env: PhantomData<fn() -> (B, I)>,
}

impl<B, I> AuthReducer<B, I> {
    /// Create a new auth reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _env: PhantomData }
    }
}

impl<B, I> Default for AuthReducer<B, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, I> AuthReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    fn clear_session(state: &mut AuthState, env: &AppEnvironment<B, I>) -> Effect<AuthAction> {
        *state = AuthState::default();
        let storage = env.storage.clone();
        let backend = env.backend.clone();
        Effect::future(async move {
            backend.set_session_token(None);
            storage.remove(TOKEN_KEY);
            storage.remove(USER_ID_KEY);
            None
        })
    }
}

impl<B, I> Reducer for AuthReducer<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AppEnvironment<B, I>;

    #[allow(clippy::too_many_lines)] // One arm per step of the sign-in flow
    fn reduce(
        &self,
        state: &mut AuthState,
        action: AuthAction,
        env: &AppEnvironment<B, I>,
    ) -> SmallVec<[Effect<AuthAction>; 4]> {
        match action {
            AuthAction::Restore => smallvec![read_effect(&env.storage, |storage| {
                AuthAction::Restored {
                    token: storage.get(TOKEN_KEY),
                    user_id: storage.get(USER_ID_KEY).map(UserId::new),
                }
            })],

            AuthAction::Restored { token, user_id } => {
                if state.is_authenticated() {
                    tracing::debug!("Ignoring persisted session, already signed in");
                    return smallvec![Effect::None];
                }
                match (token, user_id) {
                    (Some(token), Some(user_id)) => {
                        tracing::debug!(user_id = %user_id, "Restoring session");
                        state.token = Some(token.clone());
                        state.user_id = Some(user_id.clone());
                        state.session = Loadable::Pending;

                        let backend = env.backend.clone();
                        smallvec![request_effect(
                            async move {
                                backend.set_session_token(Some(token));
                                backend.user_by_id(&user_id).await
                            },
                            AuthAction::UserLoaded,
                            AuthAction::RestoreFailed,
                        )]
                    },
                    (None, None) => smallvec![Effect::None],
                    // Half a session is no session
                    _ => smallvec![write_effect(&env.storage, |storage| {
                        storage.remove(TOKEN_KEY);
                        storage.remove(USER_ID_KEY);
                    })],
                }
            },

            AuthAction::SetPhone(input) => {
                let phone = sanitize_phone(&input);
                if phone != state.phone {
                    state.otp_sent_at = None;
                }
                state.phone = phone;
                state.error = None;
                smallvec![Effect::None]
            },

            AuthAction::RequestOtp => {
                if state.challenge.is_pending() {
                    return smallvec![Effect::None];
                }
                if state.phone.len() != 10 {
                    state.error = Some("Enter a 10 digit mobile number".to_string());
                    return smallvec![Effect::None];
                }

                let now = env.clock.now();
                if let Some(sent_at) = state.otp_sent_at {
                    let remaining = chrono::Duration::seconds(OTP_RESEND_COOLDOWN_SECS) - (now - sent_at);
                    if remaining > chrono::Duration::zero() {
                        state.error = Some(format!(
                            "Wait {} seconds before requesting another code",
                            remaining.num_seconds().max(1)
                        ));
                        return smallvec![Effect::None];
                    }
                }

                state.error = None;
                state.otp_sent_at = Some(now);
                state.challenge = Loadable::Pending;
                let identity = env.identity.clone();
                let phone = state.phone.clone();
                smallvec![request_effect(
                    async move { identity.send_otp(&phone).await },
                    AuthAction::OtpSent,
                    AuthAction::OtpFailed,
                )]
            },

            AuthAction::OtpSent(challenge) => {
                tracing::info!("Verification code sent");
                state.challenge = Loadable::Fulfilled(challenge);
                smallvec![Effect::None]
            },

            AuthAction::OtpFailed(failure) => {
                state.otp_sent_at = None;
                state.error = Some(failure.message.clone());
                state.challenge = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },

            AuthAction::VerifyOtp { code } => {
                if state.session.is_pending() {
                    return smallvec![Effect::None];
                }
                let Some(challenge) = state.challenge.value().cloned() else {
                    state.error = Some("Request a code first".to_string());
                    return smallvec![Effect::None];
                };
                let code: String = code.chars().filter(char::is_ascii_digit).collect();
                if code.is_empty() {
                    state.error = Some("Enter the code we sent you".to_string());
                    return smallvec![Effect::None];
                }

                state.error = None;
                state.session = Loadable::Pending;
                let identity = env.identity.clone();
                let backend = env.backend.clone();
                smallvec![request_effect(
                    async move {
                        let identity_token = identity
                            .verify_otp(&challenge, &code)
                            .await
                            .map_err(ApiFailure::from)?;
                        let request = RegisterUser {
                            phone: challenge.phone.clone(),
                            identity_token: identity_token.clone(),
                        };
                        let user = backend
                            .register_user(&request)
                            .await
                            .map_err(ApiFailure::from)?;
                        Ok::<_, ApiFailure>((user, identity_token))
                    },
                    |(user, identity_token)| AuthAction::SignedIn {
                        user,
                        identity_token
                    },
                    AuthAction::SignInFailed,
                )]
            },

            AuthAction::SignedIn {
                user,
                identity_token,
            } => {
                let token = user.token.clone().unwrap_or(identity_token);
                tracing::info!(user_id = %user.id, "Signed in");
                state.token = Some(token.clone());
                state.user_id = Some(user.id.clone());
                state.challenge = Loadable::Idle;
                state.error = None;

                let storage = env.storage.clone();
                let backend = env.backend.clone();
                let user_id = user.id.clone();
                state.session = Loadable::Fulfilled(user);
                smallvec![Effect::future(async move {
                    backend.set_session_token(Some(token.clone()));
                    storage.set(TOKEN_KEY, &token);
                    storage.set(USER_ID_KEY, user_id.as_str());
                    None
                })]
            },

            AuthAction::SignInFailed(failure) => {
                tracing::warn!(error = %failure, "Sign-in failed");
                state.error = Some(failure.message.clone());
                state.session = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },

            AuthAction::UserLoaded(user) | AuthAction::UserUpdated(user) => {
                if state.user_id.as_ref() == Some(&user.id) {
                    state.session = Loadable::Fulfilled(user);
                }
                smallvec![Effect::None]
            },

            AuthAction::RestoreFailed(failure) => {
                tracing::warn!(error = %failure, "Failed to restore session");
                state.session = Loadable::Rejected(failure);
                smallvec![Effect::None]
            },

            AuthAction::Logout => {
                tracing::info!("Signed out");
                smallvec![Self::clear_session(state, env)]
            },

            AuthAction::SessionExpired => {
                tracing::warn!("Session expired");
                let effect = Self::clear_session(state, env);
                state.error = Some(SESSION_EXPIRED.to_string());
                smallvec![effect]
            },
        }
    }
}
