//! Storefront environment.
//!
//! Everything a reducer's effects touch is injected through
//! [`AppEnvironment`]: the backend, the phone/OTP identity provider, persistent
//! storage and the clock.

use crate::error::IdentityError;
use crate::storage::KeyValueStore;
use cyclecare_api::{
    ApiClient, ApiError, City, ContactDetails, Customer, LandingContent, Order, OrderForm,
    OrderId, RegisterUser, Service, ServiceId, User, UserId,
};
use cyclecare_core::environment::Clock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

/// Remote backend operations used by the storefront.
///
/// [`ApiClient`] is the production implementation; tests use
/// [`crate::mocks::MockBackend`].
pub trait Backend: Clone + Send + Sync + 'static {
    /// Replace (or clear) the session token attached to requests.
    fn set_session_token(&self, token: Option<String>);

    /// All cities.
    fn list_cities(&self) -> impl Future<Output = ApiResult<Vec<City>>> + Send;

    /// Landing page content blocks.
    fn landing_content(&self) -> impl Future<Output = ApiResult<LandingContent>> + Send;

    /// Support contact details.
    fn contact_details(&self) -> impl Future<Output = ApiResult<ContactDetails>> + Send;

    /// Service catalog.
    fn list_services(&self) -> impl Future<Output = ApiResult<Vec<Service>>> + Send;

    /// One service.
    fn service_by_id(&self, id: &ServiceId) -> impl Future<Output = ApiResult<Service>> + Send;

    /// Submit a booking.
    fn create_order(&self, form: OrderForm) -> impl Future<Output = ApiResult<Order>> + Send;

    /// Orders placed by a user.
    fn orders_by_user(&self, user_id: &UserId) -> impl Future<Output = ApiResult<Vec<Order>>> + Send;

    /// One order.
    fn order_by_id(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send;

    /// Cancel an order.
    fn cancel_order(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send;

    /// Register (or look up) the account for a verified phone.
    fn register_user(&self, request: &RegisterUser) -> impl Future<Output = ApiResult<User>> + Send;

    /// One account.
    fn user_by_id(&self, id: &UserId) -> impl Future<Output = ApiResult<User>> + Send;

    /// Save the customer profile of an account.
    fn update_customer(
        &self,
        id: &UserId,
        customer: &Customer,
    ) -> impl Future<Output = ApiResult<User>> + Send;
}

impl Backend for ApiClient {
    fn set_session_token(&self, token: Option<String>) {
        self.set_token(token);
    }

    fn list_cities(&self) -> impl Future<Output = ApiResult<Vec<City>>> + Send {
        ApiClient::list_cities(self)
    }

    fn landing_content(&self) -> impl Future<Output = ApiResult<LandingContent>> + Send {
        ApiClient::landing_content(self)
    }

    fn contact_details(&self) -> impl Future<Output = ApiResult<ContactDetails>> + Send {
        ApiClient::contact_details(self)
    }

    fn list_services(&self) -> impl Future<Output = ApiResult<Vec<Service>>> + Send {
        ApiClient::list_services(self)
    }

    fn service_by_id(&self, id: &ServiceId) -> impl Future<Output = ApiResult<Service>> + Send {
        ApiClient::service_by_id(self, id)
    }

    fn create_order(&self, form: OrderForm) -> impl Future<Output = ApiResult<Order>> + Send {
        ApiClient::create_order(self, form)
    }

    fn orders_by_user(&self, user_id: &UserId) -> impl Future<Output = ApiResult<Vec<Order>>> + Send {
        ApiClient::orders_by_user(self, user_id)
    }

    fn order_by_id(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send {
        ApiClient::order_by_id(self, id)
    }

    fn cancel_order(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send {
        ApiClient::cancel_order(self, id)
    }

    fn register_user(&self, request: &RegisterUser) -> impl Future<Output = ApiResult<User>> + Send {
        ApiClient::register_user(self, request)
    }

    fn user_by_id(&self, id: &UserId) -> impl Future<Output = ApiResult<User>> + Send {
        ApiClient::user_by_id(self, id)
    }

    fn update_customer(
        &self,
        id: &UserId,
        customer: &Customer,
    ) -> impl Future<Output = ApiResult<User>> + Send {
        ApiClient::update_customer(self, id, customer)
    }
}

/// Pending one-time-code challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    /// Provider-side verification handle
    pub verification_id: String,
    /// Number the code was sent to
    pub phone: String,
}

/// External phone/OTP identity provider.
///
/// SMS delivery and code checking live entirely with the provider; the
/// storefront only exchanges a verified code for an identity token.
pub trait IdentityProvider: Clone + Send + Sync + 'static {
    /// Send a one-time code to `phone`.
    fn send_otp(&self, phone: &str) -> impl Future<Output = Result<OtpChallenge, IdentityError>> + Send;

    /// Check `code` against `challenge`; returns an identity token.
    fn verify_otp(
        &self,
        challenge: &OtpChallenge,
        code: &str,
    ) -> impl Future<Output = Result<String, IdentityError>> + Send;
}

/// Identity provider for contexts without phone sign-in, such as the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentityProvider;

impl IdentityProvider for NoIdentityProvider {
    async fn send_otp(&self, _phone: &str) -> Result<OtpChallenge, IdentityError> {
        Err(IdentityError::Unavailable)
    }

    async fn verify_otp(&self, _challenge: &OtpChallenge, _code: &str) -> Result<String, IdentityError> {
        Err(IdentityError::Unavailable)
    }
}

/// Storefront environment.
///
/// # Type Parameters
///
/// - `B`: Backend
/// - `I`: Identity provider
#[derive(Clone)]
pub struct AppEnvironment<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    /// Remote backend.
    pub backend: B,

    /// Phone/OTP identity provider.
    pub identity: I,

    /// Persistent key-value storage.
    pub storage: Arc<dyn KeyValueStore>,

    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl<B, I> AppEnvironment<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    /// Create a new storefront environment.
    #[must_use]
    pub fn new(
        backend: B,
        identity: I,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            identity,
            storage,
            clock,
        }
    }
}

impl<B, I> std::fmt::Debug for AppEnvironment<B, I>
where
    B: Backend,
    I: IdentityProvider,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment").finish_non_exhaustive()
    }
}
