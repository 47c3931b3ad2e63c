//! In-memory backend and identity provider for tests.
//!
//! The mock backend keeps its data behind an `Arc<Mutex<_>>`, so clones
//! handed to the store share state with the handle the test keeps.

use crate::environment::{AppEnvironment, Backend, IdentityProvider, OtpChallenge};
use crate::error::IdentityError;
use crate::storage::{KeyValueStore, MemoryStore};
use cyclecare_api::{
    ApiError, City, ContactDetails, Customer, LandingContent, Order, OrderForm, OrderId,
    RegisterUser, Service, ServiceId, User, UserId,
};
use cyclecare_core::environment::{Clock, SystemClock};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default)]
struct BackendData {
    cities: Vec<City>,
    services: Vec<Service>,
    landing: LandingContent,
    contact: Option<ContactDetails>,
    orders: BTreeMap<OrderId, Order>,
    users: HashMap<UserId, User>,
    failures: HashMap<&'static str, ApiError>,
    calls: Vec<&'static str>,
    forms: Vec<OrderForm>,
    token: Option<String>,
    next_id: u32,
}

/// Mock backend.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    data: Arc<Mutex<BackendData>>,
}

impl MockBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, BackendData> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Serve these cities.
    #[must_use]
    pub fn with_cities(self, cities: Vec<City>) -> Self {
        self.data().cities = cities;
        self
    }

    /// Serve these services.
    #[must_use]
    pub fn with_services(self, services: Vec<Service>) -> Self {
        self.data().services = services;
        self
    }

    /// Serve this landing content and contact card.
    #[must_use]
    pub fn with_content(self, landing: LandingContent, contact: ContactDetails) -> Self {
        {
            let mut data = self.data();
            data.landing = landing;
            data.contact = Some(contact);
        }
        self
    }

    /// Store an order.
    #[must_use]
    pub fn with_order(self, order: Order) -> Self {
        self.data().orders.insert(order.id.clone(), order);
        self
    }

    /// Store an account.
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.data().users.insert(user.id.clone(), user);
        self
    }

    /// Make `operation` fail with `error` until cleared.
    pub fn fail(&self, operation: &'static str, error: ApiError) {
        self.data().failures.insert(operation, error);
    }

    /// Let `operation` succeed again.
    pub fn clear_failure(&self, operation: &'static str) {
        self.data().failures.remove(operation);
    }

    /// Operations called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.data().calls.clone()
    }

    /// How many times `operation` was called.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.data().calls.iter().filter(|c| **c == operation).count()
    }

    /// Multipart submissions received by `create_order`.
    #[must_use]
    pub fn submitted_forms(&self) -> Vec<OrderForm> {
        self.data().forms.clone()
    }

    /// Session token most recently set.
    #[must_use]
    pub fn session_token(&self) -> Option<String> {
        self.data().token.clone()
    }

    /// Stored account.
    #[must_use]
    pub fn user(&self, id: &UserId) -> Option<User> {
        self.data().users.get(id).cloned()
    }

    /// Stored order.
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.data().orders.get(id).cloned()
    }

    fn call<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut BackendData) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let mut data = self.data();
        data.calls.push(operation);
        if let Some(error) = data.failures.get(operation) {
            return Err(error.clone());
        }
        f(&mut data)
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl Backend for MockBackend {
    fn set_session_token(&self, token: Option<String>) {
        self.data().token = token;
    }

    fn list_cities(&self) -> impl Future<Output = ApiResult<Vec<City>>> + Send {
        let result = self.call("list_cities", |data| Ok(data.cities.clone()));
        async move { result }
    }

    fn landing_content(&self) -> impl Future<Output = ApiResult<LandingContent>> + Send {
        let result = self.call("landing_content", |data| Ok(data.landing.clone()));
        async move { result }
    }

    fn contact_details(&self) -> impl Future<Output = ApiResult<ContactDetails>> + Send {
        let result = self.call("contact_details", |data| {
            data.contact.clone().ok_or_else(|| not_found("Contact details"))
        });
        async move { result }
    }

    fn list_services(&self) -> impl Future<Output = ApiResult<Vec<Service>>> + Send {
        let result = self.call("list_services", |data| Ok(data.services.clone()));
        async move { result }
    }

    fn service_by_id(&self, id: &ServiceId) -> impl Future<Output = ApiResult<Service>> + Send {
        let result = self.call("service_by_id", |data| {
            data.services
                .iter()
                .find(|s| &s.id == id)
                .cloned()
                .ok_or_else(|| not_found("Service"))
        });
        async move { result }
    }

    fn create_order(&self, form: OrderForm) -> impl Future<Output = ApiResult<Order>> + Send {
        let result = self.call("create_order", |data| {
            data.next_id += 1;
            let order = Order {
                id: OrderId::new(format!("ord-{}", data.next_id)),
                customer: None,
                cycles: Vec::new(),
                service: None,
                status: Some("pending".to_string()),
                activity: Vec::new(),
                created_at: None,
                updated_at: None,
            };
            data.forms.push(form);
            data.orders.insert(order.id.clone(), order.clone());
            Ok(order)
        });
        async move { result }
    }

    fn orders_by_user(&self, user_id: &UserId) -> impl Future<Output = ApiResult<Vec<Order>>> + Send {
        let result = self.call("orders_by_user", |data| {
            if data.users.contains_key(user_id) {
                Ok(data.orders.values().cloned().collect())
            } else {
                Err(not_found("User"))
            }
        });
        async move { result }
    }

    fn order_by_id(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send {
        let result = self.call("order_by_id", |data| {
            data.orders.get(id).cloned().ok_or_else(|| not_found("Order"))
        });
        async move { result }
    }

    fn cancel_order(&self, id: &OrderId) -> impl Future<Output = ApiResult<Order>> + Send {
        let result = self.call("cancel_order", |data| {
            let order = data.orders.get_mut(id).ok_or_else(|| not_found("Order"))?;
            order.status = Some("cancelled".to_string());
            Ok(order.clone())
        });
        async move { result }
    }

    fn register_user(&self, request: &RegisterUser) -> impl Future<Output = ApiResult<User>> + Send {
        let result = self.call("register_user", |data| {
            if let Some(user) = data.users.values().find(|u| u.phone == request.phone) {
                return Ok(user.clone());
            }
            data.next_id += 1;
            let user = User {
                id: UserId::new(format!("user-{}", data.next_id)),
                phone: request.phone.clone(),
                name: None,
                email: None,
                customer: None,
                token: Some(format!("session-{}", request.phone)),
            };
            data.users.insert(user.id.clone(), user.clone());
            Ok(user)
        });
        async move { result }
    }

    fn user_by_id(&self, id: &UserId) -> impl Future<Output = ApiResult<User>> + Send {
        let result = self.call("user_by_id", |data| {
            data.users.get(id).cloned().ok_or_else(|| not_found("User"))
        });
        async move { result }
    }

    fn update_customer(
        &self,
        id: &UserId,
        customer: &Customer,
    ) -> impl Future<Output = ApiResult<User>> + Send {
        let result = self.call("update_customer", |data| {
            let user = data.users.get_mut(id).ok_or_else(|| not_found("User"))?;
            user.customer = Some(customer.clone());
            Ok(user.clone())
        });
        async move { result }
    }
}

/// Mock identity provider.
///
/// Accepts a single fixed code for every challenge it issued.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    code: String,
    issued: Arc<Mutex<HashMap<String, String>>>,
}

impl MockIdentityProvider {
    /// Code accepted by [`Self::default`].
    pub const DEFAULT_CODE: &'static str = "123456";

    /// Accept `code` for every challenge.
    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            issued: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn issued(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.issued.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::with_code(Self::DEFAULT_CODE)
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn send_otp(&self, phone: &str) -> impl Future<Output = Result<OtpChallenge, IdentityError>> + Send {
        let result = if phone.len() == 10 {
            let verification_id = format!("vrf-{:08x}", rand::thread_rng().r#gen::<u32>());
            self.issued().insert(verification_id.clone(), phone.to_string());
            Ok(OtpChallenge {
                verification_id,
                phone: phone.to_string(),
            })
        } else {
            Err(IdentityError::SendFailed {
                phone: phone.to_string(),
            })
        };
        async move { result }
    }

    fn verify_otp(
        &self,
        challenge: &OtpChallenge,
        code: &str,
    ) -> impl Future<Output = Result<String, IdentityError>> + Send {
        let result = if code != self.code {
            Err(IdentityError::InvalidCode)
        } else {
            match self.issued().remove(&challenge.verification_id) {
                Some(phone) => Ok(format!("id-token-{phone}")),
                None => Err(IdentityError::ChallengeExpired),
            }
        };
        async move { result }
    }
}

/// Environment wired to fresh mocks and an in-memory store.
#[must_use]
pub fn test_environment() -> AppEnvironment<MockBackend, MockIdentityProvider> {
    environment_with(MockBackend::new(), Arc::new(MemoryStore::new()))
}

/// Environment around a prepared backend and store.
#[must_use]
pub fn environment_with(
    backend: MockBackend,
    storage: Arc<dyn KeyValueStore>,
) -> AppEnvironment<MockBackend, MockIdentityProvider> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    AppEnvironment::new(backend, MockIdentityProvider::default(), storage, clock)
}
