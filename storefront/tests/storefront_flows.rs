//! End-to-end storefront flows
//!
//! Each test drives a real `Store` holding the full `AppState` against the
//! in-memory backend and identity provider, the way a view layer would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use chrono::{TimeZone, Utc};
use cyclecare_api::{ActivityEvent, ApiError, City, CityId, CycleType, Order, OrderId, UserId};
use cyclecare_runtime::Store;
use cyclecare_storefront::app::{AppAction, AppReducer, AppState};
use cyclecare_storefront::booking::{BookingAction, CustomerField, CycleEdit, WizardStep};
use cyclecare_storefront::environment::AppEnvironment;
use cyclecare_storefront::mocks::{environment_with, MockBackend, MockIdentityProvider};
use cyclecare_storefront::slices::auth::SESSION_EXPIRED;
use cyclecare_storefront::slices::{AuthAction, CityAction, NoticeLevel, OrderAction, Route, UiAction};
use cyclecare_storefront::status::OrderStatus;
use cyclecare_storefront::storage::{KeyValueStore, MemoryStore, CITY_ID_KEY, TOKEN_KEY, USER_ID_KEY};
use std::sync::Arc;

type TestStore = Store<
    AppState,
    AppAction,
    AppEnvironment<MockBackend, MockIdentityProvider>,
    AppReducer<MockBackend, MockIdentityProvider>,
>;

// ============================================================================
// Fixtures
// ============================================================================

fn city(id: u32, name: &str, pincodes: &[&str], serviceable: bool) -> City {
    City {
        id: CityId::new(id),
        name: name.to_string(),
        state: "Maharashtra".to_string(),
        country: "India".to_string(),
        pincodes: pincodes.iter().map(ToString::to_string).collect(),
        serviceable,
    }
}

fn cities() -> Vec<City> {
    vec![
        city(1, "Mumbai", &["400001"], true),
        city(3, "Pune", &["411057", "411001"], true),
        city(7, "Nashik", &["422001"], false),
    ]
}

fn store_with(backend: &MockBackend, storage: &Arc<MemoryStore>) -> TestStore {
    let storage: Arc<dyn KeyValueStore> = storage.clone();
    Store::new(
        AppState::default(),
        AppReducer::new(),
        environment_with(backend.clone(), storage),
    )
}

async fn send(store: &TestStore, action: AppAction) {
    store.send(action).await.unwrap().wait().await;
}

async fn sign_in(store: &TestStore, phone: &str) {
    send(store, AppAction::Auth(AuthAction::SetPhone(phone.to_string()))).await;
    send(store, AppAction::Auth(AuthAction::RequestOtp)).await;
    send(
        store,
        AppAction::Auth(AuthAction::VerifyOtp {
            code: MockIdentityProvider::DEFAULT_CODE.to_string(),
        }),
    )
    .await;
}

async fn set_field(store: &TestStore, field: CustomerField, value: &str) {
    send(
        store,
        AppAction::Booking(BookingAction::SetField {
            field,
            value: value.to_string(),
        }),
    )
    .await;
}

// ============================================================================
// City selection
// ============================================================================

#[tokio::test(start_paused = true)]
async fn confirmed_city_is_restored_without_popup() {
    let backend = MockBackend::new().with_cities(cities());
    let storage = Arc::new(MemoryStore::new());

    let store = store_with(&backend, &storage);
    send(&store, AppAction::Boot).await;
    assert!(store.state(|s| s.city.popup_open).await, "first visit asks for a city");

    send(&store, AppAction::City(CityAction::Highlight { id: CityId::new(3) })).await;
    send(&store, AppAction::City(CityAction::Confirm)).await;
    assert_eq!(storage.get(CITY_ID_KEY).as_deref(), Some("3"));

    let reloaded = store_with(&backend, &storage);
    send(&reloaded, AppAction::Boot).await;
    reloaded
        .state(|s| {
            assert!(!s.city.popup_open);
            assert_eq!(s.city.selected_city().map(|c| c.name.as_str()), Some("Pune"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn stale_stored_city_reopens_popup() {
    let backend = MockBackend::new().with_cities(cities());
    let storage = Arc::new(MemoryStore::with_entries([(CITY_ID_KEY, "99")]));

    let store = store_with(&backend, &storage);
    send(&store, AppAction::Boot).await;

    store
        .state(|s| {
            assert!(s.city.popup_open);
            assert_eq!(s.city.selected, None);
        })
        .await;
}

// ============================================================================
// Booking
// ============================================================================

#[tokio::test(start_paused = true)]
async fn pincode_fills_city_details() {
    let backend = MockBackend::new().with_cities(cities());
    let store = store_with(&backend, &Arc::new(MemoryStore::new()));

    send(&store, AppAction::Boot).await;
    set_field(&store, CustomerField::Pincode, "411057").await;

    store
        .state(|s| {
            let booking = &s.booking;
            assert_eq!(booking.customer.city, Some(CityId::new(3)));
            let info = booking.city_info.as_ref().unwrap();
            assert_eq!(info.name, "Pune");
            assert_eq!(info.state, "Maharashtra");
            assert_eq!(info.country, "India");
            assert_eq!(booking.area_warning, None);
        })
        .await;

    set_field(&store, CustomerField::Pincode, "422001").await;
    store
        .state(|s| {
            assert_eq!(s.booking.customer.city, Some(CityId::new(7)));
            assert!(s.booking.area_warning.is_some(), "non-serviceable city only warns");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn booking_runs_from_sign_in_to_confirmation() {
    let backend = MockBackend::new().with_cities(cities());
    let storage = Arc::new(MemoryStore::new());
    let store = store_with(&backend, &storage);

    send(&store, AppAction::Boot).await;
    sign_in(&store, "98765 43210").await;

    let user = store.state(|s| s.auth.user().cloned()).await.expect("signed in");
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("session-9876543210"));
    assert_eq!(storage.get(USER_ID_KEY).as_deref(), Some(user.id.as_str()));

    send(
        &store,
        AppAction::Booking(BookingAction::Start {
            user: Some(user.clone()),
            service: None,
        }),
    )
    .await;
    assert_eq!(store.state(|s| s.booking.customer.phone.clone()).await, "9876543210");

    set_field(&store, CustomerField::FirstName, "Asha").await;
    set_field(&store, CustomerField::LastName, "Kulkarni").await;
    set_field(&store, CustomerField::Email, "asha@example.com").await;
    set_field(&store, CustomerField::AddressLine1, "12 MG Road").await;
    set_field(&store, CustomerField::Pincode, "411057").await;

    // A nine-digit phone blocks the step
    set_field(&store, CustomerField::Phone, "987654321").await;
    send(&store, AppAction::Booking(BookingAction::Next)).await;
    store
        .state(|s| {
            assert_eq!(s.booking.step, WizardStep::CustomerDetails);
            assert_eq!(
                s.booking.errors.get("phone"),
                Some("Phone number must be exactly 10 digits")
            );
        })
        .await;
    assert_eq!(backend.call_count("update_customer"), 0);

    set_field(&store, CustomerField::Phone, "9876543210").await;
    send(&store, AppAction::Booking(BookingAction::Next)).await;
    assert_eq!(store.state(|s| s.booking.step).await, WizardStep::CycleDetails);
    let saved = backend.user(&user.id).and_then(|u| u.customer).unwrap();
    assert_eq!(saved.first_name, "Asha");
    assert_eq!(
        store
            .state(|s| s.auth.user().and_then(|u| u.customer.clone()))
            .await
            .map(|c| c.pincode),
        Some("411057".to_string()),
        "account picks up the saved profile"
    );

    send(
        &store,
        AppAction::Booking(BookingAction::EditCycle {
            index: 0,
            edit: CycleEdit::Brand("Hero Sprint".to_string()),
        }),
    )
    .await;
    send(
        &store,
        AppAction::Booking(BookingAction::EditCycle {
            index: 0,
            edit: CycleEdit::Type(CycleType::Gear),
        }),
    )
    .await;

    // Terms are reported even though the cycles are fine
    send(&store, AppAction::Booking(BookingAction::Next)).await;
    store
        .state(|s| {
            assert_eq!(s.booking.step, WizardStep::CycleDetails);
            assert!(s.booking.errors.contains("terms"));
            assert_eq!(s.booking.errors.len(), 1);
        })
        .await;

    send(&store, AppAction::Booking(BookingAction::SetTermsAccepted(true))).await;
    send(&store, AppAction::Booking(BookingAction::Next)).await;

    let order_id = store
        .state(|s| {
            assert_eq!(s.booking.step, WizardStep::Confirmation);
            assert!(!s.booking.submitting);
            s.booking.created_order.clone()
        })
        .await
        .expect("order created");
    assert_eq!(
        store.state(|s| s.booking.tracking_route()).await,
        Some(Route::OrderTracking(order_id.clone()))
    );

    let forms = backend.submitted_forms();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].field("userId"), Some(user.id.as_str()));
    assert_eq!(forms[0].field("pincode"), Some("411057"));
    assert_eq!(forms[0].field("city"), Some("3"));

    // Confirmation is terminal
    send(&store, AppAction::Booking(BookingAction::Back)).await;
    assert_eq!(store.state(|s| s.booking.step).await, WizardStep::Confirmation);

    send(&store, AppAction::Ui(UiAction::Navigate(Route::OrderTracking(order_id)))).await;
    assert_eq!(
        store
            .state(|s| s.order.tracked.value().map(|v| v.status.status))
            .await,
        Some(OrderStatus::Pending)
    );
}

#[tokio::test(start_paused = true)]
async fn failed_submission_keeps_the_wizard() {
    let backend = MockBackend::new().with_cities(cities());
    let store = store_with(&backend, &Arc::new(MemoryStore::new()));

    send(&store, AppAction::Boot).await;
    sign_in(&store, "9876543210").await;
    let user = store.state(|s| s.auth.user().cloned()).await;
    send(&store, AppAction::Booking(BookingAction::Start { user, service: None })).await;

    set_field(&store, CustomerField::FirstName, "Asha").await;
    set_field(&store, CustomerField::LastName, "Kulkarni").await;
    set_field(&store, CustomerField::Email, "asha@example.com").await;
    set_field(&store, CustomerField::AddressLine1, "12 MG Road").await;
    set_field(&store, CustomerField::Pincode, "411001").await;

    backend.fail(
        "update_customer",
        ApiError::Api {
            status: 500,
            message: "Profile service unavailable".to_string(),
        },
    );
    send(&store, AppAction::Booking(BookingAction::Next)).await;

    store
        .state(|s| {
            assert_eq!(s.booking.step, WizardStep::CustomerDetails);
            assert!(!s.booking.submitting);
            assert_eq!(s.booking.error.as_deref(), Some("Profile service unavailable"));
            assert_eq!(s.booking.customer.first_name, "Asha");
            assert!(s.auth.is_authenticated(), "a 500 is not a session problem");
        })
        .await;
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rejected_session_logs_out_and_routes_to_login() {
    let backend = MockBackend::new().with_cities(cities());
    backend.fail("user_by_id", ApiError::Unauthorized);
    let storage = Arc::new(MemoryStore::with_entries([
        (TOKEN_KEY, "expired-token"),
        (USER_ID_KEY, "user-1"),
    ]));

    let store = store_with(&backend, &storage);
    send(&store, AppAction::Boot).await;

    store
        .state(|s| {
            assert!(!s.auth.is_authenticated());
            assert_eq!(s.auth.error.as_deref(), Some(SESSION_EXPIRED));
            assert_eq!(s.ui.route, Route::Login);
            assert!(s
                .ui
                .notices
                .iter()
                .any(|n| n.level == NoticeLevel::Error && n.message == SESSION_EXPIRED));
        })
        .await;
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert_eq!(storage.get(USER_ID_KEY), None);
    assert_eq!(backend.session_token(), None);
}

#[tokio::test(start_paused = true)]
async fn restored_session_lists_orders_on_account_page() {
    let placed = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let order = Order {
        id: OrderId::new("ord-1"),
        customer: None,
        cycles: Vec::new(),
        service: None,
        status: None,
        activity: vec![
            ActivityEvent {
                kind: "mechanic_assigned".to_string(),
                timestamp: placed + chrono::Duration::hours(2),
                actor: Some("ops".to_string()),
            },
            ActivityEvent {
                kind: "order_created".to_string(),
                timestamp: placed,
                actor: None,
            },
        ],
        created_at: Some(placed),
        updated_at: None,
    };

    let backend = MockBackend::new().with_cities(cities()).with_order(order);
    let storage = Arc::new(MemoryStore::new());

    // Sign in once so the account exists, then come back in a new session
    let first = store_with(&backend, &storage);
    sign_in(&first, "9876543210").await;
    let user_id: UserId = first.state(|s| s.auth.user_id.clone()).await.unwrap();

    let store = store_with(&backend, &storage);
    send(&store, AppAction::Boot).await;
    assert_eq!(store.state(|s| s.auth.user_id.clone()).await, Some(user_id));

    send(&store, AppAction::Ui(UiAction::Navigate(Route::Account))).await;
    store
        .state(|s| {
            let orders = s.order.orders.value().unwrap();
            assert_eq!(orders.len(), 1);
            assert_eq!(orders[0].status.status, OrderStatus::Assigned);
            assert_eq!(orders[0].status.progress_index, 2);
        })
        .await;

    send(&store, AppAction::Order(OrderAction::Cancel { id: OrderId::new("ord-1") })).await;
    store
        .state(|s| {
            let orders = s.order.orders.value().unwrap();
            assert_eq!(orders[0].status.status, OrderStatus::Cancelled);
            assert_eq!(orders[0].status.progress_index, 2, "cancelled keeps the furthest step reached");
        })
        .await;
}
