//! # CycleCare Storefront
//!
//! Client-side state and business logic of the CycleCare doorstep bicycle
//! maintenance storefront: phone sign-in, city selection, the service
//! catalog, the booking wizard and order tracking.
//!
//! Everything is driven through a single [`cyclecare_runtime::Store`] holding
//! an [`app::AppState`]. Views send [`app::AppAction`]s; the
//! [`app::AppReducer`] folds them into state and describes backend calls as
//! effects.
//!
//! ## Example
//!
//! ```no_run
//! use cyclecare_api::ApiClient;
//! use cyclecare_core::environment::SystemClock;
//! use cyclecare_runtime::Store;
//! use cyclecare_storefront::app::{AppAction, AppReducer, AppState};
//! use cyclecare_storefront::environment::{AppEnvironment, NoIdentityProvider};
//! use cyclecare_storefront::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let env = AppEnvironment::new(
//!     ApiClient::new("https://api.cyclecare.in"),
//!     NoIdentityProvider,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SystemClock),
//! );
//! let store = Store::new(AppState::default(), AppReducer::new(), env);
//!
//! store.send(AppAction::Boot).await?.wait().await;
//! let cities = store.state(|s| s.city.cities.value().map(Vec::len)).await;
//! println!("{cities:?} cities");
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod booking;
pub mod city_gate;
pub mod config;
pub mod environment;
pub mod error;
pub mod mocks;
pub mod request;
pub mod slices;
pub mod status;
pub mod storage;
pub mod validation;

pub use app::{AppAction, AppReducer, AppState};
pub use config::{AppConfig, ConfigError};
pub use environment::{AppEnvironment, Backend, IdentityProvider};
pub use error::{ApiFailure, FailureKind, IdentityError, StorageError};
pub use status::{normalize_status, NormalizedStatus, OrderStatus, StatusSource};
