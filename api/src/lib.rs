//! # CycleCare API Client
//!
//! Typed client for the CycleCare backend REST API.
//!
//! ## Example
//!
//! ```no_run
//! use cyclecare_api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new("https://api.example.com/v1");
//!     client.set_token(Some("session-token".to_string()));
//!
//!     for city in client.list_cities().await? {
//!         println!("{} ({})", city.name, city.state);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bearer token attached automatically once set
//! - HTTP 401 clears the token and surfaces `ApiError::Unauthorized`
//! - `{ "data": ... }` envelopes are unwrapped transparently
//! - Multipart order creation with image uploads

pub mod cities;
pub mod client;
pub mod content;
pub mod error;
pub mod orders;
pub mod services;
pub mod types;
pub mod users;

// Re-export main types for convenience
pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    ActivityEvent, City, CityId, ContactDetails, ContentBlock, Customer, Cycle, CycleId,
    CycleType, FormFile, LandingContent, Order, OrderForm, OrderId, OrderUpdate, RegisterUser,
    Service, ServiceId, ServicePrices, User, UserId,
};
