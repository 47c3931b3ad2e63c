//! State slices of the storefront.
//!
//! Each slice owns its state, action enum and reducer. The root reducer in
//! [`crate::app`] routes actions to them.

pub mod auth;
pub mod city;
pub mod content;
pub mod order;
pub mod services;
pub mod ui;

pub use auth::{AuthAction, AuthReducer, AuthState};
pub use city::{CityAction, CityReducer, CityState};
pub use content::{ContentAction, ContentReducer, ContentState};
pub use order::{OrderAction, OrderReducer, OrderState, OrderView};
pub use services::{ServicesAction, ServicesReducer, ServicesState};
pub use ui::{Notice, NoticeLevel, Route, UiAction, UiReducer, UiState};
