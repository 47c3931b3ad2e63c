//! User and customer-profile endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{Customer, RegisterUser, User, UserId};
use reqwest::Method;

impl ApiClient {
    /// Register (or re-attach) the account for a verified phone number
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn register_user(&self, request: &RegisterUser) -> Result<User> {
        self.send_json(Method::POST, "users/register", request).await
    }

    /// Fetch an account by id
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn user_by_id(&self, id: &UserId) -> Result<User> {
        self.get(&format!("users/{id}")).await
    }

    /// Save the customer profile attached to an account
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn update_customer(&self, id: &UserId, customer: &Customer) -> Result<User> {
        self.send_json(Method::PUT, &format!("users/{id}/customer"), customer)
            .await
    }
}
