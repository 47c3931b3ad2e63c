//! Order endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{Order, OrderForm, OrderId, OrderUpdate, UserId};
use reqwest::Method;

impl ApiClient {
    /// Create an order from a multipart submission (customer fields, cycles, images)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn create_order(&self, form: OrderForm) -> Result<Order> {
        self.send_form("orders", form).await
    }

    /// All orders placed by a user
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        self.get(&format!("orders/user/{user_id}")).await
    }

    /// One order by id
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn order_by_id(&self, id: &OrderId) -> Result<Order> {
        self.get(&format!("orders/{id}")).await
    }

    /// Cancel an order; returns the updated order
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order> {
        self.send_json(Method::PATCH, &format!("orders/{id}/cancel"), &serde_json::json!({}))
            .await
    }

    /// Apply a partial update to an order
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn update_order(&self, id: &OrderId, update: &OrderUpdate) -> Result<Order> {
        self.send_json(Method::PATCH, &format!("orders/{id}"), update)
            .await
    }
}
