//! City endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::City;

impl ApiClient {
    /// List every city known to the backend
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn list_cities(&self) -> Result<Vec<City>> {
        self.get("cities").await
    }
}
