//! Service catalog endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{Service, ServiceId};

impl ApiClient {
    /// Full service catalog, including inactive entries
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        self.get("services").await
    }

    /// One service by id
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 404 if the service does not exist
    pub async fn service_by_id(&self, id: &ServiceId) -> Result<Service> {
        self.get(&format!("services/{id}")).await
    }
}
