//! Marketing content endpoints

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{ContactDetails, LandingContent};

impl ApiClient {
    /// Landing page blocks
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn landing_content(&self) -> Result<LandingContent> {
        self.get("content/landing").await
    }

    /// Support contact details
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn contact_details(&self) -> Result<ContactDetails> {
        self.get("content/contact").await
    }
}
