//! Key pair API client

use openapi_client::models::KeysResponse;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List SSH key pairs usable for a launch
    pub async fn get_keys(&self) -> Result<KeysResponse, ConsoleError> {
        self.get("/keys").await
    }
}
