use crate::adapters::http::NetBoxClient;
use crate::core::LiveStateClient;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use serde_json::Value;

/// Live state through NetBox's NAPALM proxy,
/// `GET /api/dcim/devices/{id}/napalm/?method=<getter>`.
#[derive(Debug, Clone)]
pub struct NapalmClient {
    client: NetBoxClient,
}

impl NapalmClient {
    pub fn new(client: NetBoxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LiveStateClient for NapalmClient {
    async fn fetch(&self, method: &str, device_id: u64) -> Result<Value> {
        let path = format!("/api/dcim/devices/{}/napalm/", device_id);
        let mut response: Value = self
            .client
            .get(&path, &[("method", method.to_string())])
            .await?;

        let payload = response
            .get_mut(method)
            .map(Value::take)
            .ok_or_else(|| SyncError::SnapshotError {
                method: method.to_string(),
                device: device_id,
                message: "response does not contain the requested getter".to_string(),
            })?;

        // NetBox reports driver failures inside the payload with a 200.
        if let Some(error) = payload.get("error").and_then(Value::as_str) {
            return Err(SyncError::SnapshotError {
                method: method.to_string(),
                device: device_id,
                message: error.to_string(),
            });
        }

        Ok(payload)
    }
}
