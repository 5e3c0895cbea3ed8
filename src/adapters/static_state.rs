use crate::core::LiveStateClient;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Replays captured getter output instead of querying devices.
///
/// The capture file is a JSON object keyed by device id, each holding the
/// payloads by getter name:
///
/// ```json
/// { "12": { "get_interfaces": { "Ethernet1": { "description": "", "mac_address": "" } } } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticLiveState {
    payloads: HashMap<u64, HashMap<String, Value>>,
}

impl StaticLiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, device_id: u64, method: &str, payload: Value) -> Self {
        self.payloads
            .entry(device_id)
            .or_default()
            .insert(method.to_string(), payload);
        self
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, Value>> = serde_json::from_str(content)?;

        let mut payloads = HashMap::with_capacity(raw.len());
        for (key, methods) in raw {
            let device_id = key
                .parse::<u64>()
                .map_err(|e| SyncError::InvalidConfigValueError {
                    field: "live_state_file".to_string(),
                    value: key.clone(),
                    reason: format!("device keys must be numeric ids: {}", e),
                })?;
            payloads.insert(device_id, methods);
        }

        Ok(Self { payloads })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

#[async_trait]
impl LiveStateClient for StaticLiveState {
    async fn fetch(&self, method: &str, device_id: u64) -> Result<Value> {
        self.payloads
            .get(&device_id)
            .and_then(|methods| methods.get(method))
            .cloned()
            .ok_or_else(|| SyncError::SnapshotError {
                method: method.to_string(),
                device: device_id,
                message: "no captured payload".to_string(),
            })
    }
}
