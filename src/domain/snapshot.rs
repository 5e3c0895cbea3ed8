//! Typed views over raw NAPALM getter payloads.

use crate::domain::model::{InterfaceSnapshot, NeighborRecord};
use crate::utils::error::{Result, SyncError};
use serde_json::Value;

pub const GET_INTERFACES: &str = "get_interfaces";
pub const GET_LLDP_NEIGHBORS: &str = "get_lldp_neighbors";

fn malformed(method: &str, device_id: u64, message: impl Into<String>) -> SyncError {
    SyncError::SnapshotError {
        method: method.to_string(),
        device: device_id,
        message: message.into(),
    }
}

/// Parses a `get_interfaces` payload, keeping the order the device reported.
pub fn parse_interfaces(device_id: u64, payload: &Value) -> Result<Vec<InterfaceSnapshot>> {
    let entries = payload
        .as_object()
        .ok_or_else(|| malformed(GET_INTERFACES, device_id, "expected an object keyed by interface name"))?;

    let mut interfaces = Vec::with_capacity(entries.len());
    for (name, fields) in entries {
        let description = match fields.get("description") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) => String::new(),
            Some(other) => {
                return Err(malformed(
                    GET_INTERFACES,
                    device_id,
                    format!("description of {} is not a string: {}", name, other),
                ))
            }
            None => {
                return Err(malformed(
                    GET_INTERFACES,
                    device_id,
                    format!("interface {} has no description field", name),
                ))
            }
        };

        let mac_address = match fields.get("mac_address") {
            Some(Value::String(mac)) => Some(mac.clone()),
            Some(Value::Null) => None,
            Some(other) => {
                return Err(malformed(
                    GET_INTERFACES,
                    device_id,
                    format!("mac_address of {} is not a string: {}", name, other),
                ))
            }
            None => {
                return Err(malformed(
                    GET_INTERFACES,
                    device_id,
                    format!("interface {} has no mac_address field", name),
                ))
            }
        };

        interfaces.push(InterfaceSnapshot {
            name: name.clone(),
            description,
            mac_address,
        });
    }

    Ok(interfaces)
}

/// Parses a `get_lldp_neighbors` payload. Only the first neighbor of each
/// local interface is considered; interfaces with an empty neighbor list are
/// dropped.
pub fn parse_neighbors(device_id: u64, payload: &Value) -> Result<Vec<NeighborRecord>> {
    let entries = payload
        .as_object()
        .ok_or_else(|| malformed(GET_LLDP_NEIGHBORS, device_id, "expected an object keyed by local interface"))?;

    let mut neighbors = Vec::with_capacity(entries.len());
    for (local_interface, remotes) in entries {
        let remotes = remotes.as_array().ok_or_else(|| {
            malformed(
                GET_LLDP_NEIGHBORS,
                device_id,
                format!("neighbors of {} are not a list", local_interface),
            )
        })?;

        let Some(first) = remotes.first() else {
            tracing::debug!("No LLDP neighbor reported on {}", local_interface);
            continue;
        };

        // A null name is kept as unresolvable; a missing or non-string one
        // means the payload is not what the getter returns.
        let field = |key: &str| match first.get(key) {
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(Value::Null) => Ok(None),
            Some(other) => Err(malformed(
                GET_LLDP_NEIGHBORS,
                device_id,
                format!("{} of the neighbor on {} is not a string: {}", key, local_interface, other),
            )),
            None => Err(malformed(
                GET_LLDP_NEIGHBORS,
                device_id,
                format!("neighbor of {} has no {}", local_interface, key),
            )),
        };

        neighbors.push(NeighborRecord {
            local_interface: local_interface.clone(),
            remote_device: field("hostname")?,
            remote_interface: field("port")?,
        });
    }

    Ok(neighbors)
}
