use crate::adapters::http::NetBoxClient;
use crate::core::{Cable, Device, Interface, InventoryStore, NewInterface, Termination};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEVICES: &str = "/api/dcim/devices/";
const INTERFACES: &str = "/api/dcim/interfaces/";
const CABLES: &str = "/api/dcim/cables/";
const INTERFACE_TYPE: &str = "dcim.interface";

#[derive(Debug, Deserialize)]
struct NestedRef {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceRecord {
    id: u64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct InterfaceRecord {
    id: u64,
    device: NestedRef,
    name: String,
    #[serde(rename = "type")]
    kind: ChoiceValue,
    #[serde(default)]
    description: String,
    #[serde(default)]
    mac_address: Option<String>,
    #[serde(default)]
    cable: Option<NestedRef>,
}

impl From<InterfaceRecord> for Interface {
    fn from(record: InterfaceRecord) -> Self {
        Interface {
            id: record.id,
            device_id: record.device.id,
            device_name: record.device.name.unwrap_or_default(),
            name: record.name,
            kind: record.kind.value,
            description: record.description,
            mac_address: record.mac_address,
            cable: record.cable.map(|c| c.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TerminationRecord {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    device: Option<NestedRef>,
}

impl From<TerminationRecord> for Termination {
    fn from(record: TerminationRecord) -> Self {
        let (device_id, device_name) = match record.device {
            Some(device) => (device.id, device.name.unwrap_or_default()),
            None => (0, String::new()),
        };
        Termination {
            interface_id: record.id,
            interface_name: record.name,
            device_id,
            device_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CableRecord {
    id: u64,
    termination_a: TerminationRecord,
    termination_b: TerminationRecord,
}

impl From<CableRecord> for Cable {
    fn from(record: CableRecord) -> Self {
        Cable {
            id: record.id,
            a: record.termination_a.into(),
            b: record.termination_b.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct InterfaceCreate<'a> {
    device: u64,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    description: &'a str,
    mac_address: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DescriptionPatch<'a> {
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct CableCreate {
    termination_a_type: &'static str,
    termination_a_id: u64,
    termination_b_type: &'static str,
    termination_b_id: u64,
}

/// [`InventoryStore`] over the NetBox REST API.
#[derive(Debug, Clone)]
pub struct NetBoxStore {
    client: NetBoxClient,
}

impl NetBoxStore {
    pub fn new(client: NetBoxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InventoryStore for NetBoxStore {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        let records: Vec<DeviceRecord> = self.client.list(DEVICES, &[]).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| record.name.map(|name| Device { id: record.id, name }))
            .collect())
    }

    async fn find_device(&self, name: &str) -> Result<Option<Device>> {
        let records: Vec<DeviceRecord> = self
            .client
            .list(DEVICES, &[("name", name.to_string())])
            .await?;
        Ok(records.into_iter().find_map(|record| match record.name {
            Some(found) if found == name => Some(Device {
                id: record.id,
                name: found,
            }),
            _ => None,
        }))
    }

    async fn list_interfaces(&self, device_id: u64) -> Result<Vec<Interface>> {
        let records: Vec<InterfaceRecord> = self
            .client
            .list(INTERFACES, &[("device_id", device_id.to_string())])
            .await?;
        Ok(records.into_iter().map(Interface::from).collect())
    }

    async fn find_interface(&self, device_id: u64, name: &str) -> Result<Option<Interface>> {
        let records: Vec<InterfaceRecord> = self
            .client
            .list(
                INTERFACES,
                &[("device_id", device_id.to_string()), ("name", name.to_string())],
            )
            .await?;
        Ok(records
            .into_iter()
            .find(|record| record.name == name)
            .map(Interface::from))
    }

    async fn create_interface(&self, interface: NewInterface) -> Result<Interface> {
        let body = InterfaceCreate {
            device: interface.device_id,
            name: &interface.name,
            kind: &interface.kind,
            description: &interface.description,
            mac_address: interface.mac_address.as_deref(),
        };
        let record: InterfaceRecord = self.client.post(INTERFACES, &body).await?;
        Ok(record.into())
    }

    async fn update_description(&self, interface_id: u64, description: &str) -> Result<()> {
        self.client
            .patch(
                &format!("{}{}/", INTERFACES, interface_id),
                &DescriptionPatch { description },
            )
            .await
    }

    async fn get_cable(&self, cable_id: u64) -> Result<Option<Cable>> {
        let record: Option<CableRecord> = self
            .client
            .get_optional(&format!("{}{}/", CABLES, cable_id))
            .await?;
        Ok(record.map(Cable::from))
    }

    async fn create_cable(&self, a: &Interface, b: &Interface) -> Result<Cable> {
        let body = CableCreate {
            termination_a_type: INTERFACE_TYPE,
            termination_a_id: a.id,
            termination_b_type: INTERFACE_TYPE,
            termination_b_id: b.id,
        };
        let record: CableRecord = self.client.post(CABLES, &body).await?;
        Ok(record.into())
    }

    async fn delete_cable(&self, cable_id: u64) -> Result<()> {
        self.client.delete(&format!("{}{}/", CABLES, cable_id)).await
    }
}
