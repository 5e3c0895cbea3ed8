use crate::core::{Cable, Device, Interface, InventoryStore, NewInterface, Termination};
use crate::domain::model::DEFAULT_INTERFACE_TYPE;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    devices: Vec<Device>,
    interfaces: Vec<Interface>,
    cables: Vec<Cable>,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn device(&self, device_id: u64) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    fn interface(&self, interface_id: u64) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.id == interface_id)
    }

    fn insert_interface(&mut self, new: NewInterface) -> Result<Interface> {
        let device_name = self
            .device(new.device_id)
            .map(|d| d.name.clone())
            .ok_or_else(|| SyncError::NotFoundError {
                message: format!("device {}", new.device_id),
            })?;

        if self
            .interfaces
            .iter()
            .any(|i| i.device_id == new.device_id && i.name == new.name)
        {
            return Err(SyncError::ConflictError {
                message: format!("interface {} already exists on {}", new.name, device_name),
            });
        }

        let interface = Interface {
            id: self.allocate_id(),
            device_id: new.device_id,
            device_name,
            name: new.name,
            kind: new.kind,
            description: new.description,
            mac_address: new.mac_address,
            cable: None,
        };
        self.interfaces.push(interface.clone());
        Ok(interface)
    }

    fn insert_cable(&mut self, a_id: u64, b_id: u64) -> Result<Cable> {
        if a_id == b_id {
            return Err(SyncError::ConflictError {
                message: format!("interface {} cannot be cabled to itself", a_id),
            });
        }

        let mut ends = Vec::with_capacity(2);
        for interface_id in [a_id, b_id] {
            let interface = self.interface(interface_id).ok_or_else(|| SyncError::NotFoundError {
                message: format!("interface {}", interface_id),
            })?;
            if let Some(cable_id) = interface.cable {
                return Err(SyncError::ConflictError {
                    message: format!(
                        "interface {} ({}) already has cable {}",
                        interface.name, interface.device_name, cable_id
                    ),
                });
            }
            ends.push(Termination::of(interface));
        }

        let b = ends.pop().ok_or_else(|| SyncError::ConflictError {
            message: "cable needs two terminations".to_string(),
        })?;
        let a = ends.pop().ok_or_else(|| SyncError::ConflictError {
            message: "cable needs two terminations".to_string(),
        })?;

        let cable = Cable {
            id: self.allocate_id(),
            a,
            b,
        };
        for interface in self
            .interfaces
            .iter_mut()
            .filter(|i| i.id == a_id || i.id == b_id)
        {
            interface.cable = Some(cable.id);
        }
        self.cables.push(cable.clone());
        Ok(cable)
    }

    fn remove_cable(&mut self, cable_id: u64) -> Result<()> {
        let position = self
            .cables
            .iter()
            .position(|c| c.id == cable_id)
            .ok_or_else(|| SyncError::NotFoundError {
                message: format!("cable {}", cable_id),
            })?;
        self.cables.remove(position);

        for interface in self
            .interfaces
            .iter_mut()
            .filter(|i| i.cable == Some(cable_id))
        {
            interface.cable = None;
        }
        Ok(())
    }
}

/// Initial contents for an [`InMemoryStore`], addressed by names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySeed {
    #[serde(default)]
    pub devices: Vec<SeedDevice>,
    #[serde(default)]
    pub cables: Vec<SeedCable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDevice {
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<SeedInterface>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedInterface {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mac_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCable {
    pub a: SeedEndpoint,
    pub b: SeedEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedEndpoint {
    pub device: String,
    pub interface: String,
}

/// Process-local inventory with the same invariants as NetBox: interface
/// names are unique per device and an interface holds at most one cable.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &InventorySeed) -> Result<Self> {
        let store = Self::new();

        for device in &seed.devices {
            let created = store.add_device(&device.name);
            for interface in &device.interfaces {
                store.add_interface(
                    created.id,
                    &interface.name,
                    &interface.description,
                    interface.mac_address.as_deref(),
                )?;
            }
        }

        for cable in &seed.cables {
            let a = store.resolve_endpoint(&cable.a)?;
            let b = store.resolve_endpoint(&cable.b)?;
            store.add_cable(a, b)?;
        }

        Ok(store)
    }

    pub fn from_seed_json(content: &str) -> Result<Self> {
        let seed: InventorySeed = serde_json::from_str(content)?;
        Self::from_seed(&seed)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_endpoint(&self, endpoint: &SeedEndpoint) -> Result<u64> {
        let state = self.state();
        let device = state
            .devices
            .iter()
            .find(|d| d.name == endpoint.device)
            .ok_or_else(|| SyncError::NotFoundError {
                message: format!("device {}", endpoint.device),
            })?;
        state
            .interfaces
            .iter()
            .find(|i| i.device_id == device.id && i.name == endpoint.interface)
            .map(|i| i.id)
            .ok_or_else(|| SyncError::NotFoundError {
                message: format!("interface {} on {}", endpoint.interface, endpoint.device),
            })
    }

    pub fn add_device(&self, name: &str) -> Device {
        let mut state = self.state();
        let device = Device {
            id: state.allocate_id(),
            name: name.to_string(),
        };
        state.devices.push(device.clone());
        device
    }

    pub fn add_interface(
        &self,
        device_id: u64,
        name: &str,
        description: &str,
        mac_address: Option<&str>,
    ) -> Result<Interface> {
        self.state().insert_interface(NewInterface {
            device_id,
            name: name.to_string(),
            kind: DEFAULT_INTERFACE_TYPE.to_string(),
            description: description.to_string(),
            mac_address: mac_address.map(str::to_string),
        })
    }

    pub fn add_cable(&self, a_id: u64, b_id: u64) -> Result<Cable> {
        self.state().insert_cable(a_id, b_id)
    }

    pub fn interface(&self, device_id: u64, name: &str) -> Option<Interface> {
        self.state()
            .interfaces
            .iter()
            .find(|i| i.device_id == device_id && i.name == name)
            .cloned()
    }

    pub fn interfaces(&self) -> Vec<Interface> {
        self.state().interfaces.clone()
    }

    pub fn cable(&self, cable_id: u64) -> Option<Cable> {
        self.state().cables.iter().find(|c| c.id == cable_id).cloned()
    }

    pub fn cables(&self) -> Vec<Cable> {
        self.state().cables.clone()
    }

    /// Current records addressed by names, so they can seed another store.
    pub fn to_seed(&self) -> InventorySeed {
        let state = self.state();
        let endpoint = |end: &Termination| SeedEndpoint {
            device: end.device_name.clone(),
            interface: end.interface_name.clone(),
        };

        InventorySeed {
            devices: state
                .devices
                .iter()
                .map(|device| SeedDevice {
                    name: device.name.clone(),
                    interfaces: state
                        .interfaces
                        .iter()
                        .filter(|i| i.device_id == device.id)
                        .map(|i| SeedInterface {
                            name: i.name.clone(),
                            description: i.description.clone(),
                            mac_address: i.mac_address.clone(),
                        })
                        .collect(),
                })
                .collect(),
            cables: state
                .cables
                .iter()
                .map(|c| SeedCable {
                    a: endpoint(&c.a),
                    b: endpoint(&c.b),
                })
                .collect(),
        }
    }

    /// Current records in seed form as pretty JSON. A rehearsal's output can
    /// be fed back in as `--inventory-file`.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_seed())?)
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        Ok(self.state().devices.clone())
    }

    async fn find_device(&self, name: &str) -> Result<Option<Device>> {
        Ok(self.state().devices.iter().find(|d| d.name == name).cloned())
    }

    async fn list_interfaces(&self, device_id: u64) -> Result<Vec<Interface>> {
        Ok(self
            .state()
            .interfaces
            .iter()
            .filter(|i| i.device_id == device_id)
            .cloned()
            .collect())
    }

    async fn find_interface(&self, device_id: u64, name: &str) -> Result<Option<Interface>> {
        Ok(self.interface(device_id, name))
    }

    async fn create_interface(&self, interface: NewInterface) -> Result<Interface> {
        self.state().insert_interface(interface)
    }

    async fn update_description(&self, interface_id: u64, description: &str) -> Result<()> {
        let mut state = self.state();
        let interface = state
            .interfaces
            .iter_mut()
            .find(|i| i.id == interface_id)
            .ok_or_else(|| SyncError::NotFoundError {
                message: format!("interface {}", interface_id),
            })?;
        interface.description = description.to_string();
        Ok(())
    }

    async fn get_cable(&self, cable_id: u64) -> Result<Option<Cable>> {
        Ok(self.cable(cable_id))
    }

    async fn create_cable(&self, a: &Interface, b: &Interface) -> Result<Cable> {
        self.state().insert_cable(a.id, b.id)
    }

    async fn delete_cable(&self, cable_id: u64) -> Result<()> {
        self.state().remove_cable(cable_id)
    }
}
