use crate::domain::model::{Cable, Device, Interface, NewInterface, SyncReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn netbox_url(&self) -> &str;
    fn netbox_token(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
    fn device_pattern(&self) -> &str;
    fn ignore_interfaces(&self) -> &str;
    fn show_missing(&self) -> bool;
    fn normalize_mac(&self) -> bool;
    fn keep_going(&self) -> bool;
    fn output_path(&self) -> Option<&str>;
    fn report_formats(&self) -> &[String];
    fn live_state_file(&self) -> Option<&str>;
    fn inventory_file(&self) -> Option<&str>;
}

/// Device, interface and cable records of the source of truth.
///
/// Lookups return `Ok(None)` for records that do not exist; errors are
/// reserved for transport and invariant failures.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>>;
    async fn find_device(&self, name: &str) -> Result<Option<Device>>;
    async fn list_interfaces(&self, device_id: u64) -> Result<Vec<Interface>>;
    async fn find_interface(&self, device_id: u64, name: &str) -> Result<Option<Interface>>;
    async fn create_interface(&self, interface: NewInterface) -> Result<Interface>;
    async fn update_description(&self, interface_id: u64, description: &str) -> Result<()>;
    async fn get_cable(&self, cable_id: u64) -> Result<Option<Cable>>;
    async fn create_cable(&self, a: &Interface, b: &Interface) -> Result<Cable>;
    async fn delete_cable(&self, cable_id: u64) -> Result<()>;
}

/// Live device state, keyed by a NAPALM getter name such as `get_interfaces`.
#[async_trait]
pub trait LiveStateClient: Send + Sync {
    async fn fetch(&self, method: &str, device_id: u64) -> Result<serde_json::Value>;
}

/// One reconciliation job: fetch a device's live state, then converge the
/// inventory towards it.
#[async_trait]
pub trait Reconciler: Send + Sync {
    type Snapshot: Send;

    fn job_name(&self) -> &'static str;

    async fn fetch(&self, device: &Device) -> Result<Self::Snapshot>;

    async fn reconcile(
        &self,
        device: &Device,
        snapshot: Self::Snapshot,
        report: &mut SyncReport,
    ) -> Result<()>;
}
