use crate::core::{
    Device, InterfaceSnapshot, InventoryStore, LiveStateClient, NewInterface, NotificationKind,
    Reconciler, SyncReport,
};
use crate::domain::model::DEFAULT_INTERFACE_TYPE;
use crate::domain::snapshot::{parse_interfaces, GET_INTERFACES};
use crate::utils::error::Result;
use crate::utils::validation::validate_regex;
use regex::Regex;

/// MAC values some drivers report in place of an absent address.
pub const ABSENT_MAC_MARKERS: [&str; 3] = ["None", "Unspecified", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacNormalization {
    /// Reported MAC values are stored verbatim, markers included.
    #[default]
    Passthrough,
    /// Any of [`ABSENT_MAC_MARKERS`] is stored as no MAC.
    Absent,
}

impl MacNormalization {
    pub fn from_flag(normalize: bool) -> Self {
        if normalize {
            MacNormalization::Absent
        } else {
            MacNormalization::Passthrough
        }
    }

    pub fn apply(self, mac_address: Option<String>) -> Option<String> {
        match self {
            MacNormalization::Passthrough => mac_address,
            MacNormalization::Absent => {
                mac_address.filter(|mac| !ABSENT_MAC_MARKERS.contains(&mac.as_str()))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceOptions {
    ignore: Option<Regex>,
    pub mac: MacNormalization,
}

impl InterfaceOptions {
    /// `ignore_pattern` must match from the start of an interface name; an
    /// empty pattern ignores nothing.
    pub fn new(ignore_pattern: &str, normalize_mac: bool) -> Result<Self> {
        let ignore = if ignore_pattern.is_empty() {
            None
        } else {
            Some(validate_regex(
                "ignore_interfaces",
                &format!("^(?:{})", ignore_pattern),
            )?)
        };

        Ok(Self {
            ignore,
            mac: MacNormalization::from_flag(normalize_mac),
        })
    }

    pub fn is_ignored(&self, interface_name: &str) -> bool {
        self.ignore
            .as_ref()
            .is_some_and(|re| re.is_match(interface_name))
    }
}

/// Creates missing interfaces and keeps descriptions in line with
/// `get_interfaces`. Interfaces are never deleted.
pub struct InterfaceReconciler<S: InventoryStore, L: LiveStateClient> {
    store: S,
    live: L,
    options: InterfaceOptions,
}

impl<S: InventoryStore, L: LiveStateClient> InterfaceReconciler<S, L> {
    pub fn new(store: S, live: L, options: InterfaceOptions) -> Self {
        Self {
            store,
            live,
            options,
        }
    }

    async fn sync_interface(
        &self,
        device: &Device,
        live: InterfaceSnapshot,
        report: &mut SyncReport,
    ) -> Result<()> {
        let mac_address = self.options.mac.apply(live.mac_address);

        match self.store.find_interface(device.id, &live.name).await? {
            None => {
                let created = self
                    .store
                    .create_interface(NewInterface {
                        device_id: device.id,
                        name: live.name,
                        kind: DEFAULT_INTERFACE_TYPE.to_string(),
                        description: live.description,
                        mac_address,
                    })
                    .await?;
                report.notify(
                    NotificationKind::InterfaceCreated,
                    &device.name,
                    format!("Created a new interface ({})", created.name),
                );
            }
            Some(existing) if existing.description != live.description => {
                self.store
                    .update_description(existing.id, &live.description)
                    .await?;
                report.notify(
                    NotificationKind::InterfaceUpdated,
                    &device.name,
                    format!(
                        "Updated an interface's description ({}): '{}' -> '{}'",
                        existing.name, existing.description, live.description
                    ),
                );
            }
            Some(_) => {}
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: InventoryStore, L: LiveStateClient> Reconciler for InterfaceReconciler<S, L> {
    type Snapshot = Vec<InterfaceSnapshot>;

    fn job_name(&self) -> &'static str {
        "interfaces"
    }

    async fn fetch(&self, device: &Device) -> Result<Self::Snapshot> {
        let payload = self.live.fetch(GET_INTERFACES, device.id).await?;
        parse_interfaces(device.id, &payload)
    }

    async fn reconcile(
        &self,
        device: &Device,
        snapshot: Self::Snapshot,
        report: &mut SyncReport,
    ) -> Result<()> {
        for live in snapshot {
            if self.options.is_ignored(&live.name) {
                tracing::debug!("[{}] Ignoring interface {}", device.name, live.name);
                continue;
            }
            self.sync_interface(device, live, report).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::static_state::StaticLiveState;
    use serde_json::json;

    fn snapshot(name: &str, description: &str, mac: Option<&str>) -> InterfaceSnapshot {
        InterfaceSnapshot {
            name: name.to_string(),
            description: description.to_string(),
            mac_address: mac.map(str::to_string),
        }
    }

    #[test]
    fn test_ignore_pattern_is_anchored_at_start() {
        let options = InterfaceOptions::new("Vlan.*", false).unwrap();
        assert!(options.is_ignored("Vlan100"));
        assert!(!options.is_ignored("Port-Channel-Vlan1"));
        assert!(!options.is_ignored("Ethernet1"));
    }

    #[test]
    fn test_empty_ignore_pattern_ignores_nothing() {
        let options = InterfaceOptions::new("", false).unwrap();
        assert!(!options.is_ignored("Vlan100"));
        assert!(!options.is_ignored(""));
    }

    #[test]
    fn test_invalid_ignore_pattern_is_rejected() {
        assert!(InterfaceOptions::new("Vlan(", false).is_err());
    }

    #[test]
    fn test_default_mac_handling_keeps_markers() {
        // Markers are stored as reported unless normalization is requested.
        let mac = MacNormalization::default();
        for marker in ABSENT_MAC_MARKERS {
            assert_eq!(mac.apply(Some(marker.to_string())), Some(marker.to_string()));
        }
        assert_eq!(mac.apply(None), None);
    }

    #[test]
    fn test_absent_mac_handling_drops_markers() {
        let mac = MacNormalization::Absent;
        for marker in ABSENT_MAC_MARKERS {
            assert_eq!(mac.apply(Some(marker.to_string())), None);
        }
        assert_eq!(
            mac.apply(Some("AA:BB:CC:DD:EE:FF".to_string())),
            Some("AA:BB:CC:DD:EE:FF".to_string())
        );
    }

    async fn sync_markers(normalize_mac: bool) -> InMemoryStore {
        let store = InMemoryStore::new();
        let device = store.add_device("leaf1");
        let live = StaticLiveState::new().with_payload(
            device.id,
            GET_INTERFACES,
            json!({
                "eth0": {"description": "", "mac_address": "Unspecified"},
                "eth1": {"description": "", "mac_address": "None"},
                "eth2": {"description": "", "mac_address": ""}
            }),
        );
        let reconciler = InterfaceReconciler::new(
            store.clone(),
            live,
            InterfaceOptions::new("", normalize_mac).unwrap(),
        );
        let mut report = SyncReport::new("interfaces");

        let snapshot = reconciler.fetch(&device).await.unwrap();
        reconciler.reconcile(&device, snapshot, &mut report).await.unwrap();
        assert_eq!(report.count(NotificationKind::InterfaceCreated), 3);
        store
    }

    #[tokio::test]
    async fn test_reconcile_stores_mac_markers_by_default() {
        let store = sync_markers(false).await;

        let macs: Vec<Option<String>> = store.interfaces().into_iter().map(|i| i.mac_address).collect();
        assert_eq!(
            macs,
            vec![
                Some("Unspecified".to_string()),
                Some("None".to_string()),
                Some(String::new()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reconcile_drops_mac_markers_when_normalizing() {
        let store = sync_markers(true).await;

        assert!(store.interfaces().iter().all(|i| i.mac_address.is_none()));
    }

    #[tokio::test]
    async fn test_creates_interface_with_type_description_and_mac() {
        let store = InMemoryStore::new();
        let device = store.add_device("leaf1");
        let reconciler = InterfaceReconciler::new(
            store.clone(),
            StaticLiveState::new(),
            InterfaceOptions::new("", false).unwrap(),
        );
        let mut report = SyncReport::new("interfaces");

        reconciler
            .reconcile(
                &device,
                vec![snapshot("eth0", "up", Some("AA:BB:CC:DD:EE:FF"))],
                &mut report,
            )
            .await
            .unwrap();

        let interface = store.interface(device.id, "eth0").unwrap();
        assert_eq!(interface.kind, "other");
        assert_eq!(interface.description, "up");
        assert_eq!(interface.mac_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.notifications[0].kind, NotificationKind::InterfaceCreated);
        assert_eq!(report.notifications[0].message, "[leaf1] Created a new interface (eth0)");
    }

    #[tokio::test]
    async fn test_updates_description_only() {
        let store = InMemoryStore::new();
        let device = store.add_device("leaf1");
        store.add_interface(device.id, "eth0", "old", Some("AA:BB:CC:DD:EE:01")).unwrap();
        let reconciler = InterfaceReconciler::new(
            store.clone(),
            StaticLiveState::new(),
            InterfaceOptions::default(),
        );
        let mut report = SyncReport::new("interfaces");

        reconciler
            .reconcile(
                &device,
                vec![snapshot("eth0", "new", Some("AA:BB:CC:DD:EE:99"))],
                &mut report,
            )
            .await
            .unwrap();

        let interface = store.interface(device.id, "eth0").unwrap();
        assert_eq!(interface.description, "new");
        assert_eq!(interface.mac_address.as_deref(), Some("AA:BB:CC:DD:EE:01"));
        assert_eq!(report.count(NotificationKind::InterfaceUpdated), 1);
        assert_eq!(
            report.notifications[0].message,
            "[leaf1] Updated an interface's description (eth0): 'old' -> 'new'"
        );
    }

    #[tokio::test]
    async fn test_ignored_interfaces_are_not_created() {
        let store = InMemoryStore::new();
        let device = store.add_device("leaf1");
        let reconciler = InterfaceReconciler::new(
            store.clone(),
            StaticLiveState::new(),
            InterfaceOptions::new("Vlan.*", false).unwrap(),
        );
        let mut report = SyncReport::new("interfaces");

        reconciler
            .reconcile(
                &device,
                vec![snapshot("Vlan10", "svi", None), snapshot("eth1", "", None)],
                &mut report,
            )
            .await
            .unwrap();

        assert!(store.interface(device.id, "Vlan10").is_none());
        assert!(store.interface(device.id, "eth1").is_some());
        assert_eq!(report.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_parses_live_payload() {
        let store = InMemoryStore::new();
        let device = store.add_device("leaf1");
        let live = StaticLiveState::new().with_payload(
            device.id,
            GET_INTERFACES,
            json!({"eth0": {"description": "uplink", "mac_address": "AA:BB:CC:DD:EE:FF"}}),
        );
        let reconciler = InterfaceReconciler::new(store, live, InterfaceOptions::default());

        let snapshot = reconciler.fetch(&device).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].description, "uplink");
    }
}
