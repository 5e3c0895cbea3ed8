use crate::core::{
    Cable, Device, Interface, InventoryStore, LiveStateClient, NeighborRecord, NotificationKind,
    Reconciler, SyncReport, Termination,
};
use crate::domain::snapshot::{parse_neighbors, GET_LLDP_NEIGHBORS};
use crate::utils::error::Result;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    LocalInterface,
    RemoteDevice,
    RemoteInterface,
}

/// A cable that has to go before the reported link can be cabled, seen from
/// the interface that is being re-cabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCable {
    pub cable_id: u64,
    pub near: Termination,
    pub far: Termination,
}

impl StaleCable {
    fn from_cable(cable: &Cable, near_interface_id: u64) -> Self {
        let (near, far) = if cable.a.interface_id == near_interface_id {
            (cable.a.clone(), cable.b.clone())
        } else {
            (cable.b.clone(), cable.a.clone())
        };
        Self {
            cable_id: cable.id,
            near,
            far,
        }
    }
}

/// What to do about one neighbor entry. Built from lookups only; nothing is
/// written until [`CableReconciler::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CableDecision {
    /// The local interface is already cabled to the reported remote.
    Keep,
    /// Something the link needs is not in the inventory; nothing changes.
    Skip(Missing),
    /// Remove `stale` cables, then cable `local` to `remote`.
    Connect {
        local: Interface,
        remote: Interface,
        stale: Vec<StaleCable>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CableOptions {
    /// Emit notifications for neighbors that cannot be resolved.
    pub show_missing: bool,
}

/// Keeps cables in line with `get_lldp_neighbors`.
pub struct CableReconciler<S: InventoryStore, L: LiveStateClient> {
    store: S,
    live: L,
    options: CableOptions,
}

impl<S: InventoryStore, L: LiveStateClient> CableReconciler<S, L> {
    pub fn new(store: S, live: L, options: CableOptions) -> Self {
        Self {
            store,
            live,
            options,
        }
    }

    async fn cable_of(&self, interface: &Interface) -> Result<Option<Cable>> {
        match interface.cable {
            Some(cable_id) => self.store.get_cable(cable_id).await,
            None => Ok(None),
        }
    }

    async fn find_remote_device(&self, neighbor: &NeighborRecord) -> Result<Option<Device>> {
        match neighbor.remote_device.as_deref() {
            Some(name) => self.store.find_device(name).await,
            None => Ok(None),
        }
    }

    async fn find_remote_interface(
        &self,
        remote_device: &Device,
        neighbor: &NeighborRecord,
    ) -> Result<Option<Interface>> {
        match neighbor.remote_interface.as_deref() {
            Some(name) => self.store.find_interface(remote_device.id, name).await,
            None => Ok(None),
        }
    }

    pub async fn decide(&self, device: &Device, neighbor: &NeighborRecord) -> Result<CableDecision> {
        let Some(local) = self
            .store
            .find_interface(device.id, &neighbor.local_interface)
            .await?
        else {
            return Ok(CableDecision::Skip(Missing::LocalInterface));
        };

        let mut stale = Vec::new();
        if let Some(cable) = self.cable_of(&local).await? {
            let already_cabled = cable.peer_of(local.id).is_some_and(|peer| {
                neighbor.remote_interface.as_deref() == Some(peer.interface_name.as_str())
                    && neighbor.remote_device.as_deref() == Some(peer.device_name.as_str())
            });
            if already_cabled {
                return Ok(CableDecision::Keep);
            }
            stale.push(StaleCable::from_cable(&cable, local.id));
        }

        let Some(remote_device) = self.find_remote_device(neighbor).await? else {
            return Ok(CableDecision::Skip(Missing::RemoteDevice));
        };
        let Some(remote) = self.find_remote_interface(&remote_device, neighbor).await? else {
            return Ok(CableDecision::Skip(Missing::RemoteInterface));
        };

        if let Some(cable) = self.cable_of(&remote).await? {
            if stale.iter().all(|s| s.cable_id != cable.id) {
                stale.push(StaleCable::from_cable(&cable, remote.id));
            }
        }

        Ok(CableDecision::Connect {
            local,
            remote,
            stale,
        })
    }

    pub async fn apply(
        &self,
        device: &Device,
        neighbor: &NeighborRecord,
        decision: CableDecision,
        report: &mut SyncReport,
    ) -> Result<()> {
        match decision {
            CableDecision::Keep => {
                tracing::debug!(
                    "[{}] {} already cabled to {} ({})",
                    device.name,
                    neighbor.local_interface,
                    neighbor.remote_interface_label(),
                    neighbor.remote_device_label()
                );
            }
            CableDecision::Skip(missing) => {
                if self.options.show_missing {
                    notify_missing(device, neighbor, missing, report);
                }
            }
            CableDecision::Connect {
                local,
                remote,
                stale,
            } => {
                for old in stale {
                    self.store.delete_cable(old.cable_id).await?;
                    report.notify(
                        NotificationKind::StaleCableDeleted,
                        &device.name,
                        format!(
                            "Deleting a no longer existing cable: {} <-> {}",
                            old.near, old.far
                        ),
                    );
                }

                let cable = self.store.create_cable(&local, &remote).await?;
                report.notify(
                    NotificationKind::CableCreated,
                    &device.name,
                    format!(
                        "Creating a new cable: {} <-> {}",
                        Termination::of(&local),
                        Termination::of(&remote)
                    ),
                );
                tracing::debug!("[{}] Cable {} created", device.name, cable.id);
            }
        }
        Ok(())
    }

    /// Deletes cables on `device` whose interface was not reported by LLDP
    /// in this run.
    pub async fn remove_old_cables(
        &self,
        device: &Device,
        seen: &HashSet<String>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let interfaces = self.store.list_interfaces(device.id).await?;

        for interface in interfaces
            .iter()
            .filter(|i| i.cable.is_some() && !seen.contains(&i.name))
        {
            // Both ends may sit on this device, in which case the cable is
            // already gone.
            let Some(cable) = self.cable_of(interface).await? else {
                continue;
            };

            self.store.delete_cable(cable.id).await?;
            report.notify(
                NotificationKind::OldCableDeleted,
                &device.name,
                format!("Deleting an old cable: {}", cable),
            );
        }

        Ok(())
    }
}

fn notify_missing(
    device: &Device,
    neighbor: &NeighborRecord,
    missing: Missing,
    report: &mut SyncReport,
) {
    match missing {
        Missing::LocalInterface => report.notify(
            NotificationKind::LocalInterfaceMissing,
            &device.name,
            format!(
                "Local interface ({}) for device ({}) could not be found in the inventory. \
                 Run the interfaces job to have all the interfaces for a device generated",
                neighbor.local_interface, device.name
            ),
        ),
        Missing::RemoteDevice => report.notify(
            NotificationKind::RemoteDeviceMissing,
            &device.name,
            format!(
                "Remote device ({}) could not be found in the inventory. \
                 Create the device and add the ({}) interface for a cable to be connected",
                neighbor.remote_device_label(),
                neighbor.remote_interface_label()
            ),
        ),
        Missing::RemoteInterface => report.notify(
            NotificationKind::RemoteInterfaceMissing,
            &device.name,
            format!(
                "Remote interface ({}) for device ({}) could not be found in the inventory. \
                 Create the interface for a cable to be connected",
                neighbor.remote_interface_label(),
                neighbor.remote_device_label()
            ),
        ),
    }
}

#[async_trait::async_trait]
impl<S: InventoryStore, L: LiveStateClient> Reconciler for CableReconciler<S, L> {
    type Snapshot = Vec<NeighborRecord>;

    fn job_name(&self) -> &'static str {
        "cables"
    }

    async fn fetch(&self, device: &Device) -> Result<Self::Snapshot> {
        let payload = self.live.fetch(GET_LLDP_NEIGHBORS, device.id).await?;
        parse_neighbors(device.id, &payload)
    }

    async fn reconcile(
        &self,
        device: &Device,
        snapshot: Self::Snapshot,
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut seen = HashSet::new();

        for neighbor in &snapshot {
            seen.insert(neighbor.local_interface.clone());
            let decision = self.decide(device, neighbor).await?;
            self.apply(device, neighbor, decision, report).await?;
        }

        self.remove_old_cables(device, &seen, report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::static_state::StaticLiveState;

    fn neighbor(local: &str, remote_device: &str, remote_interface: &str) -> NeighborRecord {
        NeighborRecord {
            local_interface: local.to_string(),
            remote_device: Some(remote_device.to_string()),
            remote_interface: Some(remote_interface.to_string()),
        }
    }

    fn reconciler(store: &InMemoryStore, show_missing: bool) -> CableReconciler<InMemoryStore, StaticLiveState> {
        CableReconciler::new(
            store.clone(),
            StaticLiveState::new(),
            CableOptions { show_missing },
        )
    }

    #[tokio::test]
    async fn test_decide_keeps_matching_cable() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let spine = store.add_device("spine1");
        let eth0 = store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let eth1 = store.add_interface(spine.id, "eth1", "", None).unwrap();
        store.add_cable(eth0.id, eth1.id).unwrap();

        let decision = reconciler(&store, false)
            .decide(&leaf, &neighbor("eth0", "spine1", "eth1"))
            .await
            .unwrap();

        assert_eq!(decision, CableDecision::Keep);
    }

    #[tokio::test]
    async fn test_decide_same_port_on_other_device_is_stale() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let spine1 = store.add_device("spine1");
        let spine2 = store.add_device("spine2");
        let eth0 = store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let old_peer = store.add_interface(spine1.id, "eth1", "", None).unwrap();
        store.add_interface(spine2.id, "eth1", "", None).unwrap();
        let cable = store.add_cable(eth0.id, old_peer.id).unwrap();

        let decision = reconciler(&store, false)
            .decide(&leaf, &neighbor("eth0", "spine2", "eth1"))
            .await
            .unwrap();

        match decision {
            CableDecision::Connect { stale, remote, .. } => {
                assert_eq!(remote.device_name, "spine2");
                assert_eq!(stale.len(), 1);
                assert_eq!(stale[0].cable_id, cable.id);
                assert_eq!(stale[0].near.interface_name, "eth0");
                assert_eq!(stale[0].far.device_name, "spine1");
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unresolved_remote_leaves_stale_cable_in_place() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let spine = store.add_device("spine1");
        let eth0 = store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let eth1 = store.add_interface(spine.id, "eth1", "", None).unwrap();
        let cable = store.add_cable(eth0.id, eth1.id).unwrap();
        let reconciler = reconciler(&store, true);
        let mut report = SyncReport::new("cables");

        reconciler
            .reconcile(&leaf, vec![neighbor("eth0", "spine9", "eth1")], &mut report)
            .await
            .unwrap();

        assert!(store.cable(cable.id).is_some());
        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.notifications[0].kind, NotificationKind::RemoteDeviceMissing);
    }

    #[tokio::test]
    async fn test_missing_remote_interface_is_reported_when_enabled() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        store.add_device("spine1");
        store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let mut report = SyncReport::new("cables");

        reconciler(&store, true)
            .reconcile(&leaf, vec![neighbor("eth0", "spine1", "eth7")], &mut report)
            .await
            .unwrap();

        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.notifications[0].kind, NotificationKind::RemoteInterfaceMissing);
        assert!(report.notifications[0].message.contains("Remote interface (eth7) for device (spine1)"));
    }

    #[tokio::test]
    async fn test_missing_local_interface_warns_and_keeps_going() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let spine = store.add_device("spine1");
        store.add_interface(leaf.id, "eth1", "", None).unwrap();
        store.add_interface(spine.id, "eth1", "", None).unwrap();
        let mut report = SyncReport::new("cables");

        reconciler(&store, true)
            .reconcile(
                &leaf,
                vec![neighbor("eth0", "spine1", "eth0"), neighbor("eth1", "spine1", "eth1")],
                &mut report,
            )
            .await
            .unwrap();

        assert_eq!(report.count(NotificationKind::LocalInterfaceMissing), 1);
        assert_eq!(report.notifications[0].level, crate::core::NotificationLevel::Warning);
        assert_eq!(report.count(NotificationKind::CableCreated), 1);
    }

    #[tokio::test]
    async fn test_remote_cabled_elsewhere_is_released_first() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let spine = store.add_device("spine1");
        let other = store.add_device("leaf2");
        store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let spine_port = store.add_interface(spine.id, "eth1", "", None).unwrap();
        let other_port = store.add_interface(other.id, "eth5", "", None).unwrap();
        let old = store.add_cable(other_port.id, spine_port.id).unwrap();
        let mut report = SyncReport::new("cables");

        reconciler(&store, false)
            .reconcile(&leaf, vec![neighbor("eth0", "spine1", "eth1")], &mut report)
            .await
            .unwrap();

        assert!(store.cable(old.id).is_none());
        assert_eq!(
            report.notifications[0].message,
            "[leaf1] Deleting a no longer existing cable: eth1 (spine1) <-> eth5 (leaf2)"
        );
        assert_eq!(
            report.notifications[1].message,
            "[leaf1] Creating a new cable: eth0 (leaf1) <-> eth1 (spine1)"
        );
        assert!(store.interface(other.id, "eth5").unwrap().cable.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_skips_cable_removed_from_other_end() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let a = store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let b = store.add_interface(leaf.id, "eth1", "", None).unwrap();
        store.add_cable(a.id, b.id).unwrap();
        let mut report = SyncReport::new("cables");

        reconciler(&store, false)
            .reconcile(&leaf, vec![], &mut report)
            .await
            .unwrap();

        assert_eq!(report.count(NotificationKind::OldCableDeleted), 1);
        assert_eq!(
            report.notifications[0].message,
            "[leaf1] Deleting an old cable: eth0 (leaf1) <-> eth1 (leaf1)"
        );
        assert!(store.cables().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_cables_of_reported_interfaces_even_if_skipped() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        let spine = store.add_device("spine1");
        let eth0 = store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let eth1 = store.add_interface(spine.id, "eth1", "", None).unwrap();
        let cable = store.add_cable(eth0.id, eth1.id).unwrap();
        let mut report = SyncReport::new("cables");

        reconciler(&store, false)
            .reconcile(&leaf, vec![neighbor("eth0", "unknown", "xe-0/0/0")], &mut report)
            .await
            .unwrap();

        assert!(store.cable(cable.id).is_some());
        assert!(report.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_neighbor_without_hostname_is_skipped() {
        let store = InMemoryStore::new();
        let d = store.add_device("D");
        let e = store.add_device("E");
        let d_eth0 = store.add_interface(d.id, "eth0", "", None).unwrap();
        let d_eth1 = store.add_interface(d.id, "eth1", "", None).unwrap();
        let e_eth1 = store.add_interface(e.id, "eth1", "", None).unwrap();
        let live = StaticLiveState::new().with_payload(
            d.id,
            GET_LLDP_NEIGHBORS,
            serde_json::json!({
                "eth0": [{"hostname": null, "port": "x"}],
                "eth1": [{"hostname": "E", "port": "eth1"}]
            }),
        );
        let reconciler = CableReconciler::new(store.clone(), live, CableOptions { show_missing: true });
        let mut report = SyncReport::new("cables");

        let snapshot = reconciler.fetch(&d).await.unwrap();
        reconciler.reconcile(&d, snapshot, &mut report).await.unwrap();

        let kinds: Vec<NotificationKind> = report.notifications.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::RemoteDeviceMissing, NotificationKind::CableCreated]
        );
        assert!(report.notifications[0].message.contains("Remote device (unknown)"));
        let cables = store.cables();
        assert_eq!(cables.len(), 1);
        assert!(cables[0].touches(d_eth1.id) && cables[0].touches(e_eth1.id));
        assert_eq!(store.interface(d.id, "eth0").and_then(|i| i.cable), None);
        assert!(!cables[0].touches(d_eth0.id));
    }

    #[tokio::test]
    async fn test_neighbor_without_port_is_remote_interface_missing() {
        let store = InMemoryStore::new();
        let leaf = store.add_device("leaf1");
        store.add_device("spine1");
        store.add_interface(leaf.id, "eth0", "", None).unwrap();
        let record = NeighborRecord {
            local_interface: "eth0".to_string(),
            remote_device: Some("spine1".to_string()),
            remote_interface: None,
        };

        let decision = reconciler(&store, false).decide(&leaf, &record).await.unwrap();

        assert_eq!(decision, CableDecision::Skip(Missing::RemoteInterface));
    }
}
