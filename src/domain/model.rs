use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    pub name: String,
}

/// Interface type assigned to interfaces created from live state.
pub const DEFAULT_INTERFACE_TYPE: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: u64,
    pub device_id: u64,
    pub device_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub cable: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInterface {
    pub device_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub mac_address: Option<String>,
}

/// One end of a cable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub interface_id: u64,
    pub interface_name: String,
    pub device_id: u64,
    pub device_name: String,
}

impl Termination {
    pub fn of(interface: &Interface) -> Self {
        Self {
            interface_id: interface.id,
            interface_name: interface.name.clone(),
            device_id: interface.device_id,
            device_name: interface.device_name.clone(),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.interface_name, self.device_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    pub id: u64,
    pub a: Termination,
    pub b: Termination,
}

impl Cable {
    /// The far end of the cable as seen from `interface_id`.
    pub fn peer_of(&self, interface_id: u64) -> Option<&Termination> {
        if self.a.interface_id == interface_id {
            Some(&self.b)
        } else if self.b.interface_id == interface_id {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn touches(&self, interface_id: u64) -> bool {
        self.a.interface_id == interface_id || self.b.interface_id == interface_id
    }
}

impl fmt::Display for Cable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

/// Live interface state as reported by `get_interfaces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSnapshot {
    pub name: String,
    pub description: String,
    pub mac_address: Option<String>,
}

/// One `get_lldp_neighbors` entry. Devices may report a neighbor without a
/// system name or port id; those come through as `None` and never resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub local_interface: String,
    pub remote_device: Option<String>,
    pub remote_interface: Option<String>,
}

impl NeighborRecord {
    pub fn remote_device_label(&self) -> &str {
        self.remote_device.as_deref().unwrap_or("unknown")
    }

    pub fn remote_interface_label(&self) -> &str {
        self.remote_interface.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    InterfaceCreated,
    InterfaceUpdated,
    CableCreated,
    StaleCableDeleted,
    OldCableDeleted,
    LocalInterfaceMissing,
    RemoteDeviceMissing,
    RemoteInterfaceMissing,
}

impl NotificationKind {
    pub fn level(self) -> NotificationLevel {
        match self {
            NotificationKind::InterfaceCreated
            | NotificationKind::InterfaceUpdated
            | NotificationKind::CableCreated
            | NotificationKind::StaleCableDeleted
            | NotificationKind::OldCableDeleted => NotificationLevel::Success,
            NotificationKind::LocalInterfaceMissing => NotificationLevel::Warning,
            NotificationKind::RemoteDeviceMissing | NotificationKind::RemoteInterfaceMissing => {
                NotificationLevel::Info
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub level: NotificationLevel,
    pub kind: NotificationKind,
    pub device: String,
    pub message: String,
}

/// Outcome of one job run across all selected devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub job: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub devices_processed: usize,
    pub devices_failed: Vec<String>,
    pub notifications: Vec<Notification>,
}

impl SyncReport {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            started_at: Utc::now(),
            finished_at: None,
            devices_processed: 0,
            devices_failed: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Records a notification and mirrors it to the log.
    pub fn notify(&mut self, kind: NotificationKind, device: &str, message: impl Into<String>) {
        let message = format!("[{}] {}", device, message.into());
        let level = kind.level();
        match level {
            NotificationLevel::Warning => tracing::warn!("{}", message),
            NotificationLevel::Info | NotificationLevel::Success => tracing::info!("{}", message),
        }
        self.notifications.push(Notification {
            timestamp: Utc::now(),
            level,
            kind,
            device: device.to_string(),
            message,
        });
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.notifications.iter().filter(|n| n.kind == kind).count()
    }

    pub fn counts(&self) -> BTreeMap<NotificationKind, usize> {
        let mut counts = BTreeMap::new();
        for notification in &self.notifications {
            *counts.entry(notification.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn termination(interface_id: u64, name: &str, device: &str) -> Termination {
        Termination {
            interface_id,
            interface_name: name.to_string(),
            device_id: interface_id * 100,
            device_name: device.to_string(),
        }
    }

    #[test]
    fn test_cable_peer_of_either_end() {
        let cable = Cable {
            id: 1,
            a: termination(1, "eth0", "leaf1"),
            b: termination(2, "eth1", "spine1"),
        };

        assert_eq!(cable.peer_of(1).unwrap().interface_name, "eth1");
        assert_eq!(cable.peer_of(2).unwrap().interface_name, "eth0");
        assert!(cable.peer_of(3).is_none());
        assert_eq!(cable.to_string(), "eth0 (leaf1) <-> eth1 (spine1)");
    }

    #[test]
    fn test_report_prefixes_device_and_counts_kinds() {
        let mut report = SyncReport::new("interfaces");
        report.notify(NotificationKind::InterfaceCreated, "leaf1", "Created a new interface (eth0)");
        report.notify(NotificationKind::InterfaceCreated, "leaf1", "Created a new interface (eth1)");
        report.notify(NotificationKind::LocalInterfaceMissing, "leaf2", "missing");

        assert_eq!(report.notifications[0].message, "[leaf1] Created a new interface (eth0)");
        assert_eq!(report.notifications[2].level, NotificationLevel::Warning);
        assert_eq!(report.count(NotificationKind::InterfaceCreated), 2);
        assert_eq!(report.counts().len(), 2);
    }
}
