pub mod cable_sync;
pub mod engine;
pub mod interface_sync;
pub mod report;

pub use crate::domain::model::{
    Cable, Device, Interface, InterfaceSnapshot, NeighborRecord, NewInterface, Notification,
    NotificationKind, NotificationLevel, SyncReport, Termination,
};
pub use crate::domain::ports::{ConfigProvider, InventoryStore, LiveStateClient, Reconciler, Storage};
pub use crate::utils::error::Result;
