pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    memory::InMemoryStore, napalm::NapalmClient, netbox::NetBoxStore,
    static_state::StaticLiveState, storage::LocalStorage,
};
pub use app::SyncRunner;
pub use config::{toml_config::TomlConfig, Job};
pub use core::{
    cable_sync::CableReconciler,
    engine::{DeviceSelector, SyncEngine},
    interface_sync::InterfaceReconciler,
};
pub use utils::error::{Result, SyncError};
