use crate::adapters::http::NetBoxClient;
use crate::adapters::memory::InMemoryStore;
use crate::adapters::napalm::NapalmClient;
use crate::adapters::netbox::NetBoxStore;
use crate::adapters::static_state::StaticLiveState;
use crate::adapters::storage::LocalStorage;
use crate::config::Job;
use crate::core::cable_sync::{CableOptions, CableReconciler};
use crate::core::engine::{DeviceSelector, SyncEngine};
use crate::core::interface_sync::{InterfaceOptions, InterfaceReconciler};
use crate::core::report::ReportWriter;
use crate::core::{ConfigProvider, InventoryStore, LiveStateClient, Storage, SyncReport};
use crate::utils::error::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Inventory {
    NetBox(NetBoxStore),
    Memory(InMemoryStore),
}

#[derive(Debug, Clone)]
enum LiveState {
    Napalm(NapalmClient),
    Captured(StaticLiveState),
}

/// Builds the adapters once from a [`ConfigProvider`] and runs jobs against
/// them. Jobs run through the same runner share one inventory, so a
/// rehearsal `cables` run sees the interfaces an earlier `interfaces` run
/// created.
#[derive(Debug)]
pub struct SyncRunner {
    inventory: Inventory,
    live: LiveState,
    device_pattern: String,
    ignore_interfaces: String,
    normalize_mac: bool,
    show_missing: bool,
    keep_going: bool,
    output: Option<LocalStorage>,
    report_formats: Vec<String>,
}

impl SyncRunner {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = || {
            NetBoxClient::new(
                config.netbox_url(),
                config.netbox_token(),
                Duration::from_secs(config.timeout_seconds()),
            )
        };

        let inventory = match config.inventory_file() {
            Some(path) => {
                tracing::info!("Using inventory seed {} instead of NetBox", path);
                let content = std::fs::read_to_string(path)?;
                Inventory::Memory(InMemoryStore::from_seed_json(&content)?)
            }
            None => Inventory::NetBox(NetBoxStore::new(client()?)),
        };

        let live = match config.live_state_file() {
            Some(path) => {
                tracing::info!("Replaying live state from {}", path);
                LiveState::Captured(StaticLiveState::from_file(path)?)
            }
            None => LiveState::Napalm(NapalmClient::new(client()?)),
        };

        Ok(Self {
            inventory,
            live,
            device_pattern: config.device_pattern().to_string(),
            ignore_interfaces: config.ignore_interfaces().to_string(),
            normalize_mac: config.normalize_mac(),
            show_missing: config.show_missing(),
            keep_going: config.keep_going(),
            output: config.output_path().map(|p| LocalStorage::new(p.to_string())),
            report_formats: config.report_formats().to_vec(),
        })
    }

    pub fn is_offline(&self) -> bool {
        matches!(
            (&self.inventory, &self.live),
            (Inventory::Memory(_), LiveState::Captured(_))
        )
    }

    /// Runs one job over every selected device, then writes the report (and,
    /// for a seeded inventory, the resulting records) when an output path is
    /// configured.
    pub async fn run(&self, job: Job) -> Result<SyncReport> {
        let report = match (&self.inventory, &self.live) {
            (Inventory::NetBox(store), LiveState::Napalm(live)) => {
                self.execute(job, store.clone(), live.clone()).await?
            }
            (Inventory::NetBox(store), LiveState::Captured(live)) => {
                self.execute(job, store.clone(), live.clone()).await?
            }
            (Inventory::Memory(store), LiveState::Napalm(live)) => {
                self.execute(job, store.clone(), live.clone()).await?
            }
            (Inventory::Memory(store), LiveState::Captured(live)) => {
                self.execute(job, store.clone(), live.clone()).await?
            }
        };

        self.write_outputs(&report).await?;
        Ok(report)
    }

    async fn execute<S, L>(&self, job: Job, store: S, live: L) -> Result<SyncReport>
    where
        S: InventoryStore + Clone,
        L: LiveStateClient,
    {
        let selector = DeviceSelector::new(&self.device_pattern)?;

        match job {
            Job::Interfaces => {
                let options = InterfaceOptions::new(&self.ignore_interfaces, self.normalize_mac)?;
                let reconciler = InterfaceReconciler::new(store.clone(), live, options);
                SyncEngine::new(store, reconciler, selector)
                    .keep_going(self.keep_going)
                    .run()
                    .await
            }
            Job::Cables => {
                let options = CableOptions {
                    show_missing: self.show_missing,
                };
                let reconciler = CableReconciler::new(store.clone(), live, options);
                SyncEngine::new(store, reconciler, selector)
                    .keep_going(self.keep_going)
                    .run()
                    .await
            }
        }
    }

    async fn write_outputs(&self, report: &SyncReport) -> Result<()> {
        let Some(storage) = &self.output else {
            return Ok(());
        };

        let written = ReportWriter::new(storage.clone())
            .write(report, &self.report_formats)
            .await?;
        for filename in &written {
            tracing::info!("Report written to {}/{}", storage.base_path(), filename);
        }

        if let Inventory::Memory(store) = &self.inventory {
            let filename = format!("{}_inventory.json", report.job);
            storage
                .write_file(&filename, store.to_json_pretty()?.as_bytes())
                .await?;
            tracing::info!("Inventory written to {}/{}", storage.base_path(), filename);
        }

        Ok(())
    }
}
