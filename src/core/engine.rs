use crate::core::{Device, InventoryStore, Reconciler, SyncReport};
use crate::utils::error::Result;
use crate::utils::validation::validate_regex;
use regex::Regex;

/// Picks the managed devices by name. The pattern may match anywhere in the
/// name.
#[derive(Debug, Clone)]
pub struct DeviceSelector {
    pattern: Regex,
}

impl DeviceSelector {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: validate_regex("device_pattern", pattern)?,
        })
    }

    pub fn matches(&self, device_name: &str) -> bool {
        self.pattern.is_match(device_name)
    }

    pub async fn select<S: InventoryStore>(&self, store: &S) -> Result<Vec<Device>> {
        let devices = store.list_devices().await?;
        Ok(devices
            .into_iter()
            .filter(|device| self.matches(&device.name))
            .collect())
    }
}

pub struct SyncEngine<S: InventoryStore, R: Reconciler> {
    store: S,
    reconciler: R,
    selector: DeviceSelector,
    keep_going: bool,
}

impl<S: InventoryStore, R: Reconciler> SyncEngine<S, R> {
    pub fn new(store: S, reconciler: R, selector: DeviceSelector) -> Self {
        Self {
            store,
            reconciler,
            selector,
            keep_going: false,
        }
    }

    /// Carry on with the next device when one device fails instead of
    /// aborting the run.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    async fn sync_device(&self, device: &Device, report: &mut SyncReport) -> Result<()> {
        tracing::debug!("[{}] Fetching live state", device.name);
        let snapshot = self.reconciler.fetch(device).await?;
        self.reconciler.reconcile(device, snapshot, report).await
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let job = self.reconciler.job_name();
        let mut report = SyncReport::new(job);

        let devices = self.selector.select(&self.store).await?;
        tracing::info!("Starting {} sync for {} device(s)", job, devices.len());

        for device in &devices {
            match self.sync_device(device, &mut report).await {
                Ok(()) => report.devices_processed += 1,
                Err(e) if self.keep_going => {
                    tracing::error!("[{}] {} sync failed: {}", device.name, job, e);
                    report.devices_failed.push(device.name.clone());
                }
                Err(e) => return Err(e),
            }
        }

        report.finish();
        tracing::info!(
            "Finished {} sync: {} device(s) processed, {} failed, {} change(s) reported",
            job,
            report.devices_processed,
            report.devices_failed.len(),
            report.notifications.len()
        );

        Ok(report)
    }
}
