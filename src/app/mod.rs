// Application layer: wires configuration, adapters and reconcilers into
// runnable jobs.

pub mod runner;

pub use runner::SyncRunner;
