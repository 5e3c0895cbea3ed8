// Adapters layer: concrete implementations of the domain ports for NetBox,
// NAPALM, captured state and the local disk.

pub mod http;
pub mod memory;
pub mod napalm;
pub mod netbox;
pub mod static_state;
pub mod storage;
