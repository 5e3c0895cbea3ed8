// Domain layer: records, live snapshots, notifications and the ports the
// reconcilers are written against.

pub mod model;
pub mod ports;
pub mod snapshot;
