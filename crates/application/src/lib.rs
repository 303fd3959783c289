//! Courier application layer.
//!
//! Use cases orchestrate the domain through narrow ports; infrastructure
//! adapters implement the ports, and both binaries wire the graph together.

pub mod notifications;
pub mod ports;
pub mod testing;
