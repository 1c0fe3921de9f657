//! Integration tests spanning gate, controllers, nodes and the registry.

mod arbitration;
mod lifecycle;
mod teardown;
