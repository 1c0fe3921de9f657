//! Ports for the module controller.

pub mod outbound;

pub use outbound::{ModuleFactory, ModuleResolver};
