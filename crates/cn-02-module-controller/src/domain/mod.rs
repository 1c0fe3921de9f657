//! Domain layer for the module controller.

pub mod module;
pub mod phase;

pub use module::{BaseModule, Capabilities, Method, Module, ModuleContext};
pub use phase::ControllerPhase;
