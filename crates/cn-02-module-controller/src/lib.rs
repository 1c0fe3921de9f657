//! # CN-02 Module Controller
//!
//! Owns one candidate implementation of a node: resolution, availability,
//! instantiation and teardown.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): the module contract and lifecycle phases
//!   - `Module`, `Capabilities`: a live instance and its named-method table
//!   - `ModuleContext`: host, options, bus and emitter handed to a factory
//!   - `BaseModule`: marks its host initialized while loaded
//! - **Ports Layer** (`ports/`): `ModuleResolver` (async) and `ModuleFactory`
//! - **Adapters Layer** (`adapters/`): `StaticResolver`, an in-memory table
//! - **Controller** (`controller`): `ModuleController`
//!
//! ## Lifecycle
//!
//! ```text
//! gate ready ──suitable──→ resolve ──ok──→ available → init
//!     │                        └──err──→ error → init   (latched)
//!     └──unsuitable──→ init   (resolution deferred)
//!
//! load()   → instance + propagation → load
//! unload() → unload hook, propagation dropped → unload
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod controller;
pub mod domain;
pub mod ports;

pub use adapters::StaticResolver;
pub use controller::{ControllerContext, ModuleController};
pub use domain::{BaseModule, Capabilities, ControllerPhase, Method, Module, ModuleContext};
pub use ports::{ModuleFactory, ModuleResolver};
