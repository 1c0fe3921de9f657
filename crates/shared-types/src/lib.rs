//! # Shared Types Crate
//!
//! This crate contains the types every layer of the conditioner agrees on:
//! emitter identities for the bus, the host model candidates attach to,
//! candidate descriptors produced by discovery, the execute-call envelope
//! and the error taxonomy.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate types are defined here only.
//! - **Immutable Descriptors**: A `CandidateDescriptor` is never mutated after
//!   discovery hands it to a controller.
//! - **Construction Errors Are Loud**: Missing hosts, paths or candidates are
//!   returned as `ConstructionError`, everything else is absorbed at runtime.

pub mod descriptor;
pub mod emitter;
pub mod errors;
pub mod execute;
pub mod host;

pub use descriptor::CandidateDescriptor;
pub use emitter::EmitterId;
pub use errors::*;
pub use execute::ExecuteResponse;
pub use host::{attributes, AttributeSelector, Host, HostRef, SelectorMatcher};
