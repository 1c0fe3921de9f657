//! # CN-03 Node Controller
//!
//! One node per host. The node owns the module controllers declared on its
//! host, in precedence order, and keeps at most one of them active.
//!
//! - `NodeController`: arbitration, execute forwarding, lookup, teardown
//! - `NodeContext`: bus, selector matcher and attribute names

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod node;

pub use node::{NodeContext, NodeController};
