//! # Conditioner Test Suite
//!
//! Cross-crate properties of the arbitration and lifecycle machinery.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Harness, delayed resolver, event log
//! └── integration/
//!     ├── arbitration.rs # at-most-one-active, priority, conditioned precedence
//!     ├── lifecycle.rs   # reselection, idempotent load/unload, execute contract
//!     └── teardown.rs    # late resolution, registry destroy
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cn-tests
//! cargo test -p cn-tests integration::arbitration::
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod integration;
