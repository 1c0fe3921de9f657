//! # CN-01 Condition Gate
//!
//! Turns a candidate's condition-set expression into a single, live
//! suitability flag.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): expression parsing, no I/O
//!   - `ConditionSet`: parsed `key:{expected}` terms joined by `and`
//! - **Ports Layer** (`ports/`): the test contract the gate consumes
//!   - `ConditionTest`: asynchronous assert plus a change source
//! - **Registry** (`registry`): `TestRegistry`, key → test
//! - **Adapters Layer** (`adapters/`): `ToggleTest`, a switchable test
//! - **Gate** (`gate`): `ConditionGate`, the aggregate evaluator
//!
//! ## Expression Syntax
//!
//! ```text
//! viewport:{wide} and not connection:{offline} and media:{(min-width:40em)}
//! ```
//!
//! All terms must hold. An empty expression is always suitable. An
//! unparsable expression or an unknown test key is unsuitable, reported as
//! a diagnostic rather than an error.
//!
//! ## Events
//!
//! | Topic | When |
//! |-------|------|
//! | `ready` | first evaluation completed |
//! | `change` | aggregate suitability flipped (never published redundantly) |

pub mod adapters;
pub mod domain;
pub mod error;
pub mod gate;
pub mod ports;
pub mod registry;

pub use adapters::ToggleTest;
pub use domain::{Condition, ConditionSet};
pub use error::ConditionError;
pub use gate::ConditionGate;
pub use ports::ConditionTest;
pub use registry::TestRegistry;
