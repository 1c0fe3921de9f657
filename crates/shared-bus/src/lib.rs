//! # Shared Bus - Event Bus for Controller Coordination
//!
//! Every state change in the conditioner travels over this bus: gates tell
//! module controllers their suitability flipped, module controllers tell
//! their node they became available or unloaded, and live modules publish
//! their own events which are propagated up to the controller and the node.
//!
//! ## Dispatch Model
//!
//! ```text
//!   publish(A, "unload")
//!          │
//!          ▼
//!   ┌──────────────┐   snapshot of (A,"unload") callbacks, in order
//!   │  Event Bus   │ ──────────────────────────────────────────────→ cb1, cb2
//!   │              │
//!   │              │   propagation A → B, B → C
//!   │              │ ──────────────────────────────────────────────→ (B,"unload"), (C,"unload")
//!   └──────────────┘
//! ```
//!
//! - Callbacks run synchronously, over a snapshot taken when dispatch starts.
//! - A publish issued from inside a callback is queued and dispatched once
//!   the current event has reached all of its subscribers.
//! - The registration table is never locked while callbacks run.
//!
//! The bus is an explicit context object (`Arc<EventBus>`), so independent
//! instances never leak registrations into each other.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod error;
pub mod subscriptions;
pub mod topics;

pub use bus::{BusEvent, Callback, EventBus, SubscriptionId};
pub use error::BusError;
pub use subscriptions::SubscriptionSet;
