//! Adapters for the condition gate.

pub mod toggle;

pub use toggle::ToggleTest;
