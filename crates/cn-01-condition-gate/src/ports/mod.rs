//! Ports for the condition gate.

pub mod outbound;

pub use outbound::ConditionTest;
