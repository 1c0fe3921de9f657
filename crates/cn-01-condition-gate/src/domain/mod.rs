//! Domain layer for the condition gate.

pub mod expression;

pub use expression::{Condition, ConditionSet};
