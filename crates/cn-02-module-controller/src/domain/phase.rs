//! Controller lifecycle phases.

use std::fmt;

/// Lifecycle phase of a module controller.
///
/// ```text
/// Idle ──suitable──→ Initializing ──resolved──→ Available ──load──→ Active
///  ↑                                               │  ↑               │
///  └────────────────── unsuitable ─────────────────┘  └── Unloading ←─┘
/// ```
///
/// A live instance exists exactly while the phase is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerPhase {
    #[default]
    Idle,
    Initializing,
    Available,
    Active,
    Unloading,
}

impl fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Available => "available",
            Self::Active => "active",
            Self::Unloading => "unloading",
        };
        f.write_str(name)
    }
}
