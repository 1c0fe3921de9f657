//! Topics published by the conditioner components.

/// Gate: aggregate suitability flipped.
pub const CHANGE: &str = "change";

/// Gate: first evaluation completed.
pub const READY: &str = "ready";

/// Module controller: startup settled (resolved, failed, or deferred).
pub const INIT: &str = "init";

/// Module controller: resolved and suitable.
pub const AVAILABLE: &str = "available";

/// Module controller: no longer suitable.
pub const UNAVAILABLE: &str = "unavailable";

/// Module controller: instance created.
pub const LOAD: &str = "load";

/// Module controller: instance torn down.
pub const UNLOAD: &str = "unload";

/// Diagnostic channel for absorbed runtime failures.
pub const ERROR: &str = "error";
