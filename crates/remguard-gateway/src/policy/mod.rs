//! Policy layer (options, leaf validation, structural scan, cooldowns).
//!
//! Compiles endpoint options into an immutable `PolicySet` once at
//! registration, and provides the checks the dispatcher runs per call.

pub mod cooldown;
pub mod options;
pub mod scan;
pub mod validate;

pub use cooldown::{CooldownTracker, MIN_COOLDOWN_RESOLUTION};
pub use options::{Bounds, EndpointOptions, PolicySet};
pub use scan::{ScanContext, StructuralScanner, MAX_SCAN_DEPTH, MAX_TABLE_KEYS};
pub use validate::{check_type, validate_number, validate_string_length, Check, ValueValidator};
