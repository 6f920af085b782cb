//! telemetry/mod.rs
//! Per-file counters, stage timers, and the immutable snapshot returned with
//! every successful outcome. Each worker owns its counters; nothing is shared.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
