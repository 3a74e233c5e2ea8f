//! Channel telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (Coordinator or controllers).
//! It exists solely for observability and verification of the channel
//! invariants (mutual exclusion, debounce, barge-in ordering).
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain user content (transcripts, names).
//! Only phases, actions and counts are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
