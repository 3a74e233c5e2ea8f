use std::collections::VecDeque;
use super::event::TelemetryEvent;
use crate::kernel::speech::input::InputPhase;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Observations with the microphone listening while output was speaking.
    /// Must stay zero.
    pub overlaps: u64,
    pub barge_ins: u64,
    pub dispatched: u64,
    pub restarts_scheduled: u64,
    pub suppressed_narrations: u64,
    pub stale_discards: u64,
    pub remote_fallbacks: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::Channels { input, output_speaking } => {
                if *input == InputPhase::Listening && *output_speaking {
                    snap.overlaps += 1;
                }
            }
            TelemetryEvent::BargeIn => snap.barge_ins += 1,
            TelemetryEvent::IntentDispatched(_) => snap.dispatched += 1,
            TelemetryEvent::RestartScheduled => snap.restarts_scheduled += 1,
            TelemetryEvent::NarrationSuppressed => snap.suppressed_narrations += 1,
            TelemetryEvent::StaleDiscarded => snap.stale_discards += 1,
            TelemetryEvent::RemoteFallback => snap.remote_fallbacks += 1,
        }
    }

    snap
}
