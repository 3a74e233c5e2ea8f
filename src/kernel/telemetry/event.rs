use crate::intent::Action;
use crate::kernel::speech::input::InputPhase;

// Allowed: phases, actions, counts
// Forbidden: transcripts, spoken text, entity names

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Both channels as observed after a transition.
    Channels {
        input: InputPhase,
        output_speaking: bool,
    },

    /// New transcript preempted a narration.
    BargeIn,

    IntentDispatched(Action),

    RestartScheduled,

    /// Narration requested while muted; nothing was spoken.
    NarrationSuppressed,

    /// Async completion that arrived after it was superseded.
    StaleDiscarded,

    RemoteFallback,
}
