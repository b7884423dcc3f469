use crate::foundation::core::{ImageRef, Label, LabelMap};

/// Outcome of one label within the current round. Exactly one variant holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationState {
    /// Queued or in flight.
    Pending,
    /// Generated successfully.
    Done { image: ImageRef },
    /// The generation call failed; `message` is human-readable.
    Error { message: String },
}

impl GenerationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Per-label generation state for one round, in request order.
pub type ResultMap = LabelMap<GenerationState>;

/// Identifier of a generation round within a session. Later rounds compare greater.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundId(pub u64);

impl RoundId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A proposed state change published by the scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationEvent {
    pub round: RoundId,
    pub label: Label,
    pub state: GenerationState,
}

impl GenerationEvent {
    pub fn new(round: RoundId, label: Label, state: GenerationState) -> Self {
        Self {
            round,
            label,
            state,
        }
    }
}

/// Failure of a single remote generation call.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationFailure {
    pub message: String,
}

impl GenerationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Tally of terminal states at the end of a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub done: usize,
    pub failed: usize,
}

impl RoundSummary {
    pub(crate) fn record(&mut self, state: &GenerationState) {
        match state {
            GenerationState::Done { .. } => self.done += 1,
            GenerationState::Error { .. } => self.failed += 1,
            GenerationState::Pending => {}
        }
    }

    pub(crate) fn merge(mut self, other: Self) -> Self {
        self.done += other.done;
        self.failed += other.failed;
        self
    }

    pub fn total(&self) -> usize {
        self.done + self.failed
    }
}
