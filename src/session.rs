use std::future::Future;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::{
    foundation::core::{ImageSource, Label, LabelMap},
    foundation::error::{AlbumError, AlbumResult},
    generation::generator::Generator,
    generation::scheduler::{RetryOutcome, Scheduler, check_round_labels},
    generation::state::{GenerationEvent, GenerationState, ResultMap, RoundId, RoundSummary},
};

/// `label -> image` input to the compositor, in album order.
pub type CompositionInput = LabelMap<ImageSource>;

/// Counts of items per state in the current round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub pending: usize,
    pub done: usize,
    pub failed: usize,
}

/// Owner of the authoritative [`ResultMap`] for one user session.
///
/// The scheduler proposes changes as [`GenerationEvent`]s; only [`AlbumSession::apply`]
/// writes the map. Events from earlier rounds (after a reset or a new round) are ignored,
/// which is how abandoned work is discarded.
#[derive(Debug, Default)]
pub struct AlbumSession {
    round: RoundId,
    results: ResultMap,
}

impl AlbumSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn results(&self) -> &ResultMap {
        &self.results
    }

    pub fn state_of(&self, label: &Label) -> Option<&GenerationState> {
        self.results.get(label)
    }

    /// Start a new round: the map is replaced by `labels`, all `Pending`.
    pub fn begin_round(&mut self, labels: &[Label]) -> RoundId {
        self.round = self.round.next();
        self.results = labels
            .iter()
            .map(|label| (label.clone(), GenerationState::Pending))
            .collect();
        self.round
    }

    /// Apply one proposed update. Returns `false` for stale rounds and unknown labels.
    pub fn apply(&mut self, event: GenerationEvent) -> bool {
        if event.round != self.round {
            tracing::trace!(
                event_round = event.round.0,
                current_round = self.round.0,
                label = %event.label,
                "ignoring event from an earlier round"
            );
            return false;
        }
        match self.results.get_mut(&event.label) {
            Some(slot) => {
                *slot = event.state;
                true
            }
            None => {
                tracing::trace!(label = %event.label, "ignoring event for unknown label");
                false
            }
        }
    }

    /// Drop all results. Work still in flight for the old round is ignored when it lands.
    pub fn reset(&mut self) {
        self.round = self.round.next();
        self.results.clear();
    }

    pub fn is_generating(&self) -> bool {
        self.results.iter().any(|(_, s)| s.is_pending())
    }

    pub fn progress(&self) -> Progress {
        let mut out = Progress::default();
        for (_, state) in self.results.iter() {
            match state {
                GenerationState::Pending => out.pending += 1,
                GenerationState::Done { .. } => out.done += 1,
                GenerationState::Error { .. } => out.failed += 1,
            }
        }
        out
    }

    /// Completed entries only, in round order.
    pub fn composition_input(&self) -> CompositionInput {
        self.results
            .iter()
            .filter_map(|(label, state)| match state {
                GenerationState::Done { image } => Some((label.clone(), image.clone())),
                _ => None,
            })
            .collect()
    }

    /// Run a full round for `labels`, applying every update as it arrives.
    ///
    /// `on_event` observes each event after it has been applied (progress output, UI).
    pub async fn generate_all<G: Generator>(
        &mut self,
        scheduler: &Scheduler,
        generator: &G,
        labels: &[Label],
        on_event: impl FnMut(&GenerationEvent, &Self),
    ) -> AlbumResult<RoundSummary> {
        check_round_labels(labels)?;
        let round = self.begin_round(labels);
        self.pump(
            |tx| async move { scheduler.run_round(round, labels, generator, &tx).await },
            on_event,
        )
        .await
    }

    /// Regenerate one label of the current round.
    ///
    /// A label that is still `Pending` is left alone ([`RetryOutcome::Suppressed`]).
    pub async fn regenerate<G: Generator>(
        &mut self,
        label: &Label,
        scheduler: &Scheduler,
        generator: &G,
        on_event: impl FnMut(&GenerationEvent, &Self),
    ) -> AlbumResult<RetryOutcome> {
        let current = self
            .state_of(label)
            .cloned()
            .ok_or_else(|| AlbumError::validation(format!("unknown label '{label}'")))?;
        let round = self.round;
        let outcome = self
            .pump(
                |tx| async move {
                    scheduler
                        .retry_one(round, label, &current, generator, &tx)
                        .await
                },
                on_event,
            )
            .await;
        Ok(outcome)
    }

    async fn pump<P, Fut, T>(
        &mut self,
        produce: P,
        mut on_event: impl FnMut(&GenerationEvent, &Self),
    ) -> T
    where
        P: FnOnce(UnboundedSender<GenerationEvent>) -> Fut,
        Fut: Future<Output = T>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        // The producer owns the only sender, so the receiver drains once it finishes.
        let producer = produce(tx);
        let consumer = async {
            while let Some(event) = rx.recv().await {
                let shown = event.clone();
                if self.apply(event) {
                    on_event(&shown, &*self);
                }
            }
        };
        let (out, ()) = futures::join!(producer, consumer);
        out
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
