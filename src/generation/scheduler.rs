use std::{
    cell::RefCell,
    collections::{HashSet, VecDeque},
};

use tokio::sync::mpsc::UnboundedSender;

use crate::{
    foundation::core::Label,
    foundation::error::{AlbumError, AlbumResult},
    generation::generator::Generator,
    generation::state::{GenerationEvent, GenerationState, RoundId, RoundSummary},
};

/// Receives state changes proposed by the scheduler.
///
/// The scheduler never owns the authoritative result map; it only publishes.
pub trait UpdateSink {
    fn publish(&self, event: GenerationEvent);
}

impl<F: Fn(GenerationEvent)> UpdateSink for F {
    fn publish(&self, event: GenerationEvent) {
        self(event)
    }
}

impl UpdateSink for UnboundedSender<GenerationEvent> {
    fn publish(&self, event: GenerationEvent) {
        // A dropped receiver means the caller abandoned the round; late results are discarded.
        if self.send(event).is_err() {
            tracing::trace!("generation event dropped: receiver closed");
        }
    }
}

/// Result of a single-item regeneration request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The label was already pending; nothing was started.
    Suppressed,
    /// The item ran to this terminal state.
    Finished(GenerationState),
}

/// Bounded worker pool for generation rounds.
///
/// Workers are futures joined on the caller's task: "concurrency" is interleaving
/// at await points, never parallel threads, so the shared queue needs no lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduler {
    concurrency: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }
}

impl Scheduler {
    pub const DEFAULT_CONCURRENCY: usize = 2;

    pub fn new(concurrency: usize) -> AlbumResult<Self> {
        if concurrency == 0 {
            return Err(AlbumError::validation("scheduler concurrency must be >= 1"));
        }
        Ok(Self { concurrency })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Generate every label, at most `concurrency` calls in flight.
    ///
    /// Labels must be non-empty and distinct. Publishes `Pending` for all labels
    /// before any call starts, then one terminal state per label as soon as it
    /// resolves. Item failures are converted to
    /// [`GenerationState::Error`] and never fail the round.
    #[tracing::instrument(skip_all, fields(round = round.0, labels = labels.len(), concurrency = self.concurrency))]
    pub async fn run_round<G, S>(
        &self,
        round: RoundId,
        labels: &[Label],
        generator: &G,
        sink: &S,
    ) -> AlbumResult<RoundSummary>
    where
        G: Generator,
        S: UpdateSink + ?Sized,
    {
        check_round_labels(labels)?;

        for label in labels {
            sink.publish(GenerationEvent::new(
                round,
                label.clone(),
                GenerationState::Pending,
            ));
        }

        let queue = RefCell::new(labels.iter().cloned().collect::<VecDeque<_>>());
        let workers = self.concurrency.min(labels.len());
        let summaries = futures::future::join_all(
            (0..workers).map(|worker| drain_queue(worker, round, &queue, generator, sink)),
        )
        .await;

        let summary = summaries
            .into_iter()
            .fold(RoundSummary::default(), RoundSummary::merge);
        tracing::info!(done = summary.done, failed = summary.failed, "round finished");
        Ok(summary)
    }

    /// Re-run one label outside a round.
    ///
    /// `current` is the label's state as known by the caller; a `Pending` label is
    /// already queued or in flight, so the request is suppressed with zero calls.
    #[tracing::instrument(skip(self, current, generator, sink), fields(round = round.0))]
    pub async fn retry_one<G, S>(
        &self,
        round: RoundId,
        label: &Label,
        current: &GenerationState,
        generator: &G,
        sink: &S,
    ) -> RetryOutcome
    where
        G: Generator,
        S: UpdateSink + ?Sized,
    {
        if current.is_pending() {
            tracing::debug!("retry suppressed: item already pending");
            return RetryOutcome::Suppressed;
        }

        sink.publish(GenerationEvent::new(
            round,
            label.clone(),
            GenerationState::Pending,
        ));
        let state = generate_one(label, generator).await;
        sink.publish(GenerationEvent::new(round, label.clone(), state.clone()));
        RetryOutcome::Finished(state)
    }
}

/// A round needs at least one label and no label twice.
pub(crate) fn check_round_labels(labels: &[Label]) -> AlbumResult<()> {
    if labels.is_empty() {
        return Err(AlbumError::validation(
            "a generation round needs at least one label",
        ));
    }
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label) {
            return Err(AlbumError::validation(format!(
                "label '{label}' appears more than once in the round"
            )));
        }
    }
    Ok(())
}

async fn drain_queue<G, S>(
    worker: usize,
    round: RoundId,
    queue: &RefCell<VecDeque<Label>>,
    generator: &G,
    sink: &S,
) -> RoundSummary
where
    G: Generator,
    S: UpdateSink + ?Sized,
{
    let mut summary = RoundSummary::default();
    loop {
        // The borrow ends with this statement, before the next await.
        let next = queue.borrow_mut().pop_front();
        let Some(label) = next else {
            break;
        };
        tracing::trace!(worker, %label, "worker picked item");

        let state = generate_one(&label, generator).await;
        summary.record(&state);
        sink.publish(GenerationEvent::new(round, label, state));
    }
    summary
}

async fn generate_one<G>(label: &Label, generator: &G) -> GenerationState
where
    G: Generator,
{
    match generator.generate(label).await {
        Ok(image) => {
            tracing::debug!(%label, image = %image.reference(), "generation done");
            GenerationState::Done { image }
        }
        Err(err) => {
            tracing::warn!(%label, error = %err, "generation failed");
            GenerationState::Error {
                message: err.message,
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generation/scheduler.rs"]
mod tests;
