use std::cell::{Cell, RefCell};

use super::*;
use crate::{
    foundation::core::ImageRef,
    generation::{generator::generator_fn, state::GenerationFailure},
};

fn labels(names: &[&str]) -> Vec<Label> {
    names.iter().map(|n| Label::from(*n)).collect()
}

/// Tracks calls and in-flight peaks; each call yields a label-dependent number of times
/// so completions interleave out of request order.
#[derive(Default)]
struct CallLog {
    calls: RefCell<Vec<Label>>,
    in_flight: Cell<usize>,
    peak: Cell<usize>,
}

impl CallLog {
    async fn call(&self, label: Label, fail: bool) -> Result<ImageRef, GenerationFailure> {
        self.calls.borrow_mut().push(label.clone());
        self.in_flight.set(self.in_flight.get() + 1);
        self.peak.set(self.peak.get().max(self.in_flight.get()));

        let yields = label.as_str().len() % 3 + 1;
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }

        self.in_flight.set(self.in_flight.get() - 1);
        if fail {
            Err(GenerationFailure::new(format!("{label} rejected")))
        } else {
            Ok(ImageRef::from_bytes(label.as_str().as_bytes().to_vec()))
        }
    }
}

#[tokio::test]
async fn round_calls_each_label_once_and_respects_the_limit() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, false));
    let events = RefCell::new(Vec::<GenerationEvent>::new());
    let sink = |event: GenerationEvent| events.borrow_mut().push(event);

    let input = labels(&["1950s", "1960s", "1970s"]);
    let summary = Scheduler::default()
        .run_round(RoundId(1), &input, &generator, &sink)
        .await
        .unwrap();

    assert_eq!(summary, RoundSummary { done: 3, failed: 0 });
    let mut called = log.calls.borrow().clone();
    called.sort();
    assert_eq!(called, input);
    assert_eq!(log.peak.get(), 2);
    assert_eq!(log.in_flight.get(), 0);

    let events = events.into_inner();
    assert_eq!(events.len(), 6);
    let done = events.iter().filter(|e| e.state.is_done()).count();
    assert_eq!(done, 3);
    assert!(events.iter().all(|e| e.round == RoundId(1)));
}

#[tokio::test]
async fn pending_is_published_for_every_label_before_any_call() {
    let log = CallLog::default();
    let events = RefCell::new(Vec::<GenerationEvent>::new());
    let generator = generator_fn(|label| {
        let pending_seen = events
            .borrow()
            .iter()
            .filter(|e| e.state.is_pending())
            .count();
        assert_eq!(pending_seen, 4);
        log.call(label, false)
    });
    let sink = |event: GenerationEvent| events.borrow_mut().push(event);

    let input = labels(&["1950s", "1960s", "1970s", "1980s"]);
    Scheduler::default()
        .run_round(RoundId(0), &input, &generator, &sink)
        .await
        .unwrap();

    let events = events.into_inner();
    assert!(events[..4].iter().all(|e| e.state.is_pending()));
    assert_eq!(events.len(), 8);
}

#[tokio::test]
async fn workers_draw_from_the_queue_in_fifo_order() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, false));
    let sink = |_event: GenerationEvent| {};

    let input = labels(&["a", "b", "c", "d", "e", "f"]);
    Scheduler::new(3)
        .unwrap()
        .run_round(RoundId(0), &input, &generator, &sink)
        .await
        .unwrap();

    assert_eq!(*log.calls.borrow(), input);
    assert!(log.peak.get() <= 3);
}

#[tokio::test]
async fn always_failing_generator_marks_every_label_as_error() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, true));
    let events = RefCell::new(Vec::<GenerationEvent>::new());
    let sink = |event: GenerationEvent| events.borrow_mut().push(event);

    let input = labels(&["1950s", "1960s", "1970s", "1980s", "1990s"]);
    let summary = Scheduler::default()
        .run_round(RoundId(0), &input, &generator, &sink)
        .await
        .unwrap();

    assert_eq!(summary, RoundSummary { done: 0, failed: 5 });
    assert_eq!(summary.total(), 5);
    let errors: Vec<_> = events
        .into_inner()
        .into_iter()
        .filter_map(|e| match e.state {
            GenerationState::Error { message } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 5);
    assert!(errors.iter().any(|m| m == "1950s rejected"));
}

#[tokio::test]
async fn concurrency_is_capped_by_label_count() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, false));
    let sink = |_event: GenerationEvent| {};

    Scheduler::new(8)
        .unwrap()
        .run_round(RoundId(0), &labels(&["only"]), &generator, &sink)
        .await
        .unwrap();
    assert_eq!(log.peak.get(), 1);
    assert_eq!(log.calls.borrow().len(), 1);
}

#[tokio::test]
async fn empty_round_is_rejected() {
    let generator = generator_fn(|_label| async { Err(GenerationFailure::new("unused")) });
    let sink = |_event: GenerationEvent| {};
    let err = Scheduler::default()
        .run_round(RoundId(0), &[], &generator, &sink)
        .await
        .unwrap_err();
    assert!(matches!(err, AlbumError::Validation(_)));
}

#[tokio::test]
async fn duplicate_labels_are_rejected_before_any_call() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, false));
    let events = RefCell::new(Vec::new());
    let sink = |event: GenerationEvent| events.borrow_mut().push(event);

    let err = Scheduler::default()
        .run_round(
            RoundId(1),
            &labels(&["1950s", "1960s", "1950s"]),
            &generator,
            &sink,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AlbumError::Validation(_)), "{err:?}");
    assert!(err.to_string().contains("1950s"));
    assert!(log.calls.borrow().is_empty());
    assert!(events.borrow().is_empty());
}

#[test]
fn zero_concurrency_is_rejected() {
    assert!(Scheduler::new(0).is_err());
    assert_eq!(Scheduler::default().concurrency(), 2);
}

#[tokio::test]
async fn retry_of_pending_item_is_suppressed() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, false));
    let events = RefCell::new(Vec::<GenerationEvent>::new());
    let sink = |event: GenerationEvent| events.borrow_mut().push(event);

    let outcome = Scheduler::default()
        .retry_one(
            RoundId(0),
            &Label::from("1970s"),
            &GenerationState::Pending,
            &generator,
            &sink,
        )
        .await;

    assert_eq!(outcome, RetryOutcome::Suppressed);
    assert!(log.calls.borrow().is_empty());
    assert!(events.borrow().is_empty());
}

#[tokio::test]
async fn retry_of_failed_item_runs_once_and_reports() {
    let log = CallLog::default();
    let generator = generator_fn(|label| log.call(label, false));
    let events = RefCell::new(Vec::<GenerationEvent>::new());
    let sink = |event: GenerationEvent| events.borrow_mut().push(event);

    let previous = GenerationState::Error {
        message: "timeout".to_string(),
    };
    let outcome = Scheduler::default()
        .retry_one(RoundId(4), &Label::from("1970s"), &previous, &generator, &sink)
        .await;

    let RetryOutcome::Finished(state) = outcome else {
        panic!("expected the retry to run");
    };
    assert!(state.is_done());
    assert_eq!(log.calls.borrow().len(), 1);

    let events = events.into_inner();
    assert_eq!(events.len(), 2);
    assert!(events[0].state.is_pending());
    assert_eq!(events[1].state, state);
    assert!(events.iter().all(|e| e.round == RoundId(4)));
}

#[tokio::test]
async fn closed_channel_swallows_late_events() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<GenerationEvent>();
    drop(rx);
    let generator = generator_fn(|label: Label| async move {
        Ok(ImageRef::from_bytes(label.as_str().as_bytes().to_vec()))
    });

    let summary = Scheduler::default()
        .run_round(RoundId(0), &labels(&["1950s", "1960s"]), &generator, &tx)
        .await
        .unwrap();
    assert_eq!(summary.done, 2);
}
