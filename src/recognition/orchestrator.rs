//! Drives one recognition operation from a trigger to its terminal
//! loading/result sequence.
//!
//! Every run publishes `loading(true)`, then exactly one result, then
//! `loading(false)`. Engine failures are swallowed and reported as an
//! empty result. A run dropped before it finishes still emits
//! `loading(false)` but publishes no result.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use super::{Image, RecognitionResult, Recognizer};
use crate::events::Broadcast;
use crate::tasks::TaskRegistry;

const TRIGGER_TASK: &str = "RecognitionTrigger";

/// Receivers for the two output channels of an orchestrator.
pub struct OrchestratorOutput {
    pub loading: broadcast::Receiver<bool>,
    pub results: broadcast::Receiver<RecognitionResult>,
}

struct Channels {
    image: Image,
    recognizer: Arc<dyn Recognizer>,
    loading: Broadcast<bool>,
    results: Broadcast<RecognitionResult>,
    // Overlapping runs would interleave their emissions.
    flight: Mutex<()>,
}

impl Channels {
    async fn run(&self) -> RecognitionResult {
        let _flight = self.flight.lock().await;

        self.loading.emit(true);
        let loading = LoadingGuard(&self.loading);
        let result = match self.recognizer.recognize(&self.image).await {
            Ok(lines) => RecognitionResult::from(lines),
            Err(e) => {
                warn!(error = %e, "recognition failed, reporting empty result");
                RecognitionResult::default()
            }
        };
        debug!(lines = result.lines().len(), "recognition finished");
        self.results.emit(result.clone());
        drop(loading);
        result
    }
}

/// Emits `loading(false)` when dropped, so a run abandoned mid-flight
/// still closes its loading state.
struct LoadingGuard<'a>(&'a Broadcast<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.emit(false);
    }
}

/// Holds one image and runs the recognizer over it on demand.
pub struct RecognitionOrchestrator {
    channels: Arc<Channels>,
    tasks: TaskRegistry,
}

impl RecognitionOrchestrator {
    pub fn new(image: Image, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            channels: Arc::new(Channels {
                image,
                recognizer,
                loading: Broadcast::default(),
                results: Broadcast::default(),
                flight: Mutex::new(()),
            }),
            tasks: TaskRegistry::new(),
        }
    }

    pub fn image(&self) -> &Image {
        &self.channels.image
    }

    /// Attach new receivers. Values emitted before this call are not replayed.
    pub fn subscribe(&self) -> OrchestratorOutput {
        OrchestratorOutput {
            loading: self.channels.loading.subscribe(),
            results: self.channels.results.subscribe(),
        }
    }

    /// Run once and return the published result.
    pub async fn run(&self) -> RecognitionResult {
        self.channels.run().await
    }

    /// Run once per event on `trigger` until it ends or the orchestrator
    /// is dropped. The returned receivers are attached before the first
    /// trigger is read, so they see every run.
    pub fn transform<S>(&self, mut trigger: S) -> OrchestratorOutput
    where
        S: Stream<Item = ()> + Send + Unpin + 'static,
    {
        let output = self.subscribe();
        let channels = Arc::clone(&self.channels);

        self.tasks.spawn(TRIGGER_TASK, |token| async move {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    next = trigger.next() => next,
                };
                if next.is_none() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = channels.run() => {}
                }
            }
            debug!("recognition trigger loop ended");
        });

        output
    }
}
