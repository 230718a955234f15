use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Image, RecognitionError, Recognizer};

/// A scripted recognizer for tests. Returns the same lines (or failure)
/// on every call, after an optional delay.
pub struct MockRecognizer {
    lines: Option<Vec<String>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn returning(lines: &[&str]) -> Self {
        Self {
            lines: Some(lines.iter().map(|l| l.to_string()).collect()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            lines: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(&self, _image: &Image) -> Result<Vec<String>, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.lines
            .clone()
            .ok_or_else(|| RecognitionError::Engine("MockRecognizer: scripted failure".to_string()))
    }
}
