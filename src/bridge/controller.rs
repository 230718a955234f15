//! End-to-end handling of bridge commands.
//!
//! Every piece of work the controller starts is registered in its
//! [`TaskRegistry`] under a well-known identifier, so starting the same
//! kind of work again supersedes the old run and tearing the controller
//! down cancels everything in flight. Failures never reach the content
//! surface raw: they become an empty-result notification, a silent abort
//! on cancellation, or the forced-upgrade prompt.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::command::{BridgeCommand, BridgeMessage};
use super::notification::{BridgeNotification, NotificationSender};
use crate::platform::{ImageSource, Platform};
use crate::recognition::orchestrator::RecognitionOrchestrator;
use crate::recognition::{Image, RecognitionResult, Recognizer};
use crate::review::{ClientError, ReviewRequest, ReviewService};
use crate::tasks::{CancelToken, TaskRegistry};

pub const PICK_IMAGE_TASK: &str = "PickImage";
pub const RECOGNITION_TASK: &str = "Recognition";
pub const PARSE_TASK: &str = "ParseAndSendOCRResult";
pub const SCAN_DELIVERY_TASK: &str = "SendScanResult";
pub const CREATE_REVIEW_TASK: &str = "CreateReview";
pub const KEYBOARD_TASK: &str = "KeyboardHeight";

struct Shared {
    review: Arc<dyn ReviewService>,
    recognizer: Arc<dyn Recognizer>,
    platform: Platform,
    sender: NotificationSender,
    tasks: TaskRegistry,
}

/// Glue between the content surface and the recognition and review
/// capabilities. Owns the task scope of one screen.
pub struct BridgeController {
    shared: Arc<Shared>,
}

impl BridgeController {
    pub fn new(
        review: Arc<dyn ReviewService>,
        recognizer: Arc<dyn Recognizer>,
        platform: Platform,
        delivery_delay: Duration,
    ) -> Self {
        let sender = NotificationSender::new(Arc::clone(&platform.content), delivery_delay);
        Self {
            shared: Arc::new(Shared {
                review,
                recognizer,
                platform,
                sender,
                tasks: TaskRegistry::new(),
            }),
        }
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.shared.tasks
    }

    /// Decode and dispatch a raw message from the content surface.
    pub fn handle_message(&self, message: &BridgeMessage) {
        match BridgeCommand::decode(message) {
            Ok(Some(command)) => self.handle(command),
            Ok(None) => debug!(name = %message.name, "ignoring unknown bridge message"),
            Err(e) => {
                warn!(name = %message.name, error = %e, "malformed bridge message");
                // The surface is waiting on a reply for this one.
                if message.name == "createReview" {
                    self.shared.respond_review_failed();
                }
            }
        }
    }

    pub fn handle(&self, command: BridgeCommand) {
        info!(command = command.name(), "bridge command");
        match command {
            BridgeCommand::OpenCamera => self.shared.pick_and_recognize(ImageSource::Camera),
            BridgeCommand::OpenGallery => self.shared.pick_and_recognize(ImageSource::Gallery),
            BridgeCommand::Share { text } => {
                let items: Vec<String> = text.into_iter().collect();
                self.shared.platform.share.share(&items);
            }
            BridgeCommand::CreateReview(request) => self.shared.create_review(request),
            BridgeCommand::Copy { text } => {
                if let Err(e) = self.shared.platform.clipboard.set_text(&text) {
                    warn!(error = %e, "failed to copy review");
                }
            }
        }
    }

    /// Present the recognition screen for `image` and run recognition.
    pub fn start_recognition(&self, image: Image) {
        self.shared.start_recognition(image);
    }

    /// Parse `result` remotely, then dismiss the recognition screen and
    /// deliver one scan result. Supersedes any parse still in flight.
    pub fn finish_recognition(&self, result: RecognitionResult) {
        self.shared.finish_recognition(result);
    }

    /// The user closed the recognition screen: nothing started for it may
    /// deliver afterwards. A scan result already past its dismissal is
    /// still delivered.
    pub fn recognition_dismissed(&self) {
        self.shared.tasks.cancel(RECOGNITION_TASK);
        self.shared.tasks.cancel(PARSE_TASK);
    }

    /// Relay the on-screen keyboard height. `0.0` means hidden.
    pub fn keyboard_changed(&self, pixels: f64) {
        let shared = Arc::clone(&self.shared);
        self.shared.tasks.spawn(KEYBOARD_TASK, |token| async move {
            shared
                .deliver(&token, BridgeNotification::KeyboardHeight { pixels })
                .await;
        });
    }

    /// Fetch the content surface URL and load it. Returns the URL on success.
    pub async fn load_home(&self) -> Option<String> {
        match self.shared.review.home_url().await {
            Ok(url) => {
                if let Err(e) = self.shared.platform.content.load_url(&url).await {
                    warn!(%url, error = %e, "failed to load content surface");
                }
                Some(url)
            }
            Err(e) => {
                self.shared.report_failure("home", &e);
                None
            }
        }
    }
}

impl Drop for BridgeController {
    fn drop(&mut self) {
        self.shared.tasks.cancel_all();
    }
}

impl Shared {
    /// Deliver unless the owning task was cancelled first.
    async fn deliver(&self, token: &CancelToken, notification: BridgeNotification) {
        if token.is_cancelled() {
            return;
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => debug!(function = notification.function(), "delivery cancelled"),
            _ = self.sender.send(&notification) => {}
        }
    }

    /// Raise the upgrade prompt if `err` asks for it, otherwise log.
    /// Returns `true` when the prompt was shown.
    fn report_failure(&self, operation: &str, err: &ClientError) -> bool {
        if let Some(store_url) = err.update_required() {
            warn!(operation, %store_url, "client update required");
            self.platform.prompt.update_required(store_url);
            return true;
        }
        warn!(operation, error = %err, "review API call failed");
        false
    }

    fn respond_review_failed(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.tasks.spawn(CREATE_REVIEW_TASK, |token| async move {
            shared
                .deliver(
                    &token,
                    BridgeNotification::GeneratedReview {
                        text: String::new(),
                    },
                )
                .await;
        });
    }

    fn pick_and_recognize(self: &Arc<Self>, source: ImageSource) {
        let shared = Arc::clone(self);
        self.tasks.spawn(PICK_IMAGE_TASK, |token| async move {
            let picked = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                picked = shared.platform.picker.pick_image(source) => picked,
            };
            match picked {
                Ok(Some(image)) => shared.start_recognition(image),
                Ok(None) => debug!(?source, "image picker cancelled"),
                Err(e) => warn!(?source, error = %e, "image picker failed"),
            }
        });
    }

    fn start_recognition(self: &Arc<Self>, image: Image) {
        let shared = Arc::clone(self);
        self.tasks.spawn(RECOGNITION_TASK, |token| async move {
            let orchestrator = RecognitionOrchestrator::new(image, Arc::clone(&shared.recognizer));
            shared
                .platform
                .recognition
                .present(orchestrator.image(), orchestrator.subscribe());

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                result = orchestrator.run() => result,
            };
            if !token.is_cancelled() {
                shared.finish_recognition(result);
            }
        });
    }

    fn finish_recognition(self: &Arc<Self>, result: RecognitionResult) {
        let shared = Arc::clone(self);
        self.tasks.spawn(PARSE_TASK, |token| async move {
            let text = result.text();
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(ClientError::Cancelled),
                outcome = shared.review.parse_ocr_text(&text) => outcome,
            };

            let scan = match outcome {
                Ok(parsed) if parsed.is_empty() => String::new(),
                Ok(parsed) => parsed.to_payload(),
                Err(e) if e.is_cancelled() => {
                    debug!("scan parsing cancelled");
                    shared.platform.recognition.dismiss();
                    return;
                }
                Err(e) => {
                    if shared.report_failure("parse", &e) {
                        shared.platform.recognition.dismiss();
                        return;
                    }
                    String::new()
                }
            };

            if token.is_cancelled() {
                return;
            }
            shared.platform.recognition.dismiss();
            // Our own dismissal must not cancel the result it precedes.
            let delivery = Arc::clone(&shared);
            shared.tasks.spawn(SCAN_DELIVERY_TASK, |token| async move {
                delivery
                    .deliver(&token, BridgeNotification::ScanResult { text: scan })
                    .await;
            });
        });
    }

    fn create_review(self: &Arc<Self>, request: ReviewRequest) {
        let shared = Arc::clone(self);
        self.tasks.spawn(CREATE_REVIEW_TASK, |token| async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(ClientError::Cancelled),
                outcome = shared.generate(&request) => outcome,
            };

            let text = match outcome {
                Ok(text) => text,
                Err(e) if e.is_cancelled() => return,
                Err(e) => {
                    if shared.report_failure("review", &e) {
                        return;
                    }
                    String::new()
                }
            };
            shared
                .deliver(&token, BridgeNotification::GeneratedReview { text })
                .await;
        });
    }

    /// Create a review and fetch its generated body.
    async fn generate(&self, request: &ReviewRequest) -> Result<String, ClientError> {
        let id = self.review.create_review(request).await?;
        debug!(%id, "review created");
        let record = self.review.fetch_review(&id).await?;
        Ok(record.text().unwrap_or_default().to_string())
    }
}
