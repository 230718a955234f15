//! Send side of the bridge: notifications encoded as calls into the
//! content surface's `window.response` namespace.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::platform::ContentSurface;

/// Script object that owns every callback.
pub const SCRIPT_NAMESPACE: &str = "window.response";

/// Sent in place of an empty result so the surface can tell that the
/// operation ran but produced nothing.
pub const EMPTY_RESULT_SENTINEL: &str = "error";

/// Notifications sendable to the content surface.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeNotification {
    /// Parsed scan text; empty means the scan or the parse failed.
    ScanResult { text: String },
    /// Generated review body; empty means generation failed.
    GeneratedReview { text: String },
    KeyboardHeight { pixels: f64 },
}

impl BridgeNotification {
    /// Callback name inside [`SCRIPT_NAMESPACE`].
    pub fn function(&self) -> &'static str {
        match self {
            Self::ScanResult { .. } => "receiveScanResult",
            Self::GeneratedReview { .. } => "receiveGeneratedReview",
            Self::KeyboardHeight { .. } => "receiveKeyboardHeight",
        }
    }

    /// The single string argument passed to the callback.
    pub fn payload(&self) -> String {
        match self {
            Self::ScanResult { text } if text.is_empty() => EMPTY_RESULT_SENTINEL.to_string(),
            Self::ScanResult { text } => text.clone(),
            Self::GeneratedReview { text } => {
                let result = if text.is_empty() {
                    EMPTY_RESULT_SENTINEL
                } else {
                    text.as_str()
                };
                serde_json::json!({ "result": result }).to_string()
            }
            Self::KeyboardHeight { pixels } => {
                serde_json::json!({ "height": format!("{pixels}") }).to_string()
            }
        }
    }

    /// The full JavaScript statement delivered to the surface.
    pub fn script(&self) -> String {
        format!(
            "{SCRIPT_NAMESPACE}.{}('{}');",
            self.function(),
            script_safe(&self.payload())
        )
    }
}

/// Make `payload` safe inside a single-quoted script literal. Single
/// quotes are dropped; line breaks and backslashes are escaped so the
/// callback receives the payload unchanged otherwise.
fn script_safe(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    for c in payload.chars() {
        match c {
            '\'' => {}
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Fire-and-forget delivery of notifications to a [`ContentSurface`].
pub struct NotificationSender {
    surface: Arc<dyn ContentSurface>,
    delay: Duration,
}

impl NotificationSender {
    pub fn new(surface: Arc<dyn ContentSurface>, delay: Duration) -> Self {
        Self { surface, delay }
    }

    /// Wait out the delivery delay, then run the callback. Failures are
    /// logged and dropped.
    pub async fn send(&self, notification: &BridgeNotification) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let script = notification.script();
        debug!(function = notification.function(), "delivering notification");
        if let Err(e) = self.surface.evaluate_script(&script).await {
            warn!(function = notification.function(), error = %e, "script delivery failed");
        }
    }
}
