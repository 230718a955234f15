//! Recording host capabilities for tests.
//!
//! Each recorder pushes what it observed onto an unbounded channel so a
//! test can await the next event with a timeout.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::{
    Clipboard, ContentSurface, ImagePicker, ImageSource, Platform, RecognitionSurface,
    ShareSheet, UpdatePrompt,
};
use crate::recognition::Image;
use crate::recognition::orchestrator::OrchestratorOutput;

/// Something a recording capability observed.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Script(String),
    Loaded(String),
    Shared(Vec<String>),
    Copied(String),
    UpdateRequired(String),
    Presented,
    Loading(bool),
    Recognized(Vec<String>),
    Dismissed,
}

pub type HostEvents = mpsc::UnboundedReceiver<HostEvent>;

/// Records every host interaction in order.
pub struct RecordingHost {
    tx: mpsc::UnboundedSender<HostEvent>,
    fail_scripts: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> (Self, HostEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                fail_scripts: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Make every future `evaluate_script` call fail after recording it.
    pub fn fail_scripts(&self) {
        self.fail_scripts.store(true, Ordering::SeqCst);
    }

    fn record(&self, event: HostEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait]
impl ContentSurface for RecordingHost {
    async fn evaluate_script(&self, script: &str) -> Result<()> {
        self.record(HostEvent::Script(script.to_string()));
        if self.fail_scripts.load(Ordering::SeqCst) {
            bail!("script evaluation failed");
        }
        Ok(())
    }

    async fn load_url(&self, url: &str) -> Result<()> {
        self.record(HostEvent::Loaded(url.to_string()));
        Ok(())
    }
}

impl ShareSheet for RecordingHost {
    fn share(&self, items: &[String]) {
        self.record(HostEvent::Shared(items.to_vec()));
    }
}

impl Clipboard for RecordingHost {
    fn set_text(&self, text: &str) -> Result<()> {
        self.record(HostEvent::Copied(text.to_string()));
        Ok(())
    }
}

impl UpdatePrompt for RecordingHost {
    fn update_required(&self, store_url: &str) {
        self.record(HostEvent::UpdateRequired(store_url.to_string()));
    }
}

impl RecognitionSurface for RecordingHost {
    fn present(&self, _image: &Image, output: OrchestratorOutput) {
        self.record(HostEvent::Presented);

        let tx = self.tx.clone();
        let mut loading = output.loading;
        tokio::spawn(async move {
            while let Ok(value) = loading.recv().await {
                let _ = tx.send(HostEvent::Loading(value));
            }
        });

        let tx = self.tx.clone();
        let mut results = output.results;
        tokio::spawn(async move {
            while let Ok(result) = results.recv().await {
                let _ = tx.send(HostEvent::Recognized(result.lines().to_vec()));
            }
        });
    }

    fn dismiss(&self) {
        self.record(HostEvent::Dismissed);
    }
}

/// A [`Platform`] whose every capability but the picker records into one
/// [`RecordingHost`].
pub fn recording_platform(picker: Arc<dyn ImagePicker>) -> (Platform, Arc<RecordingHost>, HostEvents) {
    let (host, events) = RecordingHost::new();
    let host = Arc::new(host);
    let platform = Platform {
        picker,
        share: host.clone(),
        clipboard: host.clone(),
        prompt: host.clone(),
        content: host.clone(),
        recognition: host.clone(),
    };
    (platform, host, events)
}

/// Hands out one scripted image per call; `None` simulates a cancelled picker.
pub struct ScriptedPicker {
    image: Option<Image>,
    sources: Mutex<Vec<ImageSource>>,
}

impl ScriptedPicker {
    pub fn new(image: Option<Image>) -> Self {
        Self {
            image,
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn sources(&self) -> Vec<ImageSource> {
        self.sources.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImagePicker for ScriptedPicker {
    async fn pick_image(&self, source: ImageSource) -> Result<Option<Image>> {
        if let Ok(mut sources) = self.sources.lock() {
            sources.push(source);
        }
        Ok(self.image.clone())
    }
}
