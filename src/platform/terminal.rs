//! Host capabilities for the command-line shell.
//!
//! stdout carries the scripting calls meant for the content surface, one
//! per line. Everything meant for the human goes to stderr.

use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

use super::{
    Clipboard, ContentSurface, ImagePicker, ImageSource, RecognitionSurface, ShareSheet,
    UpdatePrompt,
};
use crate::recognition::Image;
use crate::recognition::orchestrator::OrchestratorOutput;
use crate::spinner;

/// Picks fixed files configured on the command line. An unconfigured
/// source behaves like a user cancelling the picker.
pub struct FilePicker {
    pub camera: Option<PathBuf>,
    pub gallery: Option<PathBuf>,
}

#[async_trait]
impl ImagePicker for FilePicker {
    async fn pick_image(&self, source: ImageSource) -> Result<Option<Image>> {
        let path = match source {
            ImageSource::Camera => &self.camera,
            ImageSource::Gallery => &self.gallery,
        };
        match path {
            Some(path) => Ok(Some(Image::from_path(path).await?)),
            None => {
                eprintln!("  no image configured for {source:?}, picker cancelled");
                Ok(None)
            }
        }
    }
}

/// Writes scripting calls to stdout.
pub struct StdoutSurface;

#[async_trait]
impl ContentSurface for StdoutSurface {
    async fn evaluate_script(&self, script: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{script}")?;
        out.flush()?;
        Ok(())
    }

    async fn load_url(&self, url: &str) -> Result<()> {
        info!(%url, "loading content surface");
        let mut out = std::io::stdout().lock();
        writeln!(out, "window.location.assign('{}');", url.replace('\'', ""))?;
        out.flush()?;
        Ok(())
    }
}

/// Prints shared items instead of presenting a share sheet.
pub struct TerminalShare;

impl ShareSheet for TerminalShare {
    fn share(&self, items: &[String]) {
        if items.is_empty() {
            eprintln!("  share: nothing to share");
        }
        for item in items {
            eprintln!("  share: {item}");
        }
    }
}

/// Process-local clipboard.
#[derive(Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn text(&self) -> Option<String> {
        self.text.lock().ok().and_then(|t| t.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut slot = self
            .text
            .lock()
            .map_err(|_| anyhow::anyhow!("clipboard lock poisoned"))?;
        *slot = Some(text.to_string());
        Ok(())
    }
}

/// Announces the forced upgrade and opens the store page in a browser.
pub struct BrowserUpdatePrompt {
    pub open_browser: bool,
}

impl UpdatePrompt for BrowserUpdatePrompt {
    fn update_required(&self, store_url: &str) {
        eprintln!("\n  An update is required to keep using Misik.");
        eprintln!("  Get it here: {store_url}\n");
        if self.open_browser
            && let Err(e) = open::that(store_url)
        {
            warn!(error = %e, "failed to open store page");
        }
    }
}

/// Shows a spinner while recognition runs and prints the recognized lines.
pub struct SpinnerRecognitionSurface;

impl RecognitionSurface for SpinnerRecognitionSurface {
    fn present(&self, image: &Image, output: OrchestratorOutput) {
        eprintln!("  scanning image ({} bytes)", image.len());
        spinner::follow(output.loading, "recognizing");

        let mut results = output.results;
        tokio::spawn(async move {
            while let Ok(result) = results.recv().await {
                if result.is_empty() {
                    eprintln!("  no text recognized");
                }
                for line in result.lines() {
                    eprintln!("  | {line}");
                }
            }
        });
    }

    fn dismiss(&self) {
        eprintln!("  scan closed");
    }
}
