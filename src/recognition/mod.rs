pub mod mock;
pub mod orchestrator;
pub mod tesseract;

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Raw encoded image bytes, exactly as acquired from a camera or gallery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {}", path.display()))?;
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Recognized lines in engine order. Possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecognitionResult {
    lines: Vec<String>,
}

impl RecognitionResult {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with `\n`, the form sent on to the parsing service.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl From<Vec<String>> for RecognitionResult {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("image could not be decoded: {0}")]
    Decode(String),
    #[error("recognition engine failed: {0}")]
    Engine(String),
}

/// The on-device text recognizer. Stateless; safe to call concurrently.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &Image) -> Result<Vec<String>, RecognitionError>;
}
