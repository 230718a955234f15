use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Image, RecognitionError, Recognizer};

/// Languages handed to the engine when none are configured.
pub const DEFAULT_LANGUAGES: &str = "kor+eng+jpn";

/// Configuration for the tesseract recognizer.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub binary: PathBuf,
    pub languages: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            languages: DEFAULT_LANGUAGES.to_string(),
        }
    }
}

/// Runs the `tesseract` CLI, piping the image through stdin.
pub struct TesseractRecognizer {
    config: TesseractConfig,
}

impl TesseractRecognizer {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Split engine output into trimmed, non-empty lines.
    fn split_lines(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl Recognizer for TesseractRecognizer {
    async fn recognize(&self, image: &Image) -> Result<Vec<String>, RecognitionError> {
        if image.is_empty() {
            return Err(RecognitionError::Decode("image is empty".to_string()));
        }

        let mut child = Command::new(&self.config.binary)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.languages)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecognitionError::Engine(format!("failed to start tesseract: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image.bytes())
                .await
                .map_err(|e| RecognitionError::Engine(format!("failed to feed image: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Decode(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(Self::split_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}
