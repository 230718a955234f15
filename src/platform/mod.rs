//! Capabilities the bridge controller borrows from the host: image
//! acquisition, sharing, the clipboard, the forced-upgrade prompt, the
//! embedded content surface and the recognition screen.
//!
//! The controller only knows these traits. `terminal` implements them for
//! the command-line host, `mock` records calls for tests.

pub mod mock;
pub mod terminal;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::recognition::Image;
use crate::recognition::orchestrator::OrchestratorOutput;

/// Where an image should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Gallery,
}

/// Acquires one image. `Ok(None)` means the user backed out.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn pick_image(&self, source: ImageSource) -> Result<Option<Image>>;
}

pub trait ShareSheet: Send + Sync {
    fn share(&self, items: &[String]);
}

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Blocking prompt sending the user to the store for a forced upgrade.
pub trait UpdatePrompt: Send + Sync {
    fn update_required(&self, store_url: &str);
}

/// The embedded web content surface.
#[async_trait]
pub trait ContentSurface: Send + Sync {
    async fn evaluate_script(&self, script: &str) -> Result<()>;
    async fn load_url(&self, url: &str) -> Result<()>;
}

/// The screen shown while an image is being recognized.
pub trait RecognitionSurface: Send + Sync {
    /// Show `image` and bind the orchestrator's output channels.
    fn present(&self, image: &Image, output: OrchestratorOutput);
    fn dismiss(&self);
}

/// The full set of host capabilities handed to the controller.
#[derive(Clone)]
pub struct Platform {
    pub picker: Arc<dyn ImagePicker>,
    pub share: Arc<dyn ShareSheet>,
    pub clipboard: Arc<dyn Clipboard>,
    pub prompt: Arc<dyn UpdatePrompt>,
    pub content: Arc<dyn ContentSurface>,
    pub recognition: Arc<dyn RecognitionSurface>,
}
