pub mod http;
pub mod mock;
pub mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    #[serde(rename = "ocrText")]
    pub ocr_text: String,
    #[serde(rename = "hashTag")]
    pub tags: Vec<String>,
    #[serde(rename = "reviewStyle")]
    pub style: String,
}

/// A generated review as returned by `GET /reviews/{id}`.
/// `review` stays `None` until generation has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "isSuccess")]
    pub is_success: bool,
    #[serde(deserialize_with = "wire::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub review: Option<String>,
}

impl ReviewRecord {
    /// The generated text, if generation succeeded and produced any.
    pub fn text(&self) -> Option<&str> {
        if !self.is_success {
            return None;
        }
        self.review.as_deref().filter(|text| !text.is_empty())
    }
}

/// Result of `POST /reviews/ocr-parsing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOcr {
    /// Current revision: `{"parsed": [{key: value}, ...]}`.
    Structured(Vec<BTreeMap<String, String>>),
    /// Legacy revision: the polished text itself.
    Plain(String),
}

impl ParsedOcr {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Structured(rows) => rows.is_empty(),
            Self::Plain(text) => text.trim().is_empty(),
        }
    }

    /// The string handed to the content surface: structured results are
    /// re-encoded in their wire shape, plain text passes through.
    pub fn to_payload(&self) -> String {
        match self {
            Self::Structured(rows) => serde_json::json!({ "parsed": rows }).to_string(),
            Self::Plain(text) => text.clone(),
        }
    }
}

/// Classified HTTP failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid response from review service")]
    InvalidResponse,
    #[error("bad request: {}", .message.as_deref().unwrap_or("no message"))]
    BadRequest { message: Option<String> },
    #[error("client update required ({store_url})")]
    UpdateRequired { store_url: String },
    #[error("unexpected status {status_code}")]
    Unexpected {
        status_code: u16,
        raw_body: Option<String>,
    },
}

/// Everything a review call can fail with.
///
/// `Cancelled` means the caller aborted the request; it is never shown to
/// the user. `Network` covers transport failures before any status arrived.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("request cancelled")]
    Cancelled,
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Store URL if the server refused this client version.
    pub fn update_required(&self) -> Option<&str> {
        match self {
            Self::Api(ApiError::UpdateRequired { store_url }) => Some(store_url),
            _ => None,
        }
    }
}

/// The remote review API. Stateless; safe to call from many tasks at once.
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// `POST /reviews`, returning the server-issued id.
    async fn create_review(&self, request: &ReviewRequest) -> Result<String, ClientError>;
    /// `GET /reviews/{id}`.
    async fn fetch_review(&self, id: &str) -> Result<ReviewRecord, ClientError>;
    /// `POST /reviews/ocr-parsing`.
    async fn parse_ocr_text(&self, text: &str) -> Result<ParsedOcr, ClientError>;
    /// `GET /webview/home`, returning the content surface URL.
    async fn home_url(&self) -> Result<String, ClientError>;
}
