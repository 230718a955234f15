use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use tracing::{debug, error, warn};

use super::wire::{self, ParseRequest};
use super::{ApiError, ClientError, ParsedOcr, ReviewRecord, ReviewRequest, ReviewService};
use crate::config::ClientSettings;

const REVIEWS_PATH: &str = "reviews";
const OCR_PARSING_PATH: &str = "reviews/ocr-parsing";
const HOME_PATH: &str = "webview/home";

#[derive(serde::Deserialize)]
struct HomeResponse {
    url: String,
}

/// [`ReviewService`] over HTTPS with reqwest.
pub struct HttpReviewClient {
    client: reqwest::Client,
    settings: ClientSettings,
}

impl HttpReviewClient {
    pub fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// A request carrying the common headers every call needs.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.settings.endpoint(path))
            .header("device-id", &self.settings.device_id)
            .header("content-type", "application/json")
            .header("app-version", &self.settings.app_version)
            .header("platform", &self.settings.platform)
    }

    /// Send, read the whole body, and classify by status.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?
            .to_vec();

        match wire::classify(status, &body) {
            Ok(()) => {
                debug!(%url, status, bytes = body.len(), "review API success");
                Ok(body)
            }
            Err(err @ ApiError::Unexpected { .. }) => {
                error!(%url, status, body = %String::from_utf8_lossy(&body), "review API unexpected status");
                Err(err.into())
            }
            Err(err) => {
                warn!(%url, status, error = %err, "review API error");
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl ReviewService for HttpReviewClient {
    async fn create_review(&self, request: &ReviewRequest) -> Result<String, ClientError> {
        let body = self
            .send(self.request(Method::POST, REVIEWS_PATH).json(request))
            .await?;
        Ok(wire::decode_review_id(&body)?)
    }

    async fn fetch_review(&self, id: &str) -> Result<ReviewRecord, ClientError> {
        let path = format!("{REVIEWS_PATH}/{id}");
        let body = self.send(self.request(Method::GET, &path)).await?;
        Ok(wire::decode_json(&body)?)
    }

    async fn parse_ocr_text(&self, text: &str) -> Result<ParsedOcr, ClientError> {
        let body = self
            .send(
                self.request(Method::POST, OCR_PARSING_PATH)
                    .json(&ParseRequest { text }),
            )
            .await?;
        Ok(wire::decode_parsed(&body)?)
    }

    async fn home_url(&self) -> Result<String, ClientError> {
        let body = self.send(self.request(Method::GET, HOME_PATH)).await?;
        let home: HomeResponse = wire::decode_json(&body)?;
        Ok(home.url)
    }
}
