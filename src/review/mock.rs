use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::{ClientError, ParsedOcr, ReviewRecord, ReviewRequest, ReviewService};

/// One call observed by [`MockReviewService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCall {
    Create(ReviewRequest),
    Fetch(String),
    Parse(String),
    Home,
}

/// A scripted review service for tests. Each operation returns its
/// configured outcome on every call; `parse_delay` holds the parse call
/// open so tests can cancel it mid-flight.
pub struct MockReviewService {
    pub create: Result<String, ClientError>,
    pub fetch: Result<ReviewRecord, ClientError>,
    pub parse: Result<ParsedOcr, ClientError>,
    pub home: Result<String, ClientError>,
    pub parse_delay: Duration,
    pub calls: Mutex<Vec<ReviewCall>>,
}

impl Default for MockReviewService {
    fn default() -> Self {
        Self {
            create: Ok("1".to_string()),
            fetch: Ok(ReviewRecord {
                is_success: true,
                id: "1".to_string(),
                review: Some("generated".to_string()),
            }),
            parse: Ok(ParsedOcr::Plain("parsed".to_string())),
            home: Ok("https://misik.me/home".to_string()),
            parse_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockReviewService {
    pub fn calls(&self) -> Vec<ReviewCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ReviewCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl ReviewService for MockReviewService {
    async fn create_review(&self, request: &ReviewRequest) -> Result<String, ClientError> {
        self.record(ReviewCall::Create(request.clone()));
        self.create.clone()
    }

    async fn fetch_review(&self, id: &str) -> Result<ReviewRecord, ClientError> {
        self.record(ReviewCall::Fetch(id.to_string()));
        self.fetch.clone()
    }

    async fn parse_ocr_text(&self, text: &str) -> Result<ParsedOcr, ClientError> {
        self.record(ReviewCall::Parse(text.to_string()));
        if !self.parse_delay.is_zero() {
            tokio::time::sleep(self.parse_delay).await;
        }
        self.parse.clone()
    }

    async fn home_url(&self) -> Result<String, ClientError> {
        self.record(ReviewCall::Home);
        self.home.clone()
    }
}
