use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use misik::bridge::controller::{CREATE_REVIEW_TASK, PARSE_TASK};
use misik::bridge::{BridgeCommand, BridgeController, BridgeMessage};
use misik::platform::mock::{HostEvent, HostEvents, RecordingHost, ScriptedPicker, recording_platform};
use misik::platform::{ImagePicker, ImageSource};
use misik::recognition::mock::MockRecognizer;
use misik::recognition::{Image, RecognitionResult};
use misik::review::mock::{MockReviewService, ReviewCall};
use misik::review::{ApiError, ClientError, ParsedOcr, ReviewRecord, ReviewRequest};

const STORE_URL: &str = "https://apps.apple.com/x";

struct Harness {
    controller: BridgeController,
    review: Arc<MockReviewService>,
    recognizer: Arc<MockRecognizer>,
    picker: Arc<ScriptedPicker>,
    host: Arc<RecordingHost>,
    events: HostEvents,
}

impl Harness {
    fn new(review: MockReviewService) -> Self {
        Self::build(review, MockRecognizer::returning(&["Latte 5,000"]), None)
    }

    fn build(review: MockReviewService, recognizer: MockRecognizer, image: Option<Image>) -> Self {
        Self::build_with_delay(review, recognizer, image, Duration::ZERO)
    }

    fn build_with_delay(
        review: MockReviewService,
        recognizer: MockRecognizer,
        image: Option<Image>,
        delivery_delay: Duration,
    ) -> Self {
        let review = Arc::new(review);
        let recognizer = Arc::new(recognizer);
        let picker = Arc::new(ScriptedPicker::new(image));
        let (platform, host, events) =
            recording_platform(Arc::clone(&picker) as Arc<dyn ImagePicker>);
        let controller = BridgeController::new(
            review.clone(),
            recognizer.clone(),
            platform,
            delivery_delay,
        );
        Self {
            controller,
            review,
            recognizer,
            picker,
            host,
            events,
        }
    }

    async fn next(&mut self) -> HostEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for a host event")
            .expect("host event channel closed")
    }

    /// Wait for the next script call, skipping other host events.
    async fn next_script(&mut self) -> String {
        loop {
            if let HostEvent::Script(script) = self.next().await {
                return script;
            }
        }
    }

    /// Collect everything the host sees within `window`.
    async fn drain(&mut self, window: Duration) -> Vec<HostEvent> {
        let mut seen = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Some(event)) = tokio::time::timeout_at(deadline, self.events.recv()).await {
            seen.push(event);
        }
        seen
    }
}

fn message(value: serde_json::Value) -> BridgeMessage {
    serde_json::from_value(value).unwrap()
}

fn update_required() -> ClientError {
    ClientError::Api(ApiError::UpdateRequired {
        store_url: STORE_URL.to_string(),
    })
}

fn scripts(events: &[HostEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            HostEvent::Script(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn create_review_delivers_generated_text() {
    let mut h = Harness::new(MockReviewService {
        create: Ok("42".to_string()),
        fetch: Ok(ReviewRecord {
            is_success: true,
            id: "42".to_string(),
            review: Some("Great food".to_string()),
        }),
        ..MockReviewService::default()
    });

    h.controller.handle_message(&message(json!({
        "name": "createReview",
        "body": { "ocrText": "Latte", "hashTag": ["cozy"], "reviewStyle": "CUTE" }
    })));

    assert_eq!(
        h.next_script().await,
        r#"window.response.receiveGeneratedReview('{"result":"Great food"}');"#
    );
    assert_eq!(
        h.review.calls(),
        vec![
            ReviewCall::Create(ReviewRequest {
                ocr_text: "Latte".to_string(),
                tags: vec!["cozy".to_string()],
                style: "CUTE".to_string(),
            }),
            ReviewCall::Fetch("42".to_string()),
        ]
    );
}

#[tokio::test]
async fn create_review_failure_delivers_sentinel() {
    let mut h = Harness::new(MockReviewService {
        fetch: Err(ClientError::Network("connection reset".to_string())),
        ..MockReviewService::default()
    });
    h.controller.handle(BridgeCommand::CreateReview(ReviewRequest {
        ocr_text: "Latte".to_string(),
        tags: vec![],
        style: "CUTE".to_string(),
    }));

    assert_eq!(
        h.next_script().await,
        r#"window.response.receiveGeneratedReview('{"result":"error"}');"#
    );
}

#[tokio::test]
async fn unfinished_review_delivers_sentinel() {
    let mut h = Harness::new(MockReviewService {
        fetch: Ok(ReviewRecord {
            is_success: false,
            id: "1".to_string(),
            review: None,
        }),
        ..MockReviewService::default()
    });
    h.controller.handle(BridgeCommand::CreateReview(ReviewRequest {
        ocr_text: "Latte".to_string(),
        tags: vec![],
        style: "CUTE".to_string(),
    }));

    assert!(h.next_script().await.contains(r#"{"result":"error"}"#));
}

#[tokio::test]
async fn upgrade_required_prompts_without_notification() {
    let mut h = Harness::new(MockReviewService {
        create: Err(update_required()),
        ..MockReviewService::default()
    });
    h.controller.handle_message(&message(json!({
        "name": "createReview",
        "body": { "ocrText": "Latte", "reviewStyle": "CUTE" }
    })));

    let events = h.drain(Duration::from_millis(200)).await;
    assert_eq!(events, vec![HostEvent::UpdateRequired(STORE_URL.to_string())]);
}

#[tokio::test]
async fn malformed_create_review_still_answers() {
    let mut h = Harness::new(MockReviewService::default());
    h.controller.handle_message(&message(json!({
        "name": "createReview",
        "body": { "hashTag": ["cozy"] }
    })));

    assert_eq!(
        h.next_script().await,
        r#"window.response.receiveGeneratedReview('{"result":"error"}');"#
    );
    assert!(h.review.calls().is_empty());
}

#[tokio::test]
async fn unknown_message_is_ignored() {
    let mut h = Harness::new(MockReviewService::default());
    h.controller.handle_message(&message(json!({ "name": "vibrate" })));
    assert!(h.drain(Duration::from_millis(100)).await.is_empty());
}

#[tokio::test]
async fn camera_flow_recognizes_parses_and_delivers() {
    let mut h = Harness::build(
        MockReviewService {
            parse: Ok(ParsedOcr::Plain("Latte 5,000".to_string())),
            ..MockReviewService::default()
        },
        MockRecognizer::returning(&["Latte", "5,000"]),
        Some(Image::new(vec![0xff, 0xd8])),
    );
    h.controller.handle_message(&message(json!({ "name": "openCamera" })));

    assert_eq!(
        h.next_script().await,
        "window.response.receiveScanResult('Latte 5,000');"
    );
    assert_eq!(h.picker.sources(), vec![ImageSource::Camera]);
    assert_eq!(h.recognizer.calls(), 1);
    assert_eq!(
        h.review.calls(),
        vec![ReviewCall::Parse("Latte\n5,000".to_string())]
    );
}

#[tokio::test]
async fn recognition_surface_sees_loading_and_result_before_dismiss() {
    let mut h = Harness::build(
        MockReviewService::default(),
        MockRecognizer::returning(&["A", "B"]),
        Some(Image::new(vec![1])),
    );
    h.controller.handle(BridgeCommand::OpenGallery);

    let mut seen = Vec::new();
    loop {
        let event = h.next().await;
        let done = matches!(event, HostEvent::Script(_));
        seen.push(event);
        if done {
            break;
        }
    }

    assert_eq!(seen.first(), Some(&HostEvent::Presented));
    let loading: Vec<bool> = seen
        .iter()
        .filter_map(|e| match e {
            HostEvent::Loading(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![true, false]);
    assert!(seen.contains(&HostEvent::Recognized(vec!["A".to_string(), "B".to_string()])));
    let dismissed = seen.iter().position(|e| *e == HostEvent::Dismissed).unwrap();
    assert_eq!(dismissed, seen.len() - 2, "dismiss comes right before delivery");
}

#[tokio::test]
async fn cancelled_picker_does_nothing() {
    let mut h = Harness::build(MockReviewService::default(), MockRecognizer::returning(&["A"]), None);
    h.controller.handle(BridgeCommand::OpenGallery);

    assert!(h.drain(Duration::from_millis(100)).await.is_empty());
    assert_eq!(h.picker.sources(), vec![ImageSource::Gallery]);
    assert_eq!(h.recognizer.calls(), 0);
}

#[tokio::test]
async fn empty_parse_delivers_scan_sentinel() {
    let mut h = Harness::new(MockReviewService {
        parse: Ok(ParsedOcr::Structured(vec![])),
        ..MockReviewService::default()
    });
    h.controller.finish_recognition(RecognitionResult::default());

    assert_eq!(
        h.next_script().await,
        "window.response.receiveScanResult('error');"
    );
}

#[tokio::test]
async fn parse_failure_delivers_scan_sentinel() {
    let mut h = Harness::new(MockReviewService {
        parse: Err(ClientError::Api(ApiError::Unexpected {
            status_code: 502,
            raw_body: None,
        })),
        ..MockReviewService::default()
    });
    h.controller
        .finish_recognition(RecognitionResult::from(vec!["Latte".to_string()]));

    let events = h.drain(Duration::from_millis(200)).await;
    assert_eq!(
        events,
        vec![
            HostEvent::Dismissed,
            HostEvent::Script("window.response.receiveScanResult('error');".to_string()),
        ]
    );
}

#[tokio::test]
async fn parse_upgrade_required_prompts_and_dismisses() {
    let mut h = Harness::new(MockReviewService {
        parse: Err(update_required()),
        ..MockReviewService::default()
    });
    h.controller
        .finish_recognition(RecognitionResult::from(vec!["Latte".to_string()]));

    let events = h.drain(Duration::from_millis(200)).await;
    assert_eq!(
        events,
        vec![
            HostEvent::UpdateRequired(STORE_URL.to_string()),
            HostEvent::Dismissed,
        ]
    );
}

#[tokio::test]
async fn dismiss_during_parse_sends_nothing() {
    let mut h = Harness::new(MockReviewService {
        parse_delay: Duration::from_millis(300),
        ..MockReviewService::default()
    });
    h.controller
        .finish_recognition(RecognitionResult::from(vec!["Latte".to_string()]));
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.controller.recognition_dismissed();

    let events = h.drain(Duration::from_millis(500)).await;
    assert!(scripts(&events).is_empty(), "got {events:?}");
    assert!(!h.controller.tasks().contains(PARSE_TASK));
}

#[tokio::test]
async fn dismiss_during_recognition_ends_loading_and_sends_nothing() {
    let mut h = Harness::build(
        MockReviewService::default(),
        MockRecognizer::returning(&["A"]).with_delay(Duration::from_millis(300)),
        Some(Image::new(vec![1])),
    );
    h.controller.handle(BridgeCommand::OpenCamera);
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.controller.recognition_dismissed();

    let events = h.drain(Duration::from_millis(600)).await;
    let loading: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            HostEvent::Loading(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![true, false], "got {events:?}");
    assert!(!events.iter().any(|e| matches!(e, HostEvent::Recognized(_))));
    assert!(scripts(&events).is_empty());
    assert!(h.review.calls().is_empty());
}

#[tokio::test]
async fn dismiss_after_scan_screen_closed_still_delivers() {
    let mut h = Harness::build_with_delay(
        MockReviewService::default(),
        MockRecognizer::returning(&[]),
        None,
        Duration::from_millis(200),
    );
    h.controller
        .finish_recognition(RecognitionResult::from(vec!["Latte".to_string()]));
    assert_eq!(h.next().await, HostEvent::Dismissed);

    // The host reports its screen closing while delivery is still waiting.
    h.controller.recognition_dismissed();

    assert_eq!(
        h.next_script().await,
        "window.response.receiveScanResult('parsed');"
    );
}

#[tokio::test]
async fn newer_parse_supersedes_older() {
    let mut h = Harness::new(MockReviewService {
        parse_delay: Duration::from_millis(150),
        ..MockReviewService::default()
    });
    h.controller
        .finish_recognition(RecognitionResult::from(vec!["first".to_string()]));
    h.controller
        .finish_recognition(RecognitionResult::from(vec!["second".to_string()]));

    let events = h.drain(Duration::from_millis(500)).await;
    assert_eq!(
        scripts(&events),
        vec!["window.response.receiveScanResult('parsed');"]
    );
}

#[tokio::test]
async fn dropping_controller_cancels_pending_review() {
    let h = Harness::new(MockReviewService::default());
    h.controller.handle(BridgeCommand::CreateReview(ReviewRequest {
        ocr_text: "Latte".to_string(),
        tags: vec![],
        style: "CUTE".to_string(),
    }));
    assert!(h.controller.tasks().contains(CREATE_REVIEW_TASK));

    let Harness {
        controller,
        mut events,
        ..
    } = h;
    drop(controller);

    let mut seen = Vec::new();
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(200), events.recv()).await
    {
        seen.push(event);
    }
    assert!(scripts(&seen).is_empty(), "got {seen:?}");
}

#[tokio::test]
async fn copy_and_share_reach_the_host() {
    let mut h = Harness::new(MockReviewService::default());
    h.controller.handle_message(&message(json!({
        "name": "copy",
        "body": { "review": "Great food" }
    })));
    h.controller.handle_message(&message(json!({
        "name": "share",
        "body": { "shareText": "Great food" }
    })));
    h.controller.handle_message(&message(json!({ "name": "share" })));

    assert_eq!(h.next().await, HostEvent::Copied("Great food".to_string()));
    assert_eq!(h.next().await, HostEvent::Shared(vec!["Great food".to_string()]));
    assert_eq!(h.next().await, HostEvent::Shared(vec![]));
}

#[tokio::test]
async fn keyboard_height_is_relayed() {
    let mut h = Harness::new(MockReviewService::default());
    h.controller.keyboard_changed(291.0);
    assert_eq!(
        h.next_script().await,
        r#"window.response.receiveKeyboardHeight('{"height":"291"}');"#
    );
}

#[tokio::test]
async fn failed_script_delivery_is_swallowed() {
    let mut h = Harness::new(MockReviewService::default());
    h.host.fail_scripts();
    h.controller.keyboard_changed(10.0);
    h.next_script().await;

    // The controller keeps working afterwards.
    h.controller.keyboard_changed(0.0);
    assert!(h.next_script().await.contains(r#""height":"0""#));
}

#[tokio::test]
async fn load_home_loads_url() {
    let mut h = Harness::new(MockReviewService::default());
    assert_eq!(
        h.controller.load_home().await.as_deref(),
        Some("https://misik.me/home")
    );
    assert_eq!(h.next().await, HostEvent::Loaded("https://misik.me/home".to_string()));
}

#[tokio::test]
async fn load_home_upgrade_required_prompts() {
    let mut h = Harness::new(MockReviewService {
        home: Err(update_required()),
        ..MockReviewService::default()
    });
    assert!(h.controller.load_home().await.is_none());
    assert_eq!(h.next().await, HostEvent::UpdateRequired(STORE_URL.to_string()));
}
