//! Receive side of the bridge: the closed set of commands the content
//! surface may send, decoded once at the boundary.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::review::ReviewRequest;

/// Channel names registered with the content surface at setup time.
pub const COMMAND_NAMES: [&str; 5] = ["openCamera", "openGallery", "share", "createReview", "copy"];

/// A raw message as posted by the content surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeMessage {
    pub name: String,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("`{command}` body must be an object")]
    NotAnObject { command: &'static str },
    #[error("`{command}` is missing `{field}`")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },
    #[error("`{command}` field `{field}` has the wrong type")]
    InvalidField {
        command: &'static str,
        field: &'static str,
    },
}

/// Commands receivable from the content surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    OpenCamera,
    OpenGallery,
    /// `shareText` is optional; `None` means the surface sent nothing to share.
    Share { text: Option<String> },
    CreateReview(ReviewRequest),
    Copy { text: String },
}

impl BridgeCommand {
    /// Hand every known channel name to `add`, e.g. to install a message
    /// handler per name on the content surface.
    pub fn register(mut add: impl FnMut(&'static str)) {
        for name in COMMAND_NAMES {
            add(name);
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenCamera => "openCamera",
            Self::OpenGallery => "openGallery",
            Self::Share { .. } => "share",
            Self::CreateReview(_) => "createReview",
            Self::Copy { .. } => "copy",
        }
    }

    /// Decode a message. Unknown channel names yield `Ok(None)`.
    pub fn decode(message: &BridgeMessage) -> Result<Option<Self>, DecodeError> {
        let command = match message.name.as_str() {
            "openCamera" => Self::OpenCamera,
            "openGallery" => Self::OpenGallery,
            "share" => {
                let body = object_or_empty(&message.body);
                Self::Share {
                    text: optional_str(&body, "share", "shareText")?,
                }
            }
            "createReview" => {
                let body = object(&message.body, "createReview")?;
                Self::CreateReview(ReviewRequest {
                    ocr_text: required_str(body, "createReview", "ocrText")?,
                    tags: string_list(body, "createReview", "hashTag")?,
                    style: required_str(body, "createReview", "reviewStyle")?,
                })
            }
            "copy" => {
                let body = object(&message.body, "copy")?;
                Self::Copy {
                    text: required_str(body, "copy", "review")?,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn object<'a>(body: &'a Value, command: &'static str) -> Result<&'a Map<String, Value>, DecodeError> {
    body.as_object().ok_or(DecodeError::NotAnObject { command })
}

fn object_or_empty(body: &Value) -> Map<String, Value> {
    body.as_object().cloned().unwrap_or_default()
}

fn optional_str(
    body: &Map<String, Value>,
    command: &'static str,
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::InvalidField { command, field }),
    }
}

fn required_str(
    body: &Map<String, Value>,
    command: &'static str,
    field: &'static str,
) -> Result<String, DecodeError> {
    optional_str(body, command, field)?.ok_or(DecodeError::MissingField { command, field })
}

/// A list of strings; absent means empty.
fn string_list(
    body: &Map<String, Value>,
    command: &'static str,
    field: &'static str,
) -> Result<Vec<String>, DecodeError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or(DecodeError::InvalidField { command, field })
            })
            .collect(),
        Some(_) => Err(DecodeError::InvalidField { command, field }),
    }
}
