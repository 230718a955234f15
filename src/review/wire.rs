//! Response classification and body decoding for the review API.
//!
//! Kept free of any HTTP client so every rule can be tested on raw bytes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::{ApiError, ParsedOcr};

/// Longest raw body kept on [`ApiError::Unexpected`] for diagnostics.
const MAX_RAW_BODY: usize = 2_048;

#[derive(Serialize)]
pub(crate) struct ParseRequest<'a> {
    pub text: &'a str,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct UrlBody {
    url: String,
}

#[derive(Deserialize)]
struct IdBody {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

#[derive(Deserialize)]
struct ParsedBody {
    parsed: Vec<BTreeMap<String, String>>,
}

/// Accept an identifier sent either as a JSON string or a JSON number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(n) => n.to_string(),
    })
}

fn raw_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(body);
    let mut end = text.len().min(MAX_RAW_BODY);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(text[..end].to_string())
}

/// Map a status code (and error body) onto the client's error taxonomy.
/// `Ok(())` means the body holds the success shape.
pub fn classify(status: u16, body: &[u8]) -> Result<(), ApiError> {
    match status {
        200..=299 => Ok(()),
        400 => Err(ApiError::BadRequest {
            message: serde_json::from_slice::<MessageBody>(body)
                .ok()
                .map(|b| b.message),
        }),
        426 => match serde_json::from_slice::<UrlBody>(body) {
            Ok(b) => Err(ApiError::UpdateRequired { store_url: b.url }),
            Err(_) => Err(ApiError::Unexpected {
                status_code: status,
                raw_body: raw_body(body),
            }),
        },
        _ => Err(ApiError::Unexpected {
            status_code: status,
            raw_body: raw_body(body),
        }),
    }
}

/// Decode a JSON success body.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidResponse)
}

/// Decode the `POST /reviews` body: a bare integer, or `{"id": ...}`.
pub fn decode_review_id(body: &[u8]) -> Result<String, ApiError> {
    let text = std::str::from_utf8(body).map_err(|_| ApiError::InvalidResponse)?;
    let text = text.trim();

    if let Ok(id) = text.parse::<i64>() {
        return Ok(id.to_string());
    }
    serde_json::from_str::<IdBody>(text)
        .map(|b| b.id)
        .map_err(|_| ApiError::InvalidResponse)
}

/// Decode the `POST /reviews/ocr-parsing` body. The structured object is
/// tried first. Anything that is not a JSON object is the legacy plain
/// text form, with a JSON string unquoted.
pub fn decode_parsed(body: &[u8]) -> Result<ParsedOcr, ApiError> {
    if let Ok(b) = serde_json::from_slice::<ParsedBody>(body) {
        return Ok(ParsedOcr::Structured(b.parsed));
    }

    let text = std::str::from_utf8(body).map_err(|_| ApiError::InvalidResponse)?;
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(_)) => Err(ApiError::InvalidResponse),
        Ok(serde_json::Value::String(s)) => Ok(ParsedOcr::Plain(s)),
        Ok(_) | Err(_) => Ok(ParsedOcr::Plain(text.to_string())),
    }
}
