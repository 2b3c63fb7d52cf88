//! Response sniffing
//!
//! Several providers answer HTTP 200 with an XML error envelope instead of
//! the JSON they were asked for. Bodies are therefore fetched as text and
//! classified by their first significant character.

use serde_json::Value;
use tracing::warn;

use crate::error::{ResolveError, Result};

/// Tags that carry a human-readable message in the known XML envelopes
const MESSAGE_TAGS: [&str; 6] = [
    "errMsg",
    "returnAuthMsg",
    "returnReasonCode",
    "message",
    "text",
    "faultstring",
];

/// Markers that identify a credential problem in an envelope message
const AUTH_MARKERS: [&str; 5] = ["KEY", "AUTH", "UNAUTHORIZED", "FORBIDDEN", "인증"];

/// A classified response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// XML error envelope, reduced to its message
    XmlError(String),
}

/// Classify a raw response body
pub fn sniff(body: &str, endpoint: &str) -> Result<Payload> {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('<') {
        return Ok(Payload::XmlError(xml_message(trimmed)));
    }

    serde_json::from_str(trimmed).map(Payload::Json).map_err(|err| {
        warn!(
            endpoint,
            leading = %leading(trimmed),
            error = %err,
            "Response is neither JSON nor an XML envelope"
        );
        ResolveError::parse(endpoint, format!("invalid JSON: {}", err))
    })
}

/// Parse a body that must be JSON, turning XML envelopes into errors
///
/// Envelopes that name a key or authorization problem become
/// [`ResolveError::Auth`]; anything else is a [`ResolveError::Parse`].
pub fn expect_json(body: &str, endpoint: &str) -> Result<Value> {
    match sniff(body, endpoint)? {
        Payload::Json(value) => Ok(value),
        Payload::XmlError(message) => {
            warn!(endpoint, message = %message, "Provider returned an XML error envelope");
            if is_auth_message(&message) {
                Err(ResolveError::auth(message))
            } else {
                Err(ResolveError::parse(endpoint, message))
            }
        }
    }
}

fn is_auth_message(message: &str) -> bool {
    let upper = message.to_uppercase();
    AUTH_MARKERS.iter().any(|marker| upper.contains(marker))
}

fn xml_message(xml: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for tag in MESSAGE_TAGS {
        if let Some(text) = tag_text(xml, tag) {
            if !parts.contains(&text) {
                parts.push(text);
            }
        }
    }

    if parts.is_empty() {
        format!("unrecognized XML response: {}", leading(xml))
    } else {
        parts.join(": ")
    }
}

fn tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    let text = xml[start..end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn leading(text: &str) -> String {
    text.chars().take(80).collect()
}
