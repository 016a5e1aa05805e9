//! Message model and payload validation.
//!
//! An [`IncomingMessage`] is the raw webhook payload as deserialized from
//! JSON. Validation runs one pure check per field and either yields a
//! normalized [`NewMessage`] ready for insertion or the first
//! [`ValidationError`] encountered. A [`Message`] is the stored row,
//! including the server-assigned `created_at`.
//!
//! The wire contract uses `from`/`to` as field names; internally the fields
//! are `sender`/`recipient` to avoid colliding with SQL keywords.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of the optional message text, in characters.
pub const MAX_TEXT_CHARS: usize = 4096;

/// A stored message, as persisted and returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Message {
    /// Caller-supplied unique identifier; the idempotency key.
    pub message_id: String,
    /// Sending phone number in E.164 format.
    #[serde(rename = "from")]
    pub sender: String,
    /// Receiving phone number in E.164 format.
    #[serde(rename = "to")]
    pub recipient: String,
    /// Message timestamp, `YYYY-MM-DDTHH:MM:SSZ`. Fixed-width UTC so that
    /// string ordering equals chronological ordering.
    pub ts: String,
    /// Optional message body.
    pub text: Option<String>,
    /// Server-assigned ingestion timestamp, stamped by the store.
    pub created_at: String,
}

/// Raw webhook payload before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Caller-supplied unique identifier.
    #[serde(default)]
    pub message_id: String,
    /// Sender, expected in E.164 format.
    #[serde(rename = "from", default)]
    pub sender: String,
    /// Recipient, expected in E.164 format.
    #[serde(rename = "to", default)]
    pub recipient: String,
    /// Message timestamp, expected as `YYYY-MM-DDTHH:MM:SSZ`.
    #[serde(default)]
    pub ts: String,
    /// Optional message body.
    #[serde(default)]
    pub text: Option<String>,
}

/// A validated, normalized message awaiting insertion.
///
/// Identical to [`Message`] minus `created_at`, which only the store may
/// assign.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Unique identifier, trimmed of surrounding whitespace.
    pub message_id: String,
    /// Validated E.164 sender.
    pub sender: String,
    /// Validated E.164 recipient.
    pub recipient: String,
    /// Validated timestamp string.
    pub ts: String,
    /// Optional message body, at most [`MAX_TEXT_CHARS`] characters.
    pub text: Option<String>,
}

/// A payload field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `message_id` was empty or whitespace-only.
    #[error("message_id must be non-empty")]
    EmptyMessageId,

    /// `from` or `to` was not a `+`-prefixed run of digits.
    #[error("{field} must be an E.164 number: a leading '+' followed by digits")]
    InvalidMsisdn {
        /// Which payload field was rejected.
        field: &'static str,
    },

    /// `ts` did not match `YYYY-MM-DDTHH:MM:SSZ`.
    #[error("ts must be an ISO-8601 UTC timestamp of the form YYYY-MM-DDTHH:MM:SSZ")]
    MalformedTimestamp,

    /// `text` was longer than [`MAX_TEXT_CHARS`] characters.
    #[error("text must be at most 4096 characters")]
    TextTooLong,
}

impl IncomingMessage {
    /// Validates every field and produces a normalized [`NewMessage`].
    ///
    /// Checks run in declaration order and the first failure is returned;
    /// callers collapse all failures to the same validation outcome, so no
    /// ordering is promised.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] among the field checks.
    pub fn validate(self) -> Result<NewMessage, ValidationError> {
        let message_id = validate_message_id(&self.message_id)?.to_string();
        validate_msisdn(&self.sender, "from")?;
        validate_msisdn(&self.recipient, "to")?;
        validate_timestamp(&self.ts)?;
        validate_text(self.text.as_deref())?;

        Ok(NewMessage {
            message_id,
            sender: self.sender,
            recipient: self.recipient,
            ts: self.ts,
            text: self.text,
        })
    }
}

/// Requires a non-empty identifier after trimming; returns the trimmed slice.
fn validate_message_id(raw: &str) -> Result<&str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyMessageId);
    }
    Ok(trimmed)
}

/// Requires E.164 shape: `+` followed by one or more ASCII digits.
fn validate_msisdn(value: &str, field: &'static str) -> Result<(), ValidationError> {
    let valid = value
        .strip_prefix('+')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidMsisdn { field })
    }
}

/// Timestamp template: digits where `0`, literal bytes elsewhere.
const TS_TEMPLATE: &[u8; 20] = b"0000-00-00T00:00:00Z";

/// Requires the exact `YYYY-MM-DDTHH:MM:SSZ` shape. No fractional seconds,
/// no offset other than the `Z` suffix.
fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    let matches_template = value.len() == TS_TEMPLATE.len()
        && value.bytes().zip(TS_TEMPLATE).all(|(byte, &template)| match template {
            b'0' => byte.is_ascii_digit(),
            _ => byte == template,
        });

    if matches_template {
        Ok(())
    } else {
        Err(ValidationError::MalformedTimestamp)
    }
}

/// Bounds the optional text at [`MAX_TEXT_CHARS`] characters.
fn validate_text(text: Option<&str>) -> Result<(), ValidationError> {
    match text {
        Some(body) if body.chars().count() > MAX_TEXT_CHARS => Err(ValidationError::TextTooLong),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> IncomingMessage {
        IncomingMessage {
            message_id: "m1".to_string(),
            sender: "+123".to_string(),
            recipient: "+456".to_string(),
            ts: "2025-01-01T00:00:00Z".to_string(),
            text: Some("hello".to_string()),
        }
    }

    #[test]
    fn valid_payload_normalizes() {
        let mut incoming = payload();
        incoming.message_id = "  m1  ".to_string();

        let message = incoming.validate().unwrap();
        assert_eq!(message.message_id, "m1");
        assert_eq!(message.sender, "+123");
        assert_eq!(message.text.as_deref(), Some("hello"));
    }

    #[test]
    fn empty_message_id_rejected() {
        let mut incoming = payload();
        incoming.message_id = "   ".to_string();

        assert_eq!(incoming.validate().unwrap_err(), ValidationError::EmptyMessageId);
    }

    #[test]
    fn e164_accepts_plus_and_digits_only() {
        for number in ["+1", "+123", "+919876543210"] {
            assert!(validate_msisdn(number, "from").is_ok(), "{number} should be valid");
        }
        for number in ["123", "+", "+12a3", "++123", "+12 3", ""] {
            assert!(validate_msisdn(number, "from").is_err(), "{number} should be rejected");
        }
    }

    #[test]
    fn invalid_sender_names_the_field() {
        let mut incoming = payload();
        incoming.sender = "12345".to_string();

        assert_eq!(
            incoming.validate().unwrap_err(),
            ValidationError::InvalidMsisdn { field: "from" }
        );
    }

    #[test]
    fn timestamp_must_match_exact_utc_shape() {
        assert!(validate_timestamp("2025-01-01T00:00:00Z").is_ok());

        for ts in [
            "2025-01-01T00:00:00",
            "2025-01-01 00:00:00Z",
            "2025-01-01T00:00:00.000Z",
            "2025-01-01T00:00:00+00:00",
            "25-01-01T00:00:00Z",
            "",
        ] {
            assert!(validate_timestamp(ts).is_err(), "{ts:?} should be rejected");
        }
    }

    #[test]
    fn text_is_bounded_at_4096_chars() {
        assert!(validate_text(None).is_ok());
        assert!(validate_text(Some(&"x".repeat(MAX_TEXT_CHARS))).is_ok());
        assert!(validate_text(Some(&"x".repeat(MAX_TEXT_CHARS + 1))).is_err());
    }

    #[test]
    fn missing_required_fields_default_empty_and_fail_validation() {
        let incoming: IncomingMessage = serde_json::from_str(r#"{"invalid": "data"}"#).unwrap();
        assert!(incoming.validate().is_err());
    }

    #[test]
    fn wire_names_map_to_sender_and_recipient() {
        let incoming: IncomingMessage = serde_json::from_str(
            r#"{"message_id":"m1","from":"+123","to":"+456","ts":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(incoming.sender, "+123");
        assert_eq!(incoming.recipient, "+456");
        assert_eq!(incoming.text, None);
    }

    #[test]
    fn stored_message_serializes_wire_names() {
        let message = Message {
            message_id: "m1".to_string(),
            sender: "+123".to_string(),
            recipient: "+456".to_string(),
            ts: "2025-01-01T00:00:00Z".to_string(),
            text: None,
            created_at: "2025-01-05T12:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["from"], "+123");
        assert_eq!(json["to"], "+456");
        assert!(json["text"].is_null());
        assert_eq!(json["created_at"], "2025-01-05T12:00:00Z");
    }
}
