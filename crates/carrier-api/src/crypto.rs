//! HMAC-SHA256 signature verification for inbound webhooks.
//!
//! Authentication operates on the raw request bytes, before any JSON
//! parsing: the expected signature is HMAC-SHA256(secret, body) rendered as
//! lowercase hex, compared against the caller's `X-Signature` value in
//! constant time.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The supplied signature matches the body.
    Authenticated,
    /// No signature accompanied the request.
    MissingSignature,
    /// A signature was supplied but does not match the body.
    SignatureMismatch,
    /// No usable secret is configured; a readiness failure, not an
    /// authentication failure.
    NotConfigured,
}

/// Signature computation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The secret key could not be used for HMAC.
    InvalidSecret,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSecret => write!(f, "invalid secret key"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Verifies a webhook delivery against the configured secret.
///
/// The body is the exact byte sequence received; callers must not parse or
/// re-serialize it first. A missing or blank secret yields
/// [`AuthOutcome::NotConfigured`] so the boundary can answer with a
/// service-unavailable status instead of an authentication failure.
pub fn authenticate(secret: Option<&str>, signature: Option<&str>, body: &[u8]) -> AuthOutcome {
    let Some(secret) = secret.map(str::trim).filter(|s| !s.is_empty()) else {
        return AuthOutcome::NotConfigured;
    };

    let Some(signature) = signature else {
        return AuthOutcome::MissingSignature;
    };

    let expected = match generate_hmac_hex(body, secret) {
        Ok(hex) => hex,
        Err(_) => return AuthOutcome::NotConfigured,
    };

    if timing_safe_eq(signature, &expected) {
        AuthOutcome::Authenticated
    } else {
        AuthOutcome::SignatureMismatch
    }
}

/// Generates the HMAC-SHA256 signature of a payload as lowercase hex.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the secret key cannot be used.
pub fn generate_hmac_hex(payload: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;

    mac.update(payload);
    let result = mac.finalize();
    Ok(hex::encode(result.into_bytes()))
}

/// Timing-safe string comparison to prevent timing attacks.
fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.bytes().zip(b.bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}
