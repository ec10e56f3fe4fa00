//! Signature verification for provider webhooks.
//!
//! The provider signs `"{t}.{raw_body}"` with HMAC-SHA256 and sends the result
//! in a header of the form:
//!
//! ```text
//! Provider-Signature: t=1700000000,v1=5257a869e7...,v1=9a1b...
//! ```
//!
//! Several `v1` entries may be present while the provider rotates secrets; a
//! request is authentic if any one of them matches. The timestamp is part of
//! the signed material, so it cannot be refreshed without the secret, and it
//! must lie within the configured tolerance of the local clock.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use crate::config::DEFAULT_TOLERANCE_SECONDS;

type HmacSha256 = Hmac<Sha256>;

/// Scheme label of the signatures this receiver understands
const SIGNATURE_SCHEME: &str = "v1";

/// Parsed contents of a signature header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing time as sent by the provider
    pub timestamp: i64,
    /// Candidate hex digests, in header order
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parse a `t=...,v1=...` header
    ///
    /// Items without `=` and unknown keys are skipped. Returns `None` when the
    /// timestamp is missing or not an integer, or when no `v1` entry is present.
    pub fn parse(header: &str) -> Option<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.split_once('=') else {
                continue;
            };

            match key.trim() {
                "t" => timestamp = Some(value.trim()),
                SIGNATURE_SCHEME => signatures.push(value.trim().to_string()),
                _ => {} // Other schemes (e.g. v0) are ignored
            }
        }

        let timestamp = timestamp.filter(|t| !t.is_empty())?.parse().ok()?;
        if signatures.is_empty() {
            return None;
        }

        Some(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies provider signatures with a fixed secret and freshness window
///
/// The secret is stored using [`SecretString`] so it never shows up in
/// debug output.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: SecretString,
    tolerance_seconds: u64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<SecretString>, tolerance_seconds: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_seconds,
        }
    }

    /// Verifier with the default 300 second tolerance
    pub fn with_default_tolerance(secret: impl Into<SecretString>) -> Self {
        Self::new(secret, DEFAULT_TOLERANCE_SECONDS)
    }

    pub fn tolerance_seconds(&self) -> u64 {
        self.tolerance_seconds
    }

    /// Verify `header` against `payload` using the current time
    pub fn verify(&self, payload: &[u8], header: &str) -> bool {
        self.verify_at(payload, header, unix_now())
    }

    /// Verify `header` against `payload` as if the current time were `now`
    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> bool {
        let Some(parsed) = SignatureHeader::parse(header) else {
            tracing::debug!("Malformed webhook signature header");
            return false;
        };

        if now.abs_diff(parsed.timestamp) > self.tolerance_seconds {
            tracing::warn!(
                timestamp = parsed.timestamp,
                now = now,
                tolerance = self.tolerance_seconds,
                "Webhook signature timestamp outside tolerance"
            );
            return false;
        }

        let Some(expected) = compute_signature(
            self.secret.expose_secret().as_bytes(),
            parsed.timestamp,
            payload,
        ) else {
            tracing::error!("HMAC computation failed");
            return false;
        };

        // Every candidate is compared so the work done does not depend on
        // which one (if any) matches.
        let matched = parsed
            .signatures
            .iter()
            .fold(Choice::from(0), |acc, candidate| {
                acc | constant_time_compare(expected.as_bytes(), candidate.as_bytes())
            });

        let is_valid: bool = matched.into();
        if !is_valid {
            tracing::debug!("Webhook signature verification failed");
        }

        is_valid
    }
}

/// Verify a provider signature header in one call
///
/// Returns `false` on any parse, freshness or MAC mismatch; never panics.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, tolerance_seconds: u64) -> bool {
    SignatureVerifier::new(secret, tolerance_seconds).verify(payload, header)
}

/// Produce a signature header for `payload`, as the provider would
///
/// Used by the demo client and by tests.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = compute_signature(secret.as_bytes(), timestamp, payload).unwrap_or_default();
    format!("t={},{}={}", timestamp, SIGNATURE_SCHEME, signature)
}

/// Current Unix time in whole seconds
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Compute the lowercase hex HMAC-SHA256 of `"{timestamp}." + payload`
fn compute_signature(secret: &[u8], timestamp: i64, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison to prevent timing attacks
///
/// Uses the `subtle` crate so the comparison is not turned back into an
/// early-exit loop by the optimizer. Only the length (public: always 64 hex
/// characters for the expected value) can influence timing.
fn constant_time_compare(a: &[u8], b: &[u8]) -> Choice {
    if a.len() != b.len() {
        return Choice::from(0);
    }

    a.ct_eq(b)
}
