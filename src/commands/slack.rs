use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::SlackCommand;

type HmacSha256 = Hmac<Sha256>;

/// Requests older than this are treated as replays.
const MAX_REQUEST_AGE_SECS: u64 = 60 * 5;

pub fn verify_slack_signature(
    signing_secret: &str,
    body: &str,
    timestamp: &str,
    signature: &str,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let current_time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    verify_slack_signature_at(signing_secret, body, timestamp, signature, current_time)
}

pub fn verify_slack_signature_at(
    signing_secret: &str,
    body: &str,
    timestamp: &str,
    signature: &str,
    current_time: u64,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let request_timestamp: u64 = match timestamp.parse() {
        Ok(ts) => ts,
        Err(_) => return Ok(false),
    };

    if current_time.abs_diff(request_timestamp) > MAX_REQUEST_AGE_SECS {
        return Ok(false);
    }

    let Some(expected) = signature.strip_prefix("v0=") else {
        return Ok(false);
    };
    let Ok(expected) = hex::decode(expected) else {
        return Ok(false);
    };

    let base_string = format!("v0:{}:{}", timestamp, body);

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())?;
    mac.update(base_string.as_bytes());

    // constant-time comparison
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Computes the `v0=` signature Slack sends for `body` at `timestamp`.
pub fn sign_request(
    signing_secret: &str,
    timestamp: &str,
    body: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())?;
    mac.update(format!("v0:{}:{}", timestamp, body).as_bytes());
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

pub fn parse_command_form(body: &str) -> Result<SlackCommand, serde_urlencoded::de::Error> {
    serde_urlencoded::from_str(body)
}
