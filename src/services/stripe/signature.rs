//! Verification of the `Stripe-Signature` header.
//!
//! Header format is `t=<unix seconds>,v1=<hex hmac>[,v1=...][,v0=...]`. The
//! signed message is `"{t}.{raw body}"`, keyed by the endpoint's signing secret.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use super::{StripeEvent, StripeServiceError};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and clock skew) of a signed payload.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, StripeServiceError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| StripeServiceError::Webhook("missing timestamp in signature".into()))?;
    if signatures.is_empty() {
        return Err(StripeServiceError::Webhook(
            "no v1 signature in signature header".into(),
        ));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

pub fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, StripeServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeServiceError::Webhook(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), StripeServiceError> {
    let parsed = parse_header(header)?;

    if now.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(StripeServiceError::Webhook(
            "timestamp outside the tolerance zone".into(),
        ));
    }

    let expected = compute_signature(secret, parsed.timestamp, payload)?;
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(StripeServiceError::Webhook(
            "no signatures found matching the expected signature for payload".into(),
        ))
    }
}

/// Parses the verified body into its `id`, `type` and full payload.
pub fn parse_event(payload: &[u8]) -> Result<StripeEvent, StripeServiceError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StripeServiceError::Serde("event is missing id".into()))?
        .to_string();
    let r#type = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StripeServiceError::Serde("event is missing type".into()))?
        .to_string();
    Ok(StripeEvent {
        id,
        r#type,
        payload: value,
    })
}

pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
) -> Result<StripeEvent, StripeServiceError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| StripeServiceError::Other(e.to_string()))?
        .as_secs() as i64;
    verify_signature(payload, header, secret, now, DEFAULT_TOLERANCE_SECS)?;
    parse_event(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"customer.subscription.updated","data":{"object":{}}}"#;

    fn header_for(ts: i64, body: &[u8]) -> String {
        format!("t={},v1={}", ts, compute_signature(SECRET, ts, body).unwrap())
    }

    #[test]
    fn valid_signature_is_accepted() {
        let header = header_for(1_700_000_000, BODY);
        assert!(verify_signature(BODY, &header, SECRET, 1_700_000_010, 300).is_ok());
    }

    #[test]
    fn any_matching_v1_signature_is_enough() {
        let good = compute_signature(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000,v1=deadbeef,v0=abc,v1={}", good);
        assert!(verify_signature(BODY, &header, SECRET, 1_700_000_000, 300).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = header_for(1_700_000_000, BODY);
        let tampered = br#"{"id":"evt_1","type":"customer.subscription.deleted","data":{"object":{}}}"#;
        let err = verify_signature(tampered, &header, SECRET, 1_700_000_000, 300).unwrap_err();
        assert!(matches!(err, StripeServiceError::Webhook(_)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let header = header_for(1_700_000_000, BODY);
        assert!(verify_signature(BODY, &header, "whsec_other", 1_700_000_000, 300).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let header = header_for(1_700_000_000, BODY);
        assert!(verify_signature(BODY, &header, SECRET, 1_700_000_301, 300).is_err());
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(verify_signature(BODY, "", SECRET, 0, 300).is_err());
        assert!(verify_signature(BODY, "v1=abc", SECRET, 0, 300).is_err());
        assert!(verify_signature(BODY, "t=0", SECRET, 0, 300).is_err());
        assert!(verify_signature(BODY, "t=abc,v1=abc", SECRET, 0, 300).is_err());
    }

    #[test]
    fn extreme_timestamps_are_outside_tolerance() {
        for header in ["t=-9223372036854775808,v1=00", "t=9223372036854775807,v1=00"] {
            let err = verify_signature(BODY, header, SECRET, 1_700_000_000, 300).unwrap_err();
            assert!(matches!(err, StripeServiceError::Webhook(_)), "{header}");
        }
    }

    #[test]
    fn parse_event_extracts_id_and_type() {
        let evt = parse_event(BODY).unwrap();
        assert_eq!(evt.id, "evt_1");
        assert_eq!(evt.r#type, "customer.subscription.updated");
        assert!(evt.payload["data"]["object"].is_object());
    }

    #[test]
    fn parse_event_requires_type() {
        assert!(parse_event(br#"{"id":"evt_1"}"#).is_err());
        assert!(parse_event(b"not json").is_err());
    }
}
