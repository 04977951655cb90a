//! Unverified JWT payload decoding.
//!
//! [`parse`] reads the claims segment of a bearer token so the client can
//! decide what to show. It performs no signature or expiry verification: the
//! result is a display hint, and the backend must authorize every request on
//! its own.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use super::role::Role;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried by an access token, as far as the client cares.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Claims {
    /// Subject, usually the username.
    pub sub: Option<String>,
    /// Explicit username claim, when the backend adds one.
    pub username: Option<String>,
    /// Role claim used by the route gate.
    pub role: Option<Role>,
    /// Numeric user id (`id` claim).
    pub id: Option<i64>,
    /// Numeric user id (`user_id` claim).
    pub user_id: Option<i64>,
    /// Expiry as seconds since the epoch. Informational only.
    pub exp: Option<i64>,
}

impl Claims {
    /// Best display name: `sub`, falling back to `username`.
    pub fn display_name(&self) -> Option<&str> {
        self.sub.as_deref().or(self.username.as_deref())
    }

    /// User id from `id`, then `user_id`, then a numeric `sub`.
    pub fn resolved_user_id(&self) -> Option<i64> {
        self.id
            .or(self.user_id)
            .or_else(|| self.sub.as_deref().and_then(|sub| sub.trim().parse().ok()))
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            sub: string_claim(object, "sub"),
            username: string_claim(object, "username"),
            role: string_claim(object, "role").map(|role| Role::parse(&role)),
            id: integer_claim(object, "id"),
            user_id: integer_claim(object, "user_id"),
            exp: integer_claim(object, "exp"),
        }
    }
}

/// Decode the claims of `token`.
///
/// Returns `None` for anything that is not a three-part-ish token whose second
/// segment is base64url-encoded UTF-8 JSON describing an object.
pub fn parse(token: &str) -> Option<Claims> {
    let segment = token.trim().split('.').nth(1)?;
    let bytes = decode_segment(segment)?;
    let text = String::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Value>(&text).ok()? {
        Value::Object(object) => Some(Claims::from_object(&object)),
        _ => None,
    }
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    if segment.is_empty() {
        return None;
    }
    let normalized: String = segment
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    PAYLOAD_ENGINE.decode(normalized).ok()
}

fn string_claim(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn integer_claim(object: &Map<String, Value>, key: &str) -> Option<i64> {
    match object.get(key)? {
        Value::Number(value) => value.as_i64(),
        Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &str) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.signature",
        engine.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(payload)
    )
}
