use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Unsigned JWT-shaped token carrying `payload` as its claims.
pub fn token_with_payload(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

pub fn token_with_role(role: &str) -> String {
    token_with_payload(&format!(r#"{{"sub":"tester","role":"{role}","id":5}}"#))
}
