//! Unverified token payload decoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

/// Claims read from the token payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrivilegeClaims {
    #[serde(default)]
    pub admin: Option<Value>,
}

impl PrivilegeClaims {
    /// Only a literal JSON `true` counts.
    pub fn is_admin(&self) -> bool {
        matches!(self.admin, Some(Value::Bool(true)))
    }
}

/// Decode the middle segment of a JWT. The signature is not checked.
pub fn decode_payload(token: &str) -> Option<PrivilegeClaims> {
    let segment = token.split('.').nth(1).filter(|s| !s.is_empty())?;
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_url_safe_payload() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"admin":true,"note":"~~>>??"}"#);
        let claims = decode_payload(&format!("h.{payload}.s")).unwrap();
        assert!(claims.is_admin());
    }

    #[test]
    fn tolerates_padding() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"admin":true}"#);
        let claims = decode_payload(&format!("h.{payload}==.s")).unwrap();
        assert!(claims.is_admin());
    }

    #[test]
    fn malformed_tokens_yield_none() {
        assert!(decode_payload("no-dots").is_none());
        assert!(decode_payload("h..s").is_none());
        assert!(decode_payload("h.!!!.s").is_none());
        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        assert!(decode_payload(&format!("h.{not_json}.s")).is_none());
    }

    #[test]
    fn non_boolean_admin_is_not_admin() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"admin":1}"#);
        let claims = decode_payload(&format!("h.{payload}.s")).unwrap();
        assert!(!claims.is_admin());
    }
}
