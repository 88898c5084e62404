//! HMAC-SHA256 payload signing for mutating backend requests
//!
//! The backend recomputes the signature over the body serialized with
//! sorted keys and no whitespace, so both sides must agree on that exact
//! byte sequence. [`canonical_json`] produces it and the client sends those
//! same bytes as the request body.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature
pub const SIGNATURE_HEADER: &str = "X-Payload-Signature";

/// Compact JSON with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hex-encoded HMAC-SHA256 of the canonical form of `payload`
pub fn payload_signature(payload: &Value, secret: &str) -> String {
    sign_bytes(canonical_json(payload).as_bytes(), secret)
}

pub(crate) fn sign_bytes(body: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
