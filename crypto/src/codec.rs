//! Reversible text encoding for inscription payloads.
//!
//! Payloads travel inside `@`-separated transaction data, so the encoding
//! must never produce `@`. Standard base64 over the UTF-8 bytes satisfies
//! that and round-trips every string, including non-Latin text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::CryptoError;

/// Encode free-form text into the payload form embedded in transactions.
pub fn encode_payload(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a payload produced by [`encode_payload`].
pub fn decode_payload(encoded: &str) -> Result<String, CryptoError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}
