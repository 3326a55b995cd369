//! Base64 wrapping for screen frame payloads.
//!
//! Frames travel as standard-alphabet, padded base64 inside the JSON
//! envelope's `Data` string.  The ~33% inflation is an accepted cost of the
//! all-JSON wire format; peers depend on this exact encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encodes raw JPEG bytes for the `screen_frame` `Data` field.
pub fn encode_frame(jpeg: &[u8]) -> String {
    STANDARD.encode(jpeg)
}

/// Decodes a `screen_frame` `Data` field back into JPEG bytes.
pub fn decode_frame(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data)
}
