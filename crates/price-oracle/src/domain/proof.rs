//! # Proof Parser
//!
//! Byte-level layout of the proof blob delivered with each callback:
//!
//! ```text
//! byte 0              reserved
//! byte 1              signature length
//! 2 .. 2+siglen       signature
//! 2+siglen, +1        headers length (big-endian u16)
//! 4+siglen ..         headers
//! ```
//!
//! The header block is read at fixed offsets: the `Date` value (leading space
//! included) at `DATE_OFFSET..DATE_OFFSET + DATE_LENGTH`, and the base64
//! payload digest from `DIGEST_OFFSET` to the end. These offsets are part of
//! the off-chain signer's wire format.

use super::entities::{Hash, ParsedProof};
use super::errors::{OracleError, ProofError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Start of the `Date` header value inside the header block.
pub const DATE_OFFSET: usize = 5;
/// Width of the `Date` header value, including its leading space.
pub const DATE_LENGTH: usize = 30;
/// Start of the base64 payload digest inside the header block.
pub const DIGEST_OFFSET: usize = 52;

const SIGNATURE_LENGTH_INDEX: usize = 1;
const SIGNATURE_START: usize = 2;
const HEADERS_LENGTH_SIZE: usize = 2;

/// Split a proof blob into its signature and header block.
///
/// Every declared length is checked against the blob before slicing.
pub fn extract(proof: &[u8]) -> Result<ParsedProof<'_>, OracleError> {
    let signature_length = *proof
        .get(SIGNATURE_LENGTH_INDEX)
        .ok_or_else(|| malformed(format!("proof too short: {} bytes", proof.len())))?
        as usize;

    let signature_end = SIGNATURE_START + signature_length;
    let signature = proof.get(SIGNATURE_START..signature_end).ok_or_else(|| {
        malformed(format!(
            "signature length {signature_length} exceeds proof of {} bytes",
            proof.len()
        ))
    })?;

    let headers_start = signature_end + HEADERS_LENGTH_SIZE;
    let length_bytes = proof
        .get(signature_end..headers_start)
        .ok_or_else(|| malformed("missing headers length".to_string()))?;
    let headers_length = u16::from_be_bytes([length_bytes[0], length_bytes[1]]) as usize;

    let headers = proof
        .get(headers_start..headers_start + headers_length)
        .ok_or_else(|| {
            malformed(format!(
                "headers length {headers_length} exceeds proof of {} bytes",
                proof.len()
            ))
        })?;

    if headers.len() < DIGEST_OFFSET {
        return Err(malformed(format!(
            "headers too short: {} bytes, need at least {DIGEST_OFFSET}",
            headers.len()
        )));
    }

    Ok(ParsedProof { signature, headers })
}

/// The fixed-width `Date` header value.
pub fn extract_date(headers: &[u8]) -> Result<&[u8], OracleError> {
    headers
        .get(DATE_OFFSET..DATE_OFFSET + DATE_LENGTH)
        .ok_or_else(|| malformed("headers too short for date".to_string()))
}

/// Decode the base64 payload digest that closes the header block.
pub fn extract_digest(headers: &[u8]) -> Result<Vec<u8>, ProofError> {
    let encoded = headers
        .get(DIGEST_OFFSET..)
        .ok_or(ProofError::DigestMismatch)?
        .trim_ascii();

    STANDARD
        .decode(encoded)
        .map_err(|_| ProofError::DigestMismatch)
}

/// Build the header block an API signer emits for a payload digest.
///
/// With a 29-character RFC 7231 date the output matches the fixed offsets.
pub fn format_headers(date: &str, digest: &Hash) -> Vec<u8> {
    format!("date: {date}\ndigest: SHA-256={}", STANDARD.encode(digest)).into_bytes()
}

/// Pack a signature and header block into a proof blob.
pub fn encode(signature: &[u8], headers: &[u8]) -> Result<Vec<u8>, OracleError> {
    let signature_length = u8::try_from(signature.len())
        .map_err(|_| malformed(format!("signature of {} bytes", signature.len())))?;
    let headers_length = u16::try_from(headers.len())
        .map_err(|_| malformed(format!("headers of {} bytes", headers.len())))?;

    let mut blob =
        Vec::with_capacity(SIGNATURE_START + signature.len() + HEADERS_LENGTH_SIZE + headers.len());
    blob.push(0);
    blob.push(signature_length);
    blob.extend_from_slice(signature);
    blob.extend_from_slice(&headers_length.to_be_bytes());
    blob.extend_from_slice(headers);
    Ok(blob)
}

fn malformed(reason: String) -> OracleError {
    OracleError::MalformedProof(reason)
}
