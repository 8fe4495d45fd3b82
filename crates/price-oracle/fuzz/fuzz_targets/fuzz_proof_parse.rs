//! Fuzz target for proof blob parsing and verification.
//!
//! Every declared length in a proof is attacker-controlled; parsing and the
//! verification stages must reject garbage without panicking.
//!
//! ## Running
//!
//! ```bash
//! cd crates/price-oracle
//! cargo +nightly fuzz run fuzz_proof_parse
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use price_oracle::domain::proof;
use price_oracle::{verify_proof, ApiPublicKey};

/// Fuzz input: a raw blob plus the payload it claims to cover.
#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    blob: Vec<u8>,
    result: String,
    last_update: u64,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(parsed) = proof::extract(&input.blob) else {
        return;
    };

    // 1. Slices stay inside the blob
    assert!(parsed.signature.len() + parsed.headers.len() + 4 <= input.blob.len());
    assert!(parsed.headers.len() >= proof::DIGEST_OFFSET);

    // 2. Fixed-offset reads never panic once extraction succeeded
    assert!(proof::extract_date(parsed.headers).is_ok());
    let _ = proof::extract_digest(parsed.headers);

    // 3. Verification is deterministic
    let key = ApiPublicKey::default();
    let first = verify_proof(&parsed, &input.result, input.last_update, &key, 18);
    let second = verify_proof(&parsed, &input.result, input.last_update, &key, 18);
    assert_eq!(first, second);
});
