//! # Signature Verifier (secp256k1)
//!
//! Authenticates a proof by recovering the signer of its header block and
//! comparing it with the address of the trusted API key.
//!
//! ## Security Notes
//!
//! - **High-S Acceptance**: like ecrecover, both S forms recover the same
//!   signer; high S is normalized (with the y-parity flipped) before recovery
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance
//! - The digest is SHA-256 of the header bytes; addresses use keccak-256

use super::entities::{Address, ApiPublicKey, Hash, API_PUBLIC_KEY_LENGTH};
use super::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha2::Sha256;
use sha3::{Digest, Keccak256};
use subtle::{Choice, ConstantTimeEq};
use tracing::debug;
use zeroize::Zeroize;

/// Length of a recoverable signature: r (32) || s (32) || v (1).
pub const SIGNATURE_LENGTH: usize = 65;

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order (low-S bound for signing).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

// =============================================================================
// VERIFICATION
// =============================================================================

/// Check that `signature` over SHA-256(`headers`) was produced by `key`.
///
/// Never fails: malformed signatures simply do not verify.
pub fn verify_signature(headers: &[u8], signature: &[u8], key: &ApiPublicKey) -> bool {
    let digest = sha256(headers);
    match recover_signer(&digest, signature) {
        Ok(recovered) => recovered[..].ct_eq(&key.address()[..]).into(),
        Err(e) => {
            debug!(error = %e, "Signer recovery failed");
            false
        }
    }
}

/// Recover the signer address from a 65-byte `r || s || v` signature.
pub fn recover_signer(digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidFormat);
    }

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    s.copy_from_slice(&signature[32..64]);
    let v = signature[64];

    if !is_valid_scalar(&r) || !is_valid_scalar(&s) {
        return Err(SignatureError::InvalidFormat);
    }

    let mut parity = parse_recovery_id(v)?.to_byte();

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&r);
    sig_bytes[32..].copy_from_slice(&s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let mut sig = parsed.map_err(|_| SignatureError::InvalidFormat)?;

    // k256 only recovers from low S; n - s pairs with the opposite parity
    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        parity ^= 1;
    }
    let recovery_id =
        RecoveryId::from_byte(parity).ok_or(SignatureError::InvalidRecoveryId(v))?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&recovered))
}

/// Produce a low-S `r || s || v` signature (v = 27 or 28) over a prehashed digest.
///
/// Signer side of the protocol: used by the local API signer.
pub fn sign_prehash(
    signing_key: &SigningKey,
    digest: &Hash,
) -> Result<[u8; SIGNATURE_LENGTH], SignatureError> {
    let (sig, recid) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|_| SignatureError::InvalidFormat)?;

    let sig_bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    // Normalize S to low value (EIP-2); flipping S flips the y-parity
    let mut parity = recid.to_byte() & 1;
    if !is_low_s(&s) {
        s = invert_s(&s);
        parity ^= 1;
    }

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..32].copy_from_slice(&r);
    out[32..64].copy_from_slice(&s);
    out[64] = 27 + parity;
    Ok(out)
}

// =============================================================================
// HASHING AND ADDRESSES
// =============================================================================

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 hash function (proof digests).
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Address of a raw 64-byte public key: last 20 bytes of keccak-256.
pub fn address_from_public_key(public_key: &[u8; API_PUBLIC_KEY_LENGTH]) -> Address {
    let hash = keccak256(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Address of a k256 verifying key.
pub fn address_from_verifying_key(public_key: &VerifyingKey) -> Address {
    address_from_public_key(&raw_public_key(public_key))
}

/// Raw 64-byte form of a k256 verifying key.
pub fn raw_public_key(public_key: &VerifyingKey) -> [u8; API_PUBLIC_KEY_LENGTH] {
    let encoded = public_key.to_encoded_point(false);
    // Skip the 0x04 tag
    let mut raw = [0u8; API_PUBLIC_KEY_LENGTH];
    raw.copy_from_slice(&encoded.as_bytes()[1..]);
    raw
}

// =============================================================================
// SCALAR CHECKS
// =============================================================================

/// Constant-time big-endian comparison: returns (a < b, a > b).
fn ct_compare(a: &[u8; 32], b: &[u8; 32]) -> (Choice, Choice) {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from((a[i] < b[i]) as u8);
        greater |= not_decided & Choice::from((a[i] > b[i]) as u8);
    }

    (less, greater)
}

/// S strictly below n/2 (EIP-2).
fn is_low_s(s: &[u8; 32]) -> bool {
    let (less, _) = ct_compare(s, &SECP256K1_HALF_ORDER);
    less.into()
}

/// Scalar in [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    let (less, _) = ct_compare(scalar, &SECP256K1_ORDER);
    (!is_zero & less).into()
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// s' = n - s
fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}
