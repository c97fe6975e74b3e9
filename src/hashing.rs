//! Bitcoin hashing primitives
//!
//! Double SHA256 identifies transactions; HASH160 (SHA256 + RIPEMD160) is the
//! 20-byte digest embedded in pay-to-address scripts.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Double SHA256, used for transaction hashes and base58check checksums
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first_hash = Sha256::digest(data);
    let second_hash = Sha256::digest(first_hash);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second_hash);
    result
}

/// Single SHA256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Address hash of a public key (RIPEMD160 of SHA256)
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let hash = Ripemd160::digest(sha256(data));
    let mut result = [0u8; 20];
    result.copy_from_slice(&hash);
    result
}
