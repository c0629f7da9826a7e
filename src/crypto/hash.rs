//! Hashing utilities used for identity derivation

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// RIPEMD160(SHA256(data)), the 20-byte digest behind every address
pub fn hash160(data: &[u8]) -> Vec<u8> {
    let mut ripemd = Ripemd160::new();
    ripemd.update(sha256(data));
    ripemd.finalize().to_vec()
}

/// Base58Check encoding: `version || payload || checksum[..4]`
pub fn base58check(version: u8, payload: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() + 5);
    bytes.push(version);
    bytes.extend_from_slice(payload);
    let checksum = double_sha256(&bytes);
    bytes.extend_from_slice(&checksum[..4]);
    bs58::encode(bytes).into_string()
}
