//! Cryptographic utilities for owner identities
//!
//! This module provides:
//! - SHA-256 / RIPEMD-160 hashing and Base58Check encoding
//! - ECDSA key management (secp256k1) and principal derivation

pub mod hash;
pub mod keys;

pub use hash::{base58check, double_sha256, hash160, sha256};
pub use keys::{public_key_from_hex, public_key_to_principal, KeyError, KeyPair};
