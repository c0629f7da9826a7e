//! ECDSA key management for gate principals
//!
//! Owners are identified by an address derived from a secp256k1 public
//! key. The gate itself only ever sees the resulting [`Principal`]; keys
//! live with whoever acts on behalf of an owner.

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::{base58check, hash160};
use crate::gate::Principal;

/// Version byte for owner addresses (produces a leading '1')
pub const ADDRESS_VERSION: u8 = 0x00;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The principal this key acts as
    pub fn principal(&self) -> Principal {
        public_key_to_principal(&self.public_key)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Derive an owner principal: Base58Check(RIPEMD160(SHA256(pubkey)))
pub fn public_key_to_principal(public_key: &PublicKey) -> Principal {
    let address = base58check(ADDRESS_VERSION, &hash160(&public_key.serialize()));
    // Base58Check output is never empty, blank or all-zero
    Principal::from_trusted(address)
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.principal(), kp2.principal());
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(matches!(
            KeyPair::from_private_key_hex("not hex"),
            Err(KeyError::InvalidPrivateKey)
        ));
        assert!(matches!(
            KeyPair::from_private_key_hex(&"00".repeat(32)),
            Err(KeyError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_principal_format() {
        let kp = KeyPair::generate();
        let principal = kp.principal();
        assert!(principal.as_str().starts_with('1'));
        assert!(Principal::parse(principal.as_str()).is_ok());
    }

    #[test]
    fn test_principal_from_public_key_hex() {
        let kp = KeyPair::generate();
        let pk = public_key_from_hex(&kp.public_key_hex()).unwrap();
        assert_eq!(public_key_to_principal(&pk), kp.principal());
        assert!(public_key_from_hex("zz").is_err());
    }
}
