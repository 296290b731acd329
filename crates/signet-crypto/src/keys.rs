//! Keypair management for Signet tokens.

use crate::error::CryptoError;
use crate::signature::{
    KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, signing_key_from_slice,
};
use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// An Ed25519 public key used to verify Signet tokens.
///
/// Only the length is checked at construction; curve-point validity is
/// checked when the key is used to verify.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!(
                "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes =
            hex::decode(hex.trim()).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Hex encoding of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An Ed25519 keypair for signing Signet tokens.
#[derive(Clone)]
pub struct KeyPair {
    inner: SigningKey,
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        // Generate random bytes for the private key
        let mut rng = rand::rng();
        let mut bytes = [0u8; SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut bytes);

        Self {
            inner: SigningKey::from_bytes(&bytes),
        }
    }

    /// Load a keypair from private key bytes (32-byte seed or 64-byte keypair).
    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            inner: signing_key_from_slice(bytes)?,
        })
    }

    /// Load a keypair from a hex-encoded private key string.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes =
            hex::decode(hex.trim()).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_private_key_bytes(&bytes)
    }

    /// Get the 32-byte private seed.
    pub fn private_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.inner.to_bytes()
    }

    /// Get the 64-byte `seed || public` form.
    pub fn keypair_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.inner.to_keypair_bytes()
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.inner.verifying_key().to_bytes())
    }

    /// Get the private key as hex string.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key_bytes())
    }

    /// Get the public key as hex string.
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.inner.sign(data).to_bytes().to_vec()
    }

    /// Save the keypair to files.
    pub fn save_to_files(
        &self,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<(), CryptoError> {
        std::fs::write(private_key_path, self.private_key_hex())?;
        std::fs::write(public_key_path, self.public_key_hex())?;
        Ok(())
    }

    /// Load a keypair from a private key file.
    pub fn load_from_file(private_key_path: &Path) -> Result<Self, CryptoError> {
        let hex = std::fs::read_to_string(private_key_path)?;
        Self::from_private_key_hex(hex.trim())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Load a public key from hex string (for verification-only scenarios).
pub fn load_public_key_hex(hex: &str) -> Result<PublicKey, CryptoError> {
    PublicKey::from_hex(hex)
}

/// Load a public key from a file.
pub fn load_public_key_file(path: &Path) -> Result<PublicKey, CryptoError> {
    let hex = std::fs::read_to_string(path)?;
    load_public_key_hex(hex.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::verify;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.private_key_hex().len(), 64);
        assert_eq!(keypair.public_key_hex().len(), 64);
    }

    #[test]
    fn test_keypair_roundtrip() {
        let keypair1 = KeyPair::generate();
        let hex = keypair1.private_key_hex();

        let keypair2 = KeyPair::from_private_key_hex(&hex).unwrap();
        assert_eq!(keypair1.public_key_hex(), keypair2.public_key_hex());
    }

    #[test]
    fn test_keypair_sign_verifies() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"data");
        verify(keypair.public_key().as_bytes(), b"data", &signature).unwrap();
    }

    #[test]
    fn test_keypair_file_save_load() {
        let keypair = KeyPair::generate();

        let mut priv_file = NamedTempFile::new().unwrap();
        let mut pub_file = NamedTempFile::new().unwrap();

        writeln!(priv_file, "{}", keypair.private_key_hex()).unwrap();
        writeln!(pub_file, "{}", keypair.public_key_hex()).unwrap();

        let loaded = KeyPair::load_from_file(priv_file.path()).unwrap();
        assert_eq!(keypair.public_key_hex(), loaded.public_key_hex());

        let public = load_public_key_file(pub_file.path()).unwrap();
        assert_eq!(public, keypair.public_key());
    }

    #[test]
    fn test_public_key_rejects_bad_material() {
        assert!(matches!(
            PublicKey::from_bytes(&[0u8; 31]),
            Err(CryptoError::InvalidPublicKey(_))
        ));
        assert!(matches!(
            PublicKey::from_hex("not-hex"),
            Err(CryptoError::InvalidPublicKey(_))
        ));
        assert!(matches!(
            KeyPair::from_private_key_hex("abcd"),
            Err(CryptoError::InvalidPrivateKey(_))
        ));
    }
}
