//! Raw Ed25519 sign/verify over byte slices.

use crate::error::CryptoError;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

/// Length of an Ed25519 secret seed.
pub const SECRET_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// Length of a seed followed by its public key.
pub const KEYPAIR_LENGTH: usize = ed25519_dalek::KEYPAIR_LENGTH;
/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// Length of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Sign `data` with a raw private key.
///
/// The key may be either a 32-byte seed or a 64-byte `seed || public`
/// keypair. Any other length is rejected, as is a keypair whose public half
/// does not belong to the seed.
pub fn sign(private_key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let signing_key = signing_key_from_slice(private_key)?;
    Ok(signing_key.sign(data).to_bytes().to_vec())
}

/// Verify `signature` over `data` with a raw public key.
pub fn verify(public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key_bytes: &[u8; PUBLIC_KEY_LENGTH] = public_key.try_into().map_err(|_| {
        CryptoError::InvalidPublicKey(format!(
            "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
            public_key.len()
        ))
    })?;
    let verifying_key = VerifyingKey::from_bytes(key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignature(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        )));
    }
    let signature = Signature::from_slice(signature)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    verifying_key
        .verify_strict(data, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

pub(crate) fn signing_key_from_slice(private_key: &[u8]) -> Result<SigningKey, CryptoError> {
    match private_key.len() {
        SECRET_KEY_LENGTH => {
            let mut seed = [0u8; SECRET_KEY_LENGTH];
            seed.copy_from_slice(private_key);
            Ok(SigningKey::from_bytes(&seed))
        }
        KEYPAIR_LENGTH => {
            let mut keypair = [0u8; KEYPAIR_LENGTH];
            keypair.copy_from_slice(private_key);
            SigningKey::from_keypair_bytes(&keypair)
                .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
        }
        other => Err(CryptoError::InvalidPrivateKey(format!(
            "expected {SECRET_KEY_LENGTH} or {KEYPAIR_LENGTH} bytes, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let data = b"signet payload";

        let signature = sign(&keypair.private_key_bytes(), data).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LENGTH);

        verify(keypair.public_key().as_bytes(), data, &signature).unwrap();
    }

    #[test]
    fn test_sign_with_keypair_bytes() {
        let keypair = KeyPair::generate();
        let data = b"signet payload";

        let signature = sign(&keypair.keypair_bytes(), data).unwrap();
        verify(keypair.public_key().as_bytes(), data, &signature).unwrap();
    }

    #[test]
    fn test_verify_wrong_key() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let data = b"hello";

        let signature = sign(&signer.private_key_bytes(), data).unwrap();
        let err = verify(other.public_key().as_bytes(), data, &signature).unwrap_err();
        assert!(matches!(err, CryptoError::VerificationFailed));
    }

    #[test]
    fn test_verify_corrupted_data() {
        let keypair = KeyPair::generate();
        let signature = sign(&keypair.private_key_bytes(), b"hello").unwrap();

        let err = verify(keypair.public_key().as_bytes(), b"hellp", &signature).unwrap_err();
        assert!(matches!(err, CryptoError::VerificationFailed));
    }

    #[test]
    fn test_verify_corrupted_signature() {
        let keypair = KeyPair::generate();
        let mut signature = sign(&keypair.private_key_bytes(), b"hello").unwrap();
        signature[0] ^= 0xFF;

        assert!(verify(keypair.public_key().as_bytes(), b"hello", &signature).is_err());
    }

    #[test]
    fn test_sign_rejects_bad_private_key() {
        let err = sign(&[], b"data").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPrivateKey(_)));

        let err = sign(&[7u8; 31], b"data").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPrivateKey(_)));

        // Public half belongs to another key.
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let mut mismatched = a.keypair_bytes();
        mismatched[SECRET_KEY_LENGTH..].copy_from_slice(b.public_key().as_bytes());
        let err = sign(&mismatched, b"data").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPrivateKey(_)));
    }

    #[test]
    fn test_verify_rejects_bad_inputs() {
        let keypair = KeyPair::generate();
        let signature = sign(&keypair.private_key_bytes(), b"data").unwrap();

        let err = verify(&[1u8; 16], b"data", &signature).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPublicKey(_)));

        let err = verify(keypair.public_key().as_bytes(), b"data", &signature[..63]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignature(_)));

        let err = verify(keypair.public_key().as_bytes(), b"data", &[]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignature(_)));
    }
}
