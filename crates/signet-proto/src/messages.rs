//! Protobuf message definitions and codec functions.

use crate::error::CodecError;
use prost::Message;
use std::collections::BTreeMap;

/// The signed claim set.
#[derive(Clone, PartialEq, Message)]
pub struct ClaimSet {
    #[prost(string, tag = "1")]
    pub subject: String,
    #[prost(string, tag = "2")]
    pub audience: String,
    #[prost(string, repeated, tag = "3")]
    pub roles: Vec<String>,
    #[prost(btree_map = "string, string", tag = "4")]
    pub custom_claims: BTreeMap<String, String>,
    #[prost(bytes = "vec", tag = "5")]
    pub session_id: Vec<u8>,
    #[prost(int64, tag = "6")]
    pub issued_at: i64,
    #[prost(int64, tag = "7")]
    pub expires_at: i64,
    #[prost(string, tag = "8")]
    pub key_id: String,
}

/// Encoded claim set bytes paired with their signature.
///
/// Both fields track presence so a missing field can be told apart from an
/// empty one.
#[derive(Clone, PartialEq, Message)]
pub struct TokenEnvelope {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub payload: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub signature: Option<Vec<u8>>,
}

impl TokenEnvelope {
    /// Create an envelope from encoded payload bytes and a signature.
    pub fn new(payload: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            signature: Some(signature),
        }
    }
}

/// Encode a claim set to its canonical bytes.
pub fn encode_claims(claims: &ClaimSet) -> Result<Vec<u8>, CodecError> {
    encode(claims, "claim set")
}

/// Decode a claim set.
pub fn decode_claims(bytes: &[u8]) -> Result<ClaimSet, CodecError> {
    ClaimSet::decode(bytes).map_err(|source| CodecError::Decode {
        message: "claim set",
        source,
    })
}

/// Encode a token envelope to wire bytes.
pub fn encode_envelope(envelope: &TokenEnvelope) -> Result<Vec<u8>, CodecError> {
    encode(envelope, "token envelope")
}

/// Decode a token envelope from wire bytes.
pub fn decode_envelope(bytes: &[u8]) -> Result<TokenEnvelope, CodecError> {
    TokenEnvelope::decode(bytes).map_err(|source| CodecError::Decode {
        message: "token envelope",
        source,
    })
}

fn encode<M: Message>(message: &M, name: &'static str) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut buf)
        .map_err(|source| CodecError::Encode {
            message: name,
            source,
        })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> ClaimSet {
        let mut custom_claims = BTreeMap::new();
        custom_claims.insert("tenant".to_string(), "acme".to_string());
        custom_claims.insert("region".to_string(), "eu".to_string());

        ClaimSet {
            subject: "user-123".into(),
            audience: "api-backend".into(),
            roles: vec!["admin".into(), "admin".into(), "auditor".into()],
            custom_claims,
            session_id: b"sid-1".to_vec(),
            issued_at: 1_700_000_000,
            expires_at: 1_700_000_900,
            key_id: "v1".into(),
        }
    }

    #[test]
    fn test_claims_roundtrip_preserves_order_and_duplicates() {
        let claims = sample_claims();
        let bytes = encode_claims(&claims).unwrap();
        let decoded = decode_claims(&bytes).unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.roles, vec!["admin", "admin", "auditor"]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = sample_claims();

        // Same claims inserted in the opposite order.
        let mut b = sample_claims();
        b.custom_claims.clear();
        b.custom_claims.insert("region".to_string(), "eu".to_string());
        b.custom_claims.insert("tenant".to_string(), "acme".to_string());

        assert_eq!(encode_claims(&a).unwrap(), encode_claims(&b).unwrap());
    }

    #[test]
    fn test_envelope_tracks_field_presence() {
        let bytes = encode_envelope(&TokenEnvelope::new(Vec::new(), vec![1, 2, 3])).unwrap();
        let decoded = decode_envelope(&bytes).unwrap();
        assert_eq!(decoded.payload, Some(Vec::new()));
        assert_eq!(decoded.signature, Some(vec![1, 2, 3]));

        let decoded = decode_envelope(&[]).unwrap();
        assert!(decoded.payload.is_none());
        assert!(decoded.signature.is_none());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_envelope(b"\xff\xff\xff").unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));

        let err = decode_claims(&[0x0a, 0x05, b'a']).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn test_decode_skips_unknown_fields() {
        let mut bytes = encode_claims(&sample_claims()).unwrap();
        // Field 99, varint wire type, value 1.
        bytes.extend_from_slice(&[0x98, 0x06, 0x01]);

        let decoded = decode_claims(&bytes).unwrap();
        assert_eq!(decoded, sample_claims());
    }
}
