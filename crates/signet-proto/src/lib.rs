//! # signet-proto
//!
//! Wire messages for Signet tokens.
//!
//! A token on the wire is a protobuf-encoded [`TokenEnvelope`] whose `payload`
//! field holds the protobuf encoding of a [`ClaimSet`], signed verbatim.
//!
//! Encoding is deterministic: fields are written in tag order and custom
//! claims are kept in a `BTreeMap`. Decoding skips unknown fields so newer
//! issuers can add claims without breaking older verifiers.

pub mod error;
pub mod messages;

pub use error::CodecError;
pub use messages::{
    ClaimSet, TokenEnvelope, decode_claims, decode_envelope, encode_claims, encode_envelope,
};
