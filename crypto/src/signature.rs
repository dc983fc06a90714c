use crate::{
    error::{Error, Result},
    metadata::SignatureMetadata,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{self, Display},
    io::{Cursor, Read},
    str::FromStr,
};

const SCHEME_PLAIN: u8 = 1;
const SCHEME_WITH_METADATA: u8 = 2;
const SIGNATURE_LENGTH: usize = 64;

/// An Ed25519 signature, optionally tagged with the [`SignatureMetadata`] of its signer.
///
/// Packed representation:
///
///  - 1 octet scheme identifier
///      - 1: Ed25519/SHA512 without metadata
///      - 2: Ed25519/SHA512 with metadata
///  - 4 octets of metadata (scheme 2 only)
///  - 64 octets of signature
///
/// The string form is the base64 encoding of the packed bytes.
///
/// Every metadata octet, the key type included, must be printable ASCII; anything else is
/// rejected while parsing with [`Error::InvalidMetadata`]. A printable key type that names no
/// role is accepted here and left for the signer lookup to report.
///
/// ```rust
/// use nym_crypto::Signature;
///
/// # let mut bytes = [0u8; 65];
/// # bytes[0] = 1;
/// let signature = Signature::from_bytes(&bytes[..])?;
/// assert!(signature.metadata().is_none());
/// # Ok::<(), nym_crypto::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    pub(crate) bytes: [u8; SIGNATURE_LENGTH],
    metadata: Option<SignatureMetadata>,
}

impl Signature {
    pub fn new(bytes: [u8; SIGNATURE_LENGTH], metadata: Option<SignatureMetadata>) -> Self {
        Self { bytes, metadata }
    }

    /// The raw Ed25519 signature octets.
    pub fn bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn metadata(&self) -> Option<&SignatureMetadata> {
        self.metadata.as_ref()
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Returns the same signature with the metadata replaced (or removed).
    pub fn with_metadata(self, metadata: Option<SignatureMetadata>) -> Self {
        Self { metadata, ..self }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + SignatureMetadata::LEN + SIGNATURE_LENGTH);
        match self.metadata {
            Some(meta) => {
                out.write_u8(SCHEME_WITH_METADATA).expect("writing to signature buffer");
                out.extend_from_slice(&meta.to_bytes());
            }
            None => out.write_u8(SCHEME_PLAIN).expect("writing to signature buffer"),
        }
        out.extend_from_slice(&self.bytes);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let scheme = cursor
            .read_u8()
            .map_err(|_| Error::decode("signature", "empty input"))?;
        let (metadata, expected) = match scheme {
            SCHEME_PLAIN => (None, 1 + SIGNATURE_LENGTH),
            SCHEME_WITH_METADATA => {
                let mut meta = [0u8; SignatureMetadata::LEN];
                cursor
                    .read_exact(&mut meta)
                    .map_err(|_| Error::decode("signature", "truncated metadata"))?;
                (
                    Some(SignatureMetadata::from_bytes(meta)?),
                    1 + SignatureMetadata::LEN + SIGNATURE_LENGTH,
                )
            }
            other => return Err(Error::decode("signature", format!("invalid signature scheme {}", other))),
        };
        if bytes.len() != expected {
            return Err(Error::decode(
                "signature",
                format!("invalid signature length {} (expected {})", bytes.len(), expected),
            ));
        }
        let mut sig = [0u8; SIGNATURE_LENGTH];
        cursor
            .read_exact(&mut sig)
            .map_err(|_| Error::decode("signature", "truncated signature"))?;
        Ok(Self { bytes: sig, metadata })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("metadata", &self.metadata)
            .field("bytes", &base64::encode(self.bytes))
            .finish()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", base64::encode(self.to_bytes()))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let data = base64::decode(s).map_err(|e| Error::decode("signature", e))?;
        Self::from_bytes(&data)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = <String>::deserialize(d)?;
        s.parse().map_err(|x: Error| D::Error::custom(x.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn must_read_packed_signature() {
        let mut plain = [0u8; 65];
        plain[0] = SCHEME_PLAIN;
        plain[64] = 7;
        let sig = Signature::from_bytes(&plain[..]).unwrap();
        assert_eq!(sig.metadata(), None);
        assert_eq!(sig.bytes()[63], 7);
        assert_eq!(sig.to_bytes(), plain.to_vec());

        let mut tagged = vec![SCHEME_WITH_METADATA, b'S', b'a', b'b', b'c'];
        tagged.extend_from_slice(&[9u8; 64]);
        let sig = Signature::from_bytes(&tagged).unwrap();
        assert_eq!(sig.metadata().map(|m| m.to_string()), Some("Sabc".to_owned()));
        assert_eq!(sig.to_bytes(), tagged);
    }

    #[test]
    fn must_reject_bad_packing() {
        assert!(Signature::from_bytes(&[]).is_err());
        assert!(Signature::from_bytes(&[3u8; 65])
            .unwrap_err()
            .to_string()
            .contains("invalid signature scheme"));
        let mut short = [0u8; 64];
        short[0] = SCHEME_PLAIN;
        assert!(Signature::from_bytes(&short)
            .unwrap_err()
            .to_string()
            .contains("invalid signature length"));
        let mut long = vec![SCHEME_PLAIN];
        long.extend_from_slice(&[0u8; 65]);
        assert!(Signature::from_bytes(&long).is_err());
        // metadata slots must be printable ASCII
        let mut bad_meta = vec![SCHEME_WITH_METADATA, b'S', 0, b'b', b'c'];
        bad_meta.extend_from_slice(&[0u8; 64]);
        assert!(Signature::from_bytes(&bad_meta).is_err());
    }

    #[test]
    fn key_type_slot_is_checked_when_parsing() {
        let mut control = vec![SCHEME_WITH_METADATA, 0x01, b'a', b'b', b'c'];
        control.extend_from_slice(&[0u8; 64]);
        assert!(matches!(Signature::from_bytes(&control), Err(Error::InvalidMetadata(_))));

        // printable but not a role: parses, role lookup yields nothing
        let mut unknown = vec![SCHEME_WITH_METADATA, b'Z', b'a', b'b', b'c'];
        unknown.extend_from_slice(&[0u8; 64]);
        let sig = Signature::from_bytes(&unknown).unwrap();
        assert_eq!(sig.metadata().map(|m| m.key_type()), Some('Z'));
        assert_eq!(sig.metadata().and_then(|m| m.role()), None);
    }

    #[test]
    fn serialize_deserialize() {
        let meta = SignatureMetadata::new('A', 'x', 'y', 'z').unwrap();
        let sig = Signature::new([42u8; 64], Some(meta));
        let serialized = serde_json::to_string(&sig).unwrap();
        assert_eq!(serialized, format!("\"{}\"", sig));
        let deserialized: Signature = serde_json::from_str(&serialized).unwrap();
        assert_eq!(sig, deserialized);
    }
}
