use crate::{
    error::{Error, Result},
    signature::Signature,
};
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    convert::TryFrom,
    fmt::{self, Debug, Display},
};

/// A public key, which also serves as the public cert string of a keypair.
///
/// It consists of 32 octets which are the same bytes as the underlying `ed25519_dalek::PublicKey`.
///
/// The cert string is produced by base64-encoding the bytes and prepending an identifier for the
/// key scheme, which at the moment is only a literal '0' to identify it as an Ed25519 key.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct PublicKey(pub(crate) [u8; 32]);

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0{}", base64::encode(self.0))
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::str::FromStr for PublicKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let rest = match s.as_bytes().first() {
            None => return Err(Error::decode("public key", "empty string")),
            Some(b'0') => &s[1..],
            Some(other) => return Err(Error::decode("public key", format!("unexpected key type {}", other))),
        };
        let v = base64::decode(rest).map_err(|e| Error::decode("public key", e))?;
        Self::from_bytes(&v)
    }
}

impl PublicKey {
    /// Gets the underlying ed25519 public key for interop with rust crypto libs
    pub fn to_ed25519(self) -> Result<ed25519_dalek::PublicKey> {
        ed25519_dalek::PublicKey::from_bytes(&self.0[..]).map_err(|e| Error::decode("public key", e))
    }

    pub fn to_bytes(self) -> [u8; ed25519_dalek::PUBLIC_KEY_LENGTH] {
        self.0
    }

    /// Parses raw key bytes, rejecting wrong lengths and points that are not on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ed25519_dalek::PUBLIC_KEY_LENGTH {
            return Err(Error::decode(
                "public key",
                format!(
                    "expected {} bytes, received {}",
                    ed25519_dalek::PUBLIC_KEY_LENGTH,
                    bytes.len()
                ),
            ));
        }
        let ed25519 = ed25519_dalek::PublicKey::from_bytes(bytes).map_err(|e| Error::decode("public key", e))?;
        Ok(ed25519.into())
    }

    /// Checks the raw signature bytes over `message`; metadata plays no part in validity.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let signature = match ed25519_dalek::Signature::try_from(&signature.bytes[..]) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        let key = match self.to_ed25519() {
            Ok(key) => key,
            Err(_) => return false,
        };
        use ed25519_dalek::Verifier;
        key.verify(message, &signature).is_ok()
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<ed25519_dalek::PublicKey> for PublicKey {
    fn from(key: ed25519_dalek::PublicKey) -> Self {
        Self(*key.as_bytes())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = PublicKey;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("PublicKey")
            }
            fn visit_str<E: serde::de::Error>(self, string: &str) -> std::result::Result<Self::Value, E> {
                use std::str::FromStr;
                PublicKey::from_str(string).map_err(serde::de::Error::custom)
            }
        }
        deserializer.deserialize_str(V)
    }
}
