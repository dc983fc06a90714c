//! Narrowing down which public key may have produced a signature.
//!
//! Verifying an artifact against every key of every credential of a Nym is wasteful. Signatures
//! made by tagged keys carry [`SignatureMetadata`](nym_crypto::SignatureMetadata) naming the key
//! role and the credential; together with an optional hint from the caller this selects at most
//! one key per credential.

use crate::{
    error::{Error, Result},
    key_credential::KeyCredential,
};
use nym_crypto::{KeyMaterial, KeyRole, PublicKey, Signature};
use std::{
    convert::TryFrom,
    fmt::{self, Display},
};

/// What the caller knows about the role of the key that made a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTypeHint {
    /// Nothing; only signatures with metadata can be attributed. Written as `'0'`.
    Unspecified,
    /// The signature is expected to come from a key of this role, metadata or not.
    Role(KeyRole),
}

impl TryFrom<char> for KeyTypeHint {
    type Error = Error;

    fn try_from(hint: char) -> Result<Self> {
        match hint {
            '0' => Ok(KeyTypeHint::Unspecified),
            other => KeyRole::try_from(other).map(KeyTypeHint::Role).map_err(|_| {
                tracing::error!("Unexpected value for key type argument (should be 0, A, E, or S): {}", other);
                Error::InvalidKeyTypeArgument(other)
            }),
        }
    }
}

impl From<KeyRole> for KeyTypeHint {
    fn from(role: KeyRole) -> Self {
        KeyTypeHint::Role(role)
    }
}

impl Display for KeyTypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTypeHint::Unspecified => write!(f, "0"),
            KeyTypeHint::Role(role) => write!(f, "{}", role),
        }
    }
}

impl<K: KeyMaterial> KeyCredential<K> {
    /// Public keys of this credential worth trying for `signature`.
    ///
    /// Without a hint, an untagged signature yields no candidates and a tagged one selects the
    /// key of the tagged role. With a role hint, that role's key is returned unless both it and
    /// the signature are tagged and the tags differ. An empty result means "no plausible key";
    /// an `Err` means the input could not be interpreted.
    pub fn public_keys_by_signature(&self, signature: &Signature, hint: KeyTypeHint) -> Result<Vec<PublicKey>> {
        match hint {
            KeyTypeHint::Unspecified => {
                let metadata = match signature.metadata() {
                    Some(metadata) => metadata,
                    None => return Ok(vec![]),
                };
                let role = metadata.role().ok_or_else(|| {
                    tracing::error!(
                        "Unexpected keyType value in signature metadata: {}",
                        metadata.key_type()
                    );
                    Error::UnrecognizedMetadataKeyType(metadata.key_type())
                })?;
                Ok(self.key(role).public_keys_by_signature(signature, false))
            }
            KeyTypeHint::Role(role) => Ok(self.key(role).public_keys_by_signature(signature, true)),
        }
    }
}
