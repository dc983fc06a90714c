use crate::{
    error::{Error, Result},
    role::KeyRole,
};
use std::{
    convert::TryFrom,
    fmt::{self, Display},
};

/// Compact hint embedded into a signature, naming the key that probably produced it.
///
/// The four slots hold the key type letter followed by one character each of the Nym ID, the
/// master credential ID and the credential's own ID. A verifier uses the tag to narrow down which
/// public keys are worth trying instead of testing every key it knows.
///
/// The key type is kept as a raw character: a signature may carry a letter that does not name any
/// [`KeyRole`], and that must be reportable rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureMetadata {
    key_type: char,
    nym_id: char,
    master_credential_id: char,
    sub_credential_id: char,
}

impl SignatureMetadata {
    pub const LEN: usize = 4;

    pub fn new(key_type: char, nym_id: char, master_credential_id: char, sub_credential_id: char) -> Result<Self> {
        for (slot, c) in [
            ("key type", key_type),
            ("nym id", nym_id),
            ("master credential id", master_credential_id),
            ("sub credential id", sub_credential_id),
        ] {
            if !c.is_ascii_graphic() {
                return Err(Error::InvalidMetadata(format!("{} slot holds {:?}", slot, c)));
            }
        }
        Ok(Self {
            key_type,
            nym_id,
            master_credential_id,
            sub_credential_id,
        })
    }

    /// Tag for a key of the given role; the identity characters are shared by all keys of a credential.
    pub fn for_role(role: KeyRole, nym_id: char, master_credential_id: char, sub_credential_id: char) -> Result<Self> {
        Self::new(role.tag(), nym_id, master_credential_id, sub_credential_id)
    }

    pub fn key_type(&self) -> char {
        self.key_type
    }

    /// The role named by the key type slot, if it names one.
    pub fn role(&self) -> Option<KeyRole> {
        KeyRole::try_from(self.key_type).ok()
    }

    pub fn nym_id(&self) -> char {
        self.nym_id
    }

    pub fn master_credential_id(&self) -> char {
        self.master_credential_id
    }

    pub fn sub_credential_id(&self) -> char {
        self.sub_credential_id
    }

    /// The three identity characters, without the key type.
    pub fn identity(&self) -> (char, char, char) {
        (self.nym_id, self.master_credential_id, self.sub_credential_id)
    }

    pub fn to_bytes(self) -> [u8; Self::LEN] {
        // construction guarantees ASCII, so each char fits a byte
        [
            self.key_type as u8,
            self.nym_id as u8,
            self.master_credential_id as u8,
            self.sub_credential_id as u8,
        ]
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Result<Self> {
        let [a, b, c, d] = bytes;
        Self::new(a as char, b as char, c as char, d as char)
    }
}

impl Display for SignatureMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.key_type, self.nym_id, self.master_credential_id, self.sub_credential_id
        )
    }
}

#[cfg(any(test, feature = "arb"))]
mod arb {
    use super::SignatureMetadata;
    use quickcheck::{Arbitrary, Gen};

    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

    impl Arbitrary for SignatureMetadata {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut c = || char::from(*g.choose(ALPHABET).unwrap());
            Self {
                key_type: c(),
                nym_id: c(),
                master_credential_id: c(),
                sub_credential_id: c(),
            }
        }
    }
}
