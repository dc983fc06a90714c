use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    fmt::{self, Display},
    str::FromStr,
};

/// The functional purpose of one keypair inside a credential.
///
/// Each role is identified on the wire by a single letter, which doubles as the key of the
/// persisted content maps and as the `key_type` slot of [`SignatureMetadata`](crate::SignatureMetadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum KeyRole {
    Authentication,
    Encryption,
    Signing,
}

impl KeyRole {
    /// All roles, in the order in which content maps are loaded.
    pub const ALL: [KeyRole; 3] = [KeyRole::Authentication, KeyRole::Encryption, KeyRole::Signing];

    pub fn tag(self) -> char {
        match self {
            KeyRole::Authentication => 'A',
            KeyRole::Encryption => 'E',
            KeyRole::Signing => 'S',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyRole::Authentication => "authentication",
            KeyRole::Encryption => "encryption",
            KeyRole::Signing => "signing",
        }
    }
}

impl TryFrom<char> for KeyRole {
    type Error = Error;

    fn try_from(tag: char) -> Result<Self> {
        match tag {
            'A' => Ok(KeyRole::Authentication),
            'E' => Ok(KeyRole::Encryption),
            'S' => Ok(KeyRole::Signing),
            other => Err(Error::UnknownRole(other)),
        }
    }
}

impl From<KeyRole> for char {
    fn from(role: KeyRole) -> char {
        role.tag()
    }
}

impl FromStr for KeyRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(tag), None) => KeyRole::try_from(tag),
            _ => Err(Error::decode("key role", format!("expected a single letter, got {:?}", s))),
        }
    }
}

impl Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for role in KeyRole::ALL {
            assert_eq!(KeyRole::try_from(role.tag()).unwrap(), role);
            assert_eq!(role.to_string().parse::<KeyRole>().unwrap(), role);
        }
    }

    #[test]
    fn rejects_unknown_tags() {
        assert!(matches!(KeyRole::try_from('0'), Err(Error::UnknownRole('0'))));
        assert!(matches!(KeyRole::try_from('s'), Err(Error::UnknownRole('s'))));
        assert!("AS".parse::<KeyRole>().is_err());
        assert!("".parse::<KeyRole>().is_err());
    }

    #[test]
    fn serializes_as_letter() {
        assert_eq!(serde_json::to_string(&KeyRole::Signing).unwrap(), "\"S\"");
        let role: KeyRole = serde_json::from_str("\"E\"").unwrap();
        assert_eq!(role, KeyRole::Encryption);
    }
}
