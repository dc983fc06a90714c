//! Content maps: the persisted form of a credential's key material.
//!
//! A content map has exactly three entries, keyed by the role tags "A", "E" and "S", each holding
//! a cert string. The public map holds public certs, the private map holds encrypted private certs.

use crate::error::{Error, Result};
use nym_crypto::KeyRole;
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

pub type ContentMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Public,
    Private,
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Public => write!(f, "public"),
            ContentKind::Private => write!(f, "private"),
        }
    }
}

/// One value per key role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles<T> {
    pub authentication: T,
    pub encryption: T,
    pub signing: T,
}

impl<T> Roles<T> {
    pub fn get(&self, role: KeyRole) -> &T {
        match role {
            KeyRole::Authentication => &self.authentication,
            KeyRole::Encryption => &self.encryption,
            KeyRole::Signing => &self.signing,
        }
    }

    pub fn get_mut(&mut self, role: KeyRole) -> &mut T {
        match role {
            KeyRole::Authentication => &mut self.authentication,
            KeyRole::Encryption => &mut self.encryption,
            KeyRole::Signing => &mut self.signing,
        }
    }

    /// Builds all three values in A, E, S order, stopping at the first failure.
    pub fn try_from_fn<E>(mut f: impl FnMut(KeyRole) -> std::result::Result<T, E>) -> std::result::Result<Self, E> {
        Ok(Self {
            authentication: f(KeyRole::Authentication)?,
            encryption: f(KeyRole::Encryption)?,
            signing: f(KeyRole::Signing)?,
        })
    }

    pub fn from_fn(mut f: impl FnMut(KeyRole) -> T) -> Self {
        Self {
            authentication: f(KeyRole::Authentication),
            encryption: f(KeyRole::Encryption),
            signing: f(KeyRole::Signing),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyRole, &T)> {
        KeyRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}

/// Checks that `map` has exactly the entries "A", "E" and "S" and returns them by role.
pub(crate) fn validate(map: &ContentMap, kind: ContentKind) -> Result<Roles<&str>> {
    if map.len() != KeyRole::ALL.len() {
        tracing::error!(
            "Failure: Expected 3 in {} content map, but the actual value was: {}",
            kind,
            map.len()
        );
        return Err(Error::ContentMapSize { kind, found: map.len() });
    }
    Roles::try_from_fn(|role| {
        map.get(&role.tag().to_string())
            .map(String::as_str)
            .ok_or_else(|| {
                tracing::error!("Failure: Unable to find {} {} key.", kind, role.name());
                Error::MissingRoleKey { kind, role }
            })
    })
}

/// Assembles a content map from per-role cert strings.
pub(crate) fn assemble(certs: Roles<String>) -> ContentMap {
    let Roles {
        authentication,
        encryption,
        signing,
    } = certs;
    [
        (KeyRole::Authentication, authentication),
        (KeyRole::Encryption, encryption),
        (KeyRole::Signing, signing),
    ]
    .into_iter()
    .map(|(role, cert)| (role.tag().to_string(), cert))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn full() -> ContentMap {
        btreemap! {
            "A".to_owned() => "auth".to_owned(),
            "E".to_owned() => "encr".to_owned(),
            "S".to_owned() => "sign".to_owned(),
        }
    }

    #[test]
    fn accepts_exactly_three_roles() {
        let map = full();
        let roles = validate(&map, ContentKind::Public).unwrap();
        assert_eq!(roles.get(KeyRole::Authentication), &"auth");
        assert_eq!(roles.get(KeyRole::Encryption), &"encr");
        assert_eq!(roles.get(KeyRole::Signing), &"sign");
    }

    #[test]
    fn rejects_wrong_sizes() {
        let mut map = full();
        map.insert("X".to_owned(), "extra".to_owned());
        assert!(matches!(
            validate(&map, ContentKind::Private),
            Err(Error::ContentMapSize {
                kind: ContentKind::Private,
                found: 4
            })
        ));
        map.clear();
        assert!(matches!(
            validate(&map, ContentKind::Public),
            Err(Error::ContentMapSize { found: 0, .. })
        ));
    }

    #[test]
    fn rejects_missing_roles() {
        let mut map = full();
        map.remove("E");
        map.insert("e".to_owned(), "lowercase".to_owned());
        assert!(matches!(
            validate(&map, ContentKind::Public),
            Err(Error::MissingRoleKey {
                role: KeyRole::Encryption,
                ..
            })
        ));
    }

    #[test]
    fn assemble_uses_role_tags() {
        let map = assemble(Roles::from_fn(|role| role.name().to_owned()));
        assert_eq!(map.len(), 3);
        assert_eq!(map["A"], "authentication");
        assert_eq!(map["E"], "encryption");
        assert_eq!(map["S"], "signing");
    }
}
