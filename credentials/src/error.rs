use crate::{content::ContentKind, identity::NymId, CredentialId};
use nym_crypto::KeyRole;

/// How bad a failure is.
///
/// `Validation` and `Crypto` failures are recoverable: the caller can retry with corrected input
/// or the right password. `Invariant` means the environment or the code is broken and the
/// operation must not be retried blindly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Crypto,
    Invariant,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Expected 3 entries in the {kind} content map, but found {found}.")]
    ContentMapSize { kind: ContentKind, found: usize },
    #[error("Unable to find the {kind} {} key ('{}').", .role.name(), .role.tag())]
    MissingRoleKey { kind: ContentKind, role: KeyRole },
    #[error("Unexpected value for key type argument (should be 0, A, E, or S): '{0}'")]
    InvalidKeyTypeArgument(char),
    #[error("Unexpected key type value in signature metadata: '{0}'")]
    UnrecognizedMetadataKeyType(char),
    #[error("{} key: {source}", .role.name())]
    Crypto {
        role: KeyRole,
        #[source]
        source: nym_crypto::Error,
    },
    #[error("Declared Nym ID {declared} does not match {expected}.")]
    NymIdMismatch { declared: NymId, expected: String },
    #[error("Declared master credential ID {declared} does not match {actual}.")]
    MasterCredentialMismatch { declared: CredentialId, actual: String },
    #[error("Credential is not signed by its own signing key.")]
    NotSignedBySelf,
    #[error("Credential carries no self-signature.")]
    Unsigned,
    #[error("Invalid signature for provided input.")]
    InvalidSignature,
    #[error("Credential has no public contents.")]
    MissingPublicContents,
    #[error("Credential has no private contents.")]
    MissingPrivateContents,
    #[error("A credential set must be rooted in a master credential.")]
    NotMasterCredential,
    #[error("No subkey credential with ID {0}.")]
    UnknownSubkey(CredentialId),
    #[error("Cannot serialize input canonically: {0}")]
    Canonicalize(#[from] serde_cbor::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Crypto { .. } | Error::Canonicalize(_) => ErrorKind::Crypto,
            Error::Invariant(_) => ErrorKind::Invariant,
            _ => ErrorKind::Validation,
        }
    }

    /// Whether this failure signals a broken environment rather than bad input.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }

    pub(crate) fn crypto(role: KeyRole) -> impl FnOnce(nym_crypto::Error) -> Self {
        move |source| Error::Crypto { role, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_failures() {
        assert_eq!(Error::InvalidKeyTypeArgument('x').kind(), ErrorKind::Validation);
        let crypto = Error::crypto(KeyRole::Signing)(nym_crypto::Error::Decrypt);
        assert_eq!(crypto.kind(), ErrorKind::Crypto);
        assert!(!crypto.is_fatal());
        assert!(Error::Invariant("boom".into()).is_fatal());
    }

    #[test]
    fn messages_name_the_role() {
        let err = Error::MissingRoleKey {
            kind: ContentKind::Private,
            role: KeyRole::Encryption,
        };
        assert_eq!(err.to_string(), "Unable to find the private encryption key ('E').");
        let err = Error::crypto(KeyRole::Authentication)(nym_crypto::Error::MissingPrivateKey);
        assert_eq!(err.to_string(), "authentication key: No private key loaded.");
    }
}
