use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Position of the identifier character that goes into signature metadata.
///
/// For the ID `otxBk69JB8oaGLo8U6UrC4ZxXoYcRBzUSc92` that is the `B`.
pub const METADATA_INDEX: usize = 3;

fn digest(bytes: &[u8]) -> String {
    base64::encode_config(Sha256::digest(bytes), base64::URL_SAFE_NO_PAD)
}

/// Identifier of a Nym, derived by hashing its source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NymId(String);

impl NymId {
    pub fn from_source(source: &str) -> Self {
        Self(digest(source.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.0.chars().nth(index)
    }
}

/// Identifier of a single credential, derived by hashing its signed contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(String);

impl CredentialId {
    pub(crate) fn from_contents(contents: &[u8]) -> Self {
        Self(digest(contents))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.0.chars().nth(index)
    }
}

/// Where a key credential sits in its Nym's hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialKind {
    /// Self-rooted; its own ID doubles as the master credential ID.
    Master,
    /// Signed under the master credential with the given ID.
    Subkey { master: CredentialId },
}

/// Identity fields of the credential set owning a key credential, looked up at call time.
pub trait CredentialOwner {
    fn nym_id(&self) -> Option<&NymId>;
    fn master_credential_id(&self) -> Option<&CredentialId>;
}

/// A detached snapshot of an owner's identity fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerIdentity {
    pub nym_id: Option<NymId>,
    pub master_credential_id: Option<CredentialId>,
}

impl CredentialOwner for OwnerIdentity {
    fn nym_id(&self) -> Option<&NymId> {
        self.nym_id.as_ref()
    }

    fn master_credential_id(&self) -> Option<&CredentialId> {
        self.master_credential_id.as_ref()
    }
}
