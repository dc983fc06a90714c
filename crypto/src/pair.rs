use crate::{metadata::SignatureMetadata, private::PrivateKey, public::PublicKey, signature::Signature};
use std::fmt::{self, Debug};

/// A keypair.
///
/// Conceptually, this is a generic keypair. But currently we only support ed25519.
#[derive(Clone)]
pub struct KeyPair {
    pub(crate) public: PublicKey,
    pub(crate) private: PrivateKey,
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}
impl Eq for KeyPair {}

impl Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("public", &self.public).finish()
    }
}

impl KeyPair {
    pub fn generate() -> Self {
        PrivateKey::generate().into()
    }

    pub fn pub_key(&self) -> PublicKey {
        self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn sign_raw(&self, message: &[u8]) -> [u8; 64] {
        let secret_key = self.private.to_ed25519();
        let public = ed25519_dalek::PublicKey::from(&secret_key);
        ed25519_dalek::ExpandedSecretKey::from(&secret_key)
            .sign(message, &public)
            .to_bytes()
    }

    /// Signs `message`, embedding `metadata` into the resulting signature when given.
    pub fn sign(&self, message: &[u8], metadata: Option<SignatureMetadata>) -> Signature {
        Signature::new(self.sign_raw(message), metadata)
    }
}
