use crate::{
    error::{Error, Result},
    pair::KeyPair,
    public::PublicKey,
};
use rand::rngs::OsRng;
use std::fmt::{self, Debug};
use zeroize::Zeroize;

/// A private key.
///
/// Currently this is just a newtype wrapper around an ed25519 secret key. It never leaves memory
/// in clear text: the only persisted form is [`EncryptedPrivateKey`](crate::EncryptedPrivateKey).
/// The bytes are zeroed when the value is dropped.
///
/// It seems like SecretKey is often used in the context of symmetric encryption, so we
/// call this PrivateKey, unlike the wrapped type.
#[derive(Clone, Eq, PartialEq)]
pub struct PrivateKey(pub(crate) [u8; 32]);

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "secret")
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<ed25519_dalek::SecretKey> for PrivateKey {
    fn from(value: ed25519_dalek::SecretKey) -> Self {
        PrivateKey(value.to_bytes())
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private: PrivateKey) -> KeyPair {
        let public = private.public_key();
        KeyPair { public, private }
    }
}

impl PrivateKey {
    pub fn to_ed25519(&self) -> ed25519_dalek::SecretKey {
        // any 32 bytes form a valid ed25519 secret, and the array length is fixed
        ed25519_dalek::SecretKey::from_bytes(&self.0).expect("32 bytes are always a valid ed25519 secret")
    }

    pub fn public_key(&self) -> PublicKey {
        let secret = self.to_ed25519();
        let public: ed25519_dalek::PublicKey = (&secret).into();
        public.into()
    }

    pub(crate) fn as_bytes(&self) -> &[u8; ed25519_dalek::SECRET_KEY_LENGTH] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let ed25519 = ed25519_dalek::SecretKey::from_bytes(bytes).map_err(|e| Error::decode("private key", e))?;
        Ok(ed25519.into())
    }

    pub fn generate() -> Self {
        let k = ed25519_dalek::Keypair::generate(&mut OsRng);
        k.secret.into()
    }
}
