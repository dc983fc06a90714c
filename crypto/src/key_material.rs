//! A single keypair as seen by a credential.
//!
//! [`KeyMaterial`] is the seam between the credential engine and the asymmetric primitive:
//! generation, cert string import/export, signing, re-encryption and the metadata filter used
//! for narrowing down signature candidates. [`AsymmetricKey`] implements it with Ed25519 keys
//! whose private half is only ever held encrypted.

use crate::{
    cipher::EncryptedPrivateKey,
    error::{Error, Result},
    metadata::SignatureMetadata,
    pair::KeyPair,
    password::{KeyringRef, Password, PasswordContext},
    public::PublicKey,
    signature::Signature,
};
use std::str::FromStr;

pub trait KeyMaterial: Clone {
    /// Replaces any loaded key with a freshly generated keypair of (at least) the given strength.
    fn make_new_keypair(&mut self, bits: u32) -> Result<()>;

    /// Pushes both halves through their encoded form and loads them back, so that the in-memory
    /// state is exactly what a later load of the exported certs would produce.
    fn save_and_reload(&mut self) -> Result<()>;

    /// The public cert string.
    fn public_cert(&self) -> Result<String>;

    /// The private cert string, encrypted under whichever password it was generated or last
    /// loaded with: the ambient default after generation or an import, the export password
    /// after an export.
    fn private_cert(&self, reason: &str) -> Result<String>;

    fn set_public_key(&mut self, cert: &str) -> Result<()>;

    /// Loads the private cert, proving that `password` opens it.
    fn load_private_key(&mut self, cert: &str, reason: &str, password: PasswordContext<'_>) -> Result<()>;

    /// Recovers the public half from a private cert and installs it.
    fn load_public_key_from_private(&mut self, cert: &str, reason: &str, password: PasswordContext<'_>)
        -> Result<()>;

    /// Signs `payload` with the private half, attaching this key's metadata if it has any.
    fn sign(&self, payload: &[u8], password: PasswordContext<'_>) -> Result<Signature>;

    fn verify(&self, payload: &[u8], signature: &Signature) -> bool;

    /// Produces the private cert re-encrypted for import (to the ambient password, from
    /// `password`) or export (from the ambient password, to `password`). Does not modify `self`.
    fn re_encrypt(&self, password: &Password, importing: bool) -> Result<String>;

    /// Returns this key if it could have produced `signature`.
    ///
    /// If both sides carry metadata, they must match exactly. Otherwise the key is only
    /// returned when `inclusive` is set.
    fn public_keys_by_signature(&self, signature: &Signature, inclusive: bool) -> Vec<PublicKey>;

    fn set_metadata(&mut self, metadata: SignatureMetadata);

    fn metadata(&self) -> Option<&SignatureMetadata>;

    fn public_key(&self) -> Option<PublicKey>;
}

/// Ed25519 key material whose private half is held encrypted.
#[derive(Debug, Clone)]
pub struct AsymmetricKey {
    keyring: KeyringRef,
    public: Option<PublicKey>,
    private: Option<EncryptedPrivateKey>,
    metadata: Option<SignatureMetadata>,
}

impl AsymmetricKey {
    pub fn new(keyring: KeyringRef) -> Self {
        Self {
            keyring,
            public: None,
            private: None,
            metadata: None,
        }
    }

    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    fn open(&self, cert: &EncryptedPrivateKey, password: PasswordContext<'_>) -> Result<KeyPair> {
        let password = self.keyring.resolve(password);
        Ok(cert.open(password, self.keyring.kdf())?.into())
    }

    fn unlock(&self, password: PasswordContext<'_>) -> Result<KeyPair> {
        let cert = self.private.as_ref().ok_or(Error::MissingPrivateKey)?;
        self.open(cert, password)
    }
}

impl KeyMaterial for AsymmetricKey {
    fn make_new_keypair(&mut self, bits: u32) -> Result<()> {
        if bits == 0 {
            return Err(Error::Generation("requested key strength is zero bits".to_owned()));
        }
        tracing::debug!(bits, "generating ed25519 keypair (fixed size, requested strength is advisory)");
        let pair = KeyPair::generate();
        let sealed = EncryptedPrivateKey::seal(
            pair.private_key(),
            self.keyring.resolve(PasswordContext::Ambient),
            self.keyring.kdf(),
        )?;
        self.public = Some(pair.pub_key());
        self.private = Some(sealed);
        Ok(())
    }

    fn save_and_reload(&mut self) -> Result<()> {
        let public = PublicKey::from_str(&self.public_cert()?)?;
        let private = match &self.private {
            Some(cert) => {
                let reloaded = EncryptedPrivateKey::from_str(&cert.to_string())?;
                if self.open(&reloaded, PasswordContext::Ambient)?.pub_key() != public {
                    return Err(Error::Generation("reloaded private key does not match public key".to_owned()));
                }
                Some(reloaded)
            }
            None => None,
        };
        self.public = Some(public);
        self.private = private;
        Ok(())
    }

    fn public_cert(&self) -> Result<String> {
        self.public.map(|key| key.to_string()).ok_or(Error::MissingPublicKey)
    }

    fn private_cert(&self, reason: &str) -> Result<String> {
        tracing::debug!(reason, "exporting private cert");
        self.private
            .as_ref()
            .map(|cert| cert.to_string())
            .ok_or(Error::MissingPrivateKey)
    }

    fn set_public_key(&mut self, cert: &str) -> Result<()> {
        self.public = Some(PublicKey::from_str(cert)?);
        Ok(())
    }

    fn load_private_key(&mut self, cert: &str, reason: &str, password: PasswordContext<'_>) -> Result<()> {
        tracing::debug!(reason, "loading private cert");
        let cert = EncryptedPrivateKey::from_str(cert)?;
        self.open(&cert, password)?;
        self.private = Some(cert);
        Ok(())
    }

    fn load_public_key_from_private(
        &mut self,
        cert: &str,
        reason: &str,
        password: PasswordContext<'_>,
    ) -> Result<()> {
        tracing::debug!(reason, "recovering public key from private cert");
        let cert = EncryptedPrivateKey::from_str(cert)?;
        self.public = Some(self.open(&cert, password)?.pub_key());
        Ok(())
    }

    fn sign(&self, payload: &[u8], password: PasswordContext<'_>) -> Result<Signature> {
        let pair = self.unlock(password)?;
        Ok(pair.sign(payload, self.metadata))
    }

    fn verify(&self, payload: &[u8], signature: &Signature) -> bool {
        self.public.map_or(false, |key| key.verify(payload, signature))
    }

    fn re_encrypt(&self, password: &Password, importing: bool) -> Result<String> {
        let cert = self.private.as_ref().ok_or(Error::MissingPrivateKey)?;
        let ambient = self.keyring.resolve(PasswordContext::Ambient);
        let (from, to) = if importing { (password, ambient) } else { (ambient, password) };
        Ok(cert.reseal(from, to, self.keyring.kdf())?.to_string())
    }

    fn public_keys_by_signature(&self, signature: &Signature, inclusive: bool) -> Vec<PublicKey> {
        let public = match self.public {
            Some(public) => public,
            None => return vec![],
        };
        let candidate = match (self.metadata.as_ref(), signature.metadata()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => inclusive,
        };
        if candidate {
            vec![public]
        } else {
            vec![]
        }
    }

    fn set_metadata(&mut self, metadata: SignatureMetadata) {
        self.metadata = Some(metadata);
    }

    fn metadata(&self) -> Option<&SignatureMetadata> {
        self.metadata.as_ref()
    }

    fn public_key(&self) -> Option<PublicKey> {
        self.public
    }
}
