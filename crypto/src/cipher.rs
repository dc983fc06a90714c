//! Password-based encryption of private keys.
//!
//! - **Key derivation**: Argon2id over the password and a random 16-byte salt
//! - **Encryption**: ChaCha20-Poly1305 with a random 12-byte nonce
//!
//! Packed representation of an encrypted private key:
//!
//!  - 1 octet format version (currently 1)
//!  - 16 octets salt
//!  - 12 octets nonce
//!  - 48 octets ciphertext (32 octets key + 16 octets auth tag)
//!
//! The cert string is a literal '0' (Ed25519) followed by the base64 encoding of those bytes.

use crate::{
    error::{Error, Result},
    password::{KdfParams, Password},
    private::PrivateKey,
};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, NewAead},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use std::fmt::{self, Debug, Display};
use zeroize::Zeroize;

const VERSION: u8 = 1;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
const CIPHERTEXT_LEN: usize = 32 + 16;
const PACKED_LEN: usize = 1 + SALT_LEN + NONCE_LEN + CIPHERTEXT_LEN;

/// A private key encrypted under some password; the "private cert" of a keypair.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedPrivateKey {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

fn derive_key_encryption_key(password: &Password, salt: &[u8], kdf: &KdfParams) -> Result<[u8; 32]> {
    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(32))
        .map_err(|e| Error::Kdf(format!("invalid Argon2 params: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| Error::Kdf(e.to_string()))?;
    Ok(key)
}

impl EncryptedPrivateKey {
    /// Encrypts `key` under `password` with a fresh salt and nonce.
    pub fn seal(key: &PrivateKey, password: &Password, kdf: &KdfParams) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        let mut kek = derive_key_encryption_key(password, &salt, kdf)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&kek));
        kek.zeroize();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), &key.as_bytes()[..])
            .map_err(|e| Error::Encrypt(e.to_string()))?;
        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Decrypts with `password`; fails for a wrong password or any tampering.
    pub fn open(&self, password: &Password, kdf: &KdfParams) -> Result<PrivateKey> {
        let mut kek = derive_key_encryption_key(password, &self.salt, kdf)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&kek));
        kek.zeroize();
        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .map_err(|_| Error::Decrypt)?;
        let key = PrivateKey::from_bytes(&plaintext);
        plaintext.zeroize();
        key
    }

    /// Decrypts under `from` and seals the same key again under `to`.
    pub fn reseal(&self, from: &Password, to: &Password, kdf: &KdfParams) -> Result<Self> {
        let key = self.open(from, kdf)?;
        Self::seal(&key, to, kdf)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PACKED_LEN);
        out.push(VERSION);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PACKED_LEN {
            return Err(Error::decode(
                "private cert",
                format!("expected {} bytes, received {}", PACKED_LEN, bytes.len()),
            ));
        }
        if bytes[0] != VERSION {
            return Err(Error::decode("private cert", format!("unknown version {}", bytes[0])));
        }
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        salt.copy_from_slice(&bytes[1..1 + SALT_LEN]);
        nonce.copy_from_slice(&bytes[1 + SALT_LEN..1 + SALT_LEN + NONCE_LEN]);
        Ok(Self {
            salt,
            nonce,
            ciphertext: bytes[1 + SALT_LEN + NONCE_LEN..].to_vec(),
        })
    }
}

impl Display for EncryptedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0{}", base64::encode(self.to_bytes()))
    }
}

impl Debug for EncryptedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedPrivateKey")
    }
}

impl std::str::FromStr for EncryptedPrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = match s.as_bytes().first() {
            None => return Err(Error::decode("private cert", "empty string")),
            Some(b'0') => &s[1..],
            Some(other) => return Err(Error::decode("private cert", format!("unexpected key type {}", other))),
        };
        let v = base64::decode(rest).map_err(|e| Error::decode("private cert", e))?;
        Self::from_bytes(&v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn kdf() -> KdfParams {
        KdfParams::insecure_for_tests()
    }

    #[test]
    fn seal_and_open() -> anyhow::Result<()> {
        let key = PrivateKey::generate();
        let pw = Password::from("correct horse");
        let sealed = EncryptedPrivateKey::seal(&key, &pw, &kdf())?;
        let cert = sealed.to_string();
        assert!(cert.starts_with('0'));
        let parsed = EncryptedPrivateKey::from_str(&cert)?;
        assert_eq!(parsed, sealed);
        assert_eq!(parsed.open(&pw, &kdf())?, key);
        Ok(())
    }

    #[test]
    fn wrong_password_fails() -> anyhow::Result<()> {
        let key = PrivateKey::generate();
        let sealed = EncryptedPrivateKey::seal(&key, &"a".into(), &kdf())?;
        assert!(matches!(sealed.open(&"b".into(), &kdf()), Err(Error::Decrypt)));
        Ok(())
    }

    #[test]
    fn tampering_is_detected() -> anyhow::Result<()> {
        let key = PrivateKey::generate();
        let pw = Password::from("pw");
        let mut bytes = EncryptedPrivateKey::seal(&key, &pw, &kdf())?.to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        let tampered = EncryptedPrivateKey::from_bytes(&bytes)?;
        assert!(matches!(tampered.open(&pw, &kdf()), Err(Error::Decrypt)));
        Ok(())
    }

    #[test]
    fn reseal_moves_to_new_password() -> anyhow::Result<()> {
        let key = PrivateKey::generate();
        let (old, new) = (Password::from("old"), Password::from("new"));
        let sealed = EncryptedPrivateKey::seal(&key, &old, &kdf())?;
        let moved = sealed.reseal(&old, &new, &kdf())?;
        assert_ne!(moved, sealed);
        assert_eq!(moved.open(&new, &kdf())?, key);
        assert!(moved.open(&old, &kdf()).is_err());
        Ok(())
    }

    #[test]
    fn rejects_malformed_certs() {
        assert!(EncryptedPrivateKey::from_str("").is_err());
        assert!(EncryptedPrivateKey::from_str("1AAAA").is_err());
        assert!(EncryptedPrivateKey::from_str("0AAAA").is_err());
        let mut wrong_version = vec![2u8];
        wrong_version.extend_from_slice(&[0u8; PACKED_LEN - 1]);
        assert!(EncryptedPrivateKey::from_bytes(&wrong_version).is_err());
    }
}
