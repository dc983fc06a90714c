//! Passwords and the keyring that supplies the ambient default one.
//!
//! Private certs are always encrypted under some password. Most of the time that is the
//! keyring's default password (think of it as the wallet passphrase); when key material is
//! exported it is moved to a caller-supplied password instead. Operations that need a password
//! take a [`PasswordContext`] which states explicitly which of the two is meant.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug},
    sync::Arc,
};
use zeroize::Zeroize;

/// Secret password bytes, zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Vec<u8>);

impl Password {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password")
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Which password unlocks (or protects) a private key for one operation.
#[derive(Debug, Clone, Copy)]
pub enum PasswordContext<'a> {
    /// The keyring's default password.
    Ambient,
    /// A password supplied by the caller, e.g. the one a credential was exported under.
    Explicit(&'a Password),
}

/// Argon2id cost parameters used to turn a password into a key encryption key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KdfParams {
    /// memory cost in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Cheapest parameters Argon2 accepts; only meant for tests.
    pub fn insecure_for_tests() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

pub type KeyringRef = Arc<Keyring>;

/// Holds the ambient default password and the parameters for encrypting private keys.
pub struct Keyring {
    default_password: Password,
    kdf: KdfParams,
}

impl Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring").field("kdf", &self.kdf).finish()
    }
}

impl Keyring {
    pub fn new(default_password: Password, kdf: KdfParams) -> Self {
        Self { default_password, kdf }
    }

    pub fn into_ref(self) -> KeyringRef {
        Arc::new(self)
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Resolves a context to the password it designates.
    pub fn resolve<'a>(&'a self, context: PasswordContext<'a>) -> &'a Password {
        match context {
            PasswordContext::Ambient => &self.default_password,
            PasswordContext::Explicit(password) => password,
        }
    }
}
