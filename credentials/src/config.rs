use crate::error::{Error, Result};
use nym_crypto::{KdfParams, Keyring, KeyringRef, Password};
use serde::{Deserialize, Serialize};

/// Settings for generating and protecting key credentials.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialConfig {
    /// Requested strength of newly generated keypairs.
    pub key_bits: u32,
    /// Cost of deriving private-cert encryption keys from passwords.
    pub kdf: KdfParams,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            key_bits: 1024,
            kdf: KdfParams::default(),
        }
    }
}

impl CredentialConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_bits == 0 {
            return Err(Error::Config("keyBits must be positive".to_owned()));
        }
        if self.kdf.iterations == 0 || self.kdf.parallelism == 0 {
            return Err(Error::Config("kdf iterations and parallelism must be positive".to_owned()));
        }
        // Argon2 needs at least 8 KiB per lane
        if u64::from(self.kdf.memory_kib) < 8 * u64::from(self.kdf.parallelism) {
            return Err(Error::Config(format!(
                "kdf memoryKib must be at least {} for parallelism {}",
                8 * u64::from(self.kdf.parallelism),
                self.kdf.parallelism
            )));
        }
        Ok(())
    }

    /// A keyring protecting private certs with `default_password` under these KDF settings.
    pub fn keyring(&self, default_password: Password) -> KeyringRef {
        Keyring::new(default_password, self.kdf).into_ref()
    }
}
