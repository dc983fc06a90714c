//! Key credentials for Nyms
//!
//! A Nym (a pseudonymous identity) owns a [`CredentialSet`]: one master [`KeyCredential`] and any
//! number of subkey credentials signed under it. Each key credential carries three keypairs, one
//! per [`KeyRole`](nym_crypto::KeyRole):
//!
//!  - `S` signs artifacts and the credential itself
//!  - `A` authenticates the Nym
//!  - `E` is used for encryption
//!
//! The keys are persisted as two [`ContentMap`]s with exactly one entry per role tag, holding the
//! public certs and the password-encrypted private certs respectively. The public map can always
//! be recomputed from the private one.
//!
//! # Finding the right key
//!
//! Keys can be tagged with [`SignatureMetadata`](nym_crypto::SignatureMetadata) which is then
//! attached to each signature they make. Given a signature and a [`KeyTypeHint`],
//! [`KeyCredential::public_keys_by_signature`] returns the (at most one) key of a credential that
//! is worth verifying against.
//!
//! # Example
//!
//! ```no_run
//! use nym_credentials::{CredentialConfig, CredentialSet, KeyTypeHint};
//! use nym_crypto::PasswordContext;
//!
//! let config = CredentialConfig::default();
//! let keyring = config.keyring("wallet passphrase".into());
//! let mut nym = CredentialSet::generate("my nym", keyring.clone(), &config, PasswordContext::Ambient)?;
//! let subkey = nym.add_subkey(keyring, &config, PasswordContext::Ambient)?;
//!
//! let signature = nym.subkey(&subkey)?.sign(&"hello", PasswordContext::Ambient)?;
//! let candidates = nym.public_keys_by_signature(&signature, KeyTypeHint::Unspecified)?;
//! assert_eq!(candidates.len(), 1);
//! # Ok::<(), nym_credentials::Error>(())
//! ```

mod candidates;
mod config;
mod content;
mod credential_set;
mod error;
mod identity;
mod key_credential;

pub use candidates::KeyTypeHint;
pub use config::CredentialConfig;
pub use content::{ContentKind, ContentMap, Roles};
pub use credential_set::CredentialSet;
pub use error::{Error, ErrorKind, Result};
pub use identity::{CredentialId, CredentialKind, CredentialOwner, NymId, OwnerIdentity, METADATA_INDEX};
pub use key_credential::KeyCredential;
