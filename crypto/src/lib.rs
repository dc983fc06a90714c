//! Key material for Nym credentials under a unified API
//!
//! Currently only Ed25519 elliptic curve cryptography is supported, but the design in API
//! and persistent storage is such that it can be extended later: every encoded key starts with
//! a one-character scheme tag, of which only '0' (Ed25519) exists today.
//!
//! # Handling of key material
//!
//! Private keys are zeroed when their memory is released. They are never held or exported in
//! clear text for longer than a single operation: the persisted "private cert" of a keypair is an
//! [`EncryptedPrivateKey`], sealed under either the [`Keyring`]'s ambient default password or an
//! explicit export password.
//!
//! # Signature metadata
//!
//! Signatures may carry a four character [`SignatureMetadata`] tag naming the role and credential
//! of the key that produced them. The tag is a search hint only; it is not covered by the
//! signature itself.

mod cipher;
mod error;
mod key_material;
mod metadata;
mod pair;
mod password;
mod private;
mod public;
mod role;
mod signature;

pub use cipher::EncryptedPrivateKey;
pub use error::{Error, Result};
pub use key_material::{AsymmetricKey, KeyMaterial};
pub use metadata::SignatureMetadata;
pub use pair::KeyPair;
pub use password::{KdfParams, Keyring, KeyringRef, Password, PasswordContext};
pub use private::PrivateKey;
pub use public::PublicKey;
pub use role::KeyRole;
pub use signature::Signature;
