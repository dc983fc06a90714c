/// Failures of the key material layer.
///
/// None of these are fatal on their own: callers decide whether a failure means bad input or
/// a broken environment.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Key generation failed: {0}")]
    Generation(String),
    #[error("No public key loaded.")]
    MissingPublicKey,
    #[error("No private key loaded.")]
    MissingPrivateKey,
    #[error("Cannot decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("Cannot decrypt private key (wrong password or tampered cert).")]
    Decrypt,
    #[error("Cannot encrypt private key: {0}")]
    Encrypt(String),
    #[error("Key derivation failed: {0}")]
    Kdf(String),
    #[error("Invalid signature metadata: {0}")]
    InvalidMetadata(String),
    #[error("Unknown key role tag '{0}' (expected A, E or S).")]
    UnknownRole(char),
}

impl Error {
    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
