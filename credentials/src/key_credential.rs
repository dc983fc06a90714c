//! A credential holding three role-specific keypairs.
//!
//! A Nym's master credential and each of its subkey credentials is a [`KeyCredential`]: one
//! signing, one authentication and one encryption keypair, the public and private content maps
//! those keys serialize to, and a self-signature over the public part.
//!
//! All mutating operations stage their work on a copy of the key material and only commit it
//! once every role has succeeded, so a failed load never leaves a credential half updated.

use crate::{
    content::{self, ContentKind, ContentMap, Roles},
    error::{Error, Result},
    identity::{CredentialId, CredentialKind, CredentialOwner, NymId, METADATA_INDEX},
};
use nym_crypto::{
    AsymmetricKey, KeyMaterial, KeyRole, KeyringRef, Password, PasswordContext, PublicKey, Signature,
    SignatureMetadata,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Stand-in for identity characters that cannot be looked up.
pub(crate) const PLACEHOLDER: char = '0';

const GENERATE_REASON: &str = "Generating keys for new credential...";
const LOAD_REASON: &str = "Loading private key from credential.";

/// Order in which private keys are re-encrypted.
const RE_ENCRYPT_ORDER: [KeyRole; 3] = [KeyRole::Signing, KeyRole::Authentication, KeyRole::Encryption];

/// The part of a credential covered by its self-signature and hashed into its identifier.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedContents<'a> {
    kind: &'a CredentialKind,
    nym_id: &'a NymId,
    nym_id_source: &'a str,
    public_contents: &'a ContentMap,
}

pub(crate) fn canonicalize<T: Serialize>(input: &T) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(input)?)
}

fn identity_char(what: &str, id: Option<&str>) -> char {
    match id.and_then(|id| id.chars().nth(METADATA_INDEX)) {
        Some(c) if c.is_ascii_graphic() => c,
        _ => {
            tracing::warn!("Unable to get {} character for signature metadata, using '0'", what);
            PLACEHOLDER
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyCredential<K: KeyMaterial = AsymmetricKey> {
    kind: CredentialKind,
    nym_id: NymId,
    nym_id_source: String,
    pub(crate) keys: Roles<K>,
    public_contents: Option<ContentMap>,
    private_contents: Option<ContentMap>,
    self_signature: Option<Signature>,
}

impl KeyCredential<AsymmetricKey> {
    /// An empty credential for the Nym derived from `nym_id_source`.
    pub fn new(kind: CredentialKind, nym_id_source: &str, keyring: KeyringRef) -> Self {
        let keys = Roles::from_fn(|_| AsymmetricKey::new(keyring.clone()));
        Self::with_keys(kind, nym_id_source, keys)
    }
}

impl<K: KeyMaterial> KeyCredential<K> {
    pub fn with_keys(kind: CredentialKind, nym_id_source: &str, keys: Roles<K>) -> Self {
        Self::from_parts(kind, NymId::from_source(nym_id_source), nym_id_source, keys)
    }

    /// An empty credential declaring `nym_id`, which is not checked against its source until
    /// [`verify_internally`](Self::verify_internally).
    pub fn from_parts(kind: CredentialKind, nym_id: NymId, nym_id_source: &str, keys: Roles<K>) -> Self {
        Self {
            kind,
            nym_id,
            nym_id_source: nym_id_source.to_owned(),
            keys,
            public_contents: None,
            private_contents: None,
            self_signature: None,
        }
    }

    pub fn kind(&self) -> &CredentialKind {
        &self.kind
    }

    pub fn nym_id(&self) -> &NymId {
        &self.nym_id
    }

    pub fn nym_id_source(&self) -> &str {
        &self.nym_id_source
    }

    pub fn public_contents(&self) -> Option<&ContentMap> {
        self.public_contents.as_ref()
    }

    pub fn private_contents(&self) -> Option<&ContentMap> {
        self.private_contents.as_ref()
    }

    pub fn self_signature(&self) -> Option<&Signature> {
        self.self_signature.as_ref()
    }

    /// Installs a previously persisted self-signature; it is checked by
    /// [`verify_signed_by_self`](Self::verify_signed_by_self), not here.
    pub fn set_self_signature(&mut self, signature: Signature) {
        self.self_signature = Some(signature);
    }

    pub fn public_key(&self, role: KeyRole) -> Option<PublicKey> {
        self.keys.get(role).public_key()
    }

    pub fn metadata(&self, role: KeyRole) -> Option<&SignatureMetadata> {
        self.keys.get(role).metadata()
    }

    pub fn key(&self, role: KeyRole) -> &K {
        self.keys.get(role)
    }

    fn signed_contents(&self) -> Result<Vec<u8>> {
        let public_contents = self.public_contents.as_ref().ok_or(Error::MissingPublicContents)?;
        canonicalize(&SignedContents {
            kind: &self.kind,
            nym_id: &self.nym_id,
            nym_id_source: &self.nym_id_source,
            public_contents,
        })
    }

    /// The credential ID: a hash over the same contents the self-signature covers.
    pub fn identifier(&self) -> Result<CredentialId> {
        Ok(CredentialId::from_contents(&self.signed_contents()?))
    }

    /// Generates all three keypairs and derives both content maps from them.
    ///
    /// Failing to create a keypair, or to export any cert from a freshly created one, is an
    /// invariant violation; KDF settings the keyring cannot use are reported as a crypto failure. Nothing is committed unless all three roles succeed. Any previous
    /// self-signature is discarded since it no longer matches the keys.
    pub fn generate_keys(&mut self, bits: u32) -> Result<()> {
        let mut staged = self.keys.clone();
        for role in KeyRole::ALL {
            staged.get_mut(role).make_new_keypair(bits).map_err(|err| {
                tracing::error!("Failed creating {} keypair: {}", role.name(), err);
                match err {
                    // KDF settings are caller configuration
                    nym_crypto::Error::Kdf(_) => Error::crypto(role)(err),
                    err => Error::Invariant(format!("cannot create {} keypair: {}", role.name(), err)),
                }
            })?;
        }
        for role in KeyRole::ALL {
            staged.get_mut(role).save_and_reload().map_err(Error::crypto(role))?;
        }

        let mut public = ContentMap::new();
        let mut private = ContentMap::new();
        for (role, key) in staged.iter() {
            match key.public_cert() {
                Ok(cert) => {
                    public.insert(role.tag().to_string(), cert);
                }
                Err(err) => tracing::error!("Failed getting public {} key: {}", role.name(), err),
            }
            match key.private_cert(GENERATE_REASON) {
                Ok(cert) => {
                    private.insert(role.tag().to_string(), cert);
                }
                Err(err) => tracing::error!("Failed getting private {} key: {}", role.name(), err),
            }
        }
        for (kind, map) in [(ContentKind::Public, &public), (ContentKind::Private, &private)] {
            if map.len() != KeyRole::ALL.len() {
                return Err(Error::Invariant(format!(
                    "only {} of 3 {} certs survived key generation",
                    map.len(),
                    kind
                )));
            }
        }

        tracing::debug!(nym = %self.nym_id, bits, "generated key credential");
        self.keys = staged;
        self.public_contents = Some(public);
        self.private_contents = Some(private);
        self.self_signature = None;
        Ok(())
    }

    fn stage_public(staged: &mut Roles<K>, certs: &Roles<&str>) -> Result<()> {
        for (role, cert) in certs.iter() {
            staged.get_mut(role).set_public_key(cert).map_err(|err| {
                tracing::error!("Failure: Unable to set public {} key based on string: {}", role.name(), err);
                Error::crypto(role)(err)
            })?;
        }
        Ok(())
    }

    /// Loads the three public certs of `map`.
    ///
    /// All-or-nothing: on any failure the credential keeps its previous keys and contents.
    pub fn set_public_contents(&mut self, map: &ContentMap) -> Result<()> {
        let certs = content::validate(map, ContentKind::Public)?;
        let mut staged = self.keys.clone();
        Self::stage_public(&mut staged, &certs)?;
        self.keys = staged;
        self.public_contents = Some(map.clone());
        Ok(())
    }

    /// Loads the three private certs of `map`, unlocking them with `password`, and replaces the
    /// public contents with the public keys recovered from them.
    ///
    /// Roles are processed in A, E, S order; the first failing role aborts the whole call and
    /// nothing is committed.
    pub fn set_private_contents(&mut self, map: &ContentMap, password: PasswordContext<'_>) -> Result<()> {
        let certs = content::validate(map, ContentKind::Private)?;
        let mut staged = self.keys.clone();

        let recovered = Roles::try_from_fn(|role| {
            let key = staged.get_mut(role);
            let cert = *certs.get(role);
            key.load_private_key(cert, LOAD_REASON, password).map_err(|err| {
                tracing::error!("Failure: Unable to set private {} key based on string: {}", role.name(), err);
                Error::crypto(role)(err)
            })?;
            key.load_public_key_from_private(cert, LOAD_REASON, password)
                .and_then(|_| key.public_cert())
                .map_err(|err| {
                    tracing::error!(
                        "Failure: Unable to set public {} key based on private string: {}",
                        role.name(),
                        err
                    );
                    Error::crypto(role)(err)
                })
        })?;

        let public = content::assemble(recovered);
        let public_certs = content::validate(&public, ContentKind::Public)?;
        Self::stage_public(&mut staged, &public_certs)?;

        self.keys = staged;
        self.private_contents = Some(map.clone());
        self.public_contents = Some(public);
        Ok(())
    }

    /// Signs `artifact` (canonicalized as CBOR) with the signing key.
    pub fn sign<T: Serialize>(&self, artifact: &T, password: PasswordContext<'_>) -> Result<Signature> {
        let payload = canonicalize(artifact)?;
        self.keys
            .signing
            .sign(&payload, password)
            .map_err(Error::crypto(KeyRole::Signing))
    }

    /// Checks a signature made by [`sign`](Self::sign) against the signing public key.
    pub fn verify<T: Serialize>(&self, artifact: &T, signature: &Signature) -> Result<()> {
        let payload = canonicalize(artifact)?;
        if self.keys.signing.verify(&payload, signature) {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }

    /// Signs the credential's own public contents with its signing key.
    pub fn sign_self(&mut self, password: PasswordContext<'_>) -> Result<()> {
        let payload = self.signed_contents()?;
        let signature = self
            .keys
            .signing
            .sign(&payload, password)
            .map_err(Error::crypto(KeyRole::Signing))?;
        self.self_signature = Some(signature);
        Ok(())
    }

    pub fn verify_signed_by_self(&self) -> Result<()> {
        let signature = self.self_signature.as_ref().ok_or(Error::Unsigned)?;
        let payload = self.signed_contents()?;
        if self.keys.signing.verify(&payload, signature) {
            Ok(())
        } else {
            Err(Error::NotSignedBySelf)
        }
    }

    /// The hash chain: the Nym ID derives from its source, and a subkey agrees with its owner
    /// on the Nym ID and the master credential ID.
    fn verify_hash_chain(&self, owner: &dyn CredentialOwner) -> Result<()> {
        let derived = NymId::from_source(&self.nym_id_source);
        if derived != self.nym_id {
            return Err(Error::NymIdMismatch {
                declared: self.nym_id.clone(),
                expected: derived.to_string(),
            });
        }
        match &self.kind {
            CredentialKind::Master => Ok(()),
            CredentialKind::Subkey { master } => {
                match owner.nym_id() {
                    Some(owner_nym) if *owner_nym == self.nym_id => {}
                    other => {
                        return Err(Error::NymIdMismatch {
                            declared: self.nym_id.clone(),
                            expected: other.map_or_else(|| "<none>".to_owned(), |id| id.to_string()),
                        })
                    }
                }
                match owner.master_credential_id() {
                    Some(actual) if actual == master => Ok(()),
                    other => Err(Error::MasterCredentialMismatch {
                        declared: master.clone(),
                        actual: other.map_or_else(|| "<none>".to_owned(), |id| id.to_string()),
                    }),
                }
            }
        }
    }

    /// Full self-check: the hash chain first, then the self-signature.
    pub fn verify_internally(&self, owner: &dyn CredentialOwner) -> Result<()> {
        self.verify_hash_chain(owner)?;
        self.verify_signed_by_self().map_err(|err| {
            tracing::info!(
                "Failed verifying key credential: it's not signed by itself (its own signing key): {}",
                err
            );
            err
        })
    }

    /// Tags all three keypairs with signature metadata: their role letter plus the characters at
    /// [`METADATA_INDEX`] of the owner's Nym ID, the master credential ID and this credential's ID.
    ///
    /// A master credential uses its own ID for the master slot. Any character that cannot be
    /// looked up is replaced by `'0'` with a warning.
    pub fn set_metadata(&mut self, owner: &dyn CredentialOwner) -> Result<()> {
        let own_id = self.identifier().ok();
        let master_id = match &self.kind {
            CredentialKind::Master => own_id.clone(),
            CredentialKind::Subkey { .. } => owner.master_credential_id().cloned(),
        };
        let nym = identity_char("Nym ID", owner.nym_id().map(NymId::as_str));
        let master = identity_char("master credential ID", master_id.as_ref().map(CredentialId::as_str));
        let sub = identity_char("credential ID", own_id.as_ref().map(CredentialId::as_str));

        let mut staged = self.keys.clone();
        for role in KeyRole::ALL {
            let tag = SignatureMetadata::for_role(role, nym, master, sub)
                .map_err(|err| Error::Invariant(format!("cannot tag {} key: {}", role.name(), err)))?;
            staged.get_mut(role).set_metadata(tag);
        }
        self.keys = staged;
        Ok(())
    }

    /// Re-encrypts all three private keys for export (`importing == false`, moving them to
    /// `password`) or import (moving them from `password` to the ambient default).
    ///
    /// Keys are processed signing first, then authentication, then encryption; the first failure
    /// aborts and nothing is committed. On success the new private certs are loaded back, which
    /// also proves they open under their new password. The self-signature is left as is: the
    /// caller has to re-sign (with the password the keys now live under) to persist the change.
    pub fn re_encrypt_keys(&mut self, password: &Password, importing: bool) -> Result<()> {
        let existing = self.private_contents.as_ref().ok_or(Error::MissingPrivateContents)?;

        let mut fresh = BTreeMap::new();
        for role in RE_ENCRYPT_ORDER {
            let cert = self.keys.get(role).re_encrypt(password, importing).map_err(|err| {
                tracing::error!("Failed re-encrypting {} key: {}", role.name(), err);
                Error::crypto(role)(err)
            })?;
            fresh.insert(role, cert);
        }

        let mut rebuilt = ContentMap::new();
        let mut unexpected = vec![];
        for (tag, contents) in existing {
            match tag.parse::<KeyRole>().ok().and_then(|role| fresh.remove(&role)) {
                Some(cert) => {
                    rebuilt.insert(tag.clone(), cert);
                }
                None => {
                    tracing::error!("Unexpected entry '{}' in private contents; preserving it", tag);
                    unexpected.push(tag.clone());
                    rebuilt.insert(tag.clone(), contents.clone());
                }
            }
        }
        if rebuilt.len() != KeyRole::ALL.len() {
            tracing::error!("Unexpected, private contents do not have exactly a size of 3.");
            return Err(Error::ContentMapSize {
                kind: ContentKind::Private,
                found: rebuilt.len(),
            });
        }
        if !unexpected.is_empty() {
            return Err(Error::Invariant(format!(
                "private contents held unexpected entries {:?}",
                unexpected
            )));
        }

        let reload = if importing {
            PasswordContext::Ambient
        } else {
            PasswordContext::Explicit(password)
        };
        self.set_private_contents(&rebuilt, reload)
    }
}
