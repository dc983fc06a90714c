use crate::{
    candidates::KeyTypeHint,
    config::CredentialConfig,
    error::{Error, Result},
    identity::{CredentialId, CredentialKind, CredentialOwner, NymId, OwnerIdentity},
    key_credential::KeyCredential,
};
use nym_crypto::{AsymmetricKey, KeyMaterial, KeyringRef, Password, PasswordContext, PublicKey, Signature};
use std::collections::BTreeMap;

/// A Nym's credentials: one master plus any number of subkeys bound to it.
#[derive(Debug, Clone)]
pub struct CredentialSet<K: KeyMaterial = AsymmetricKey> {
    nym_id: NymId,
    master_id: CredentialId,
    master: KeyCredential<K>,
    subkeys: BTreeMap<CredentialId, KeyCredential<K>>,
}

impl CredentialSet<AsymmetricKey> {
    /// Creates a Nym with a freshly generated, tagged and self-signed master credential.
    pub fn generate(
        nym_id_source: &str,
        keyring: KeyringRef,
        config: &CredentialConfig,
        password: PasswordContext<'_>,
    ) -> Result<Self> {
        let master = KeyCredential::new(CredentialKind::Master, nym_id_source, keyring);
        Self::generate_with(master, config, password)
    }

    /// Generates, tags and self-signs a new subkey credential and returns its ID.
    pub fn add_subkey(
        &mut self,
        keyring: KeyringRef,
        config: &CredentialConfig,
        password: PasswordContext<'_>,
    ) -> Result<CredentialId> {
        let subkey = KeyCredential::new(
            CredentialKind::Subkey {
                master: self.master_id.clone(),
            },
            self.master.nym_id_source(),
            keyring,
        );
        self.add_subkey_with(subkey, config, password)
    }
}

impl<K: KeyMaterial> CredentialSet<K> {
    /// Like [`generate`](CredentialSet::generate), starting from an empty master credential.
    pub fn generate_with(
        mut master: KeyCredential<K>,
        config: &CredentialConfig,
        password: PasswordContext<'_>,
    ) -> Result<Self> {
        if master.kind() != &CredentialKind::Master {
            return Err(Error::NotMasterCredential);
        }
        config.validate()?;
        master.generate_keys(config.key_bits)?;
        let owner = OwnerIdentity {
            nym_id: Some(master.nym_id().clone()),
            master_credential_id: None,
        };
        master.set_metadata(&owner)?;
        master.sign_self(password)?;
        let set = Self::from_parts(master)?;
        tracing::debug!(nym = %set.nym_id, master = %set.master_id, "generated credential set");
        Ok(set)
    }

    /// Wraps an already loaded master credential, which must pass
    /// [`verify_internally`](KeyCredential::verify_internally) on its own.
    pub fn from_parts(master: KeyCredential<K>) -> Result<Self> {
        if master.kind() != &CredentialKind::Master {
            tracing::error!("Refusing to root a credential set in a subkey credential");
            return Err(Error::NotMasterCredential);
        }
        master.verify_internally(&OwnerIdentity::default())?;
        Ok(Self {
            nym_id: master.nym_id().clone(),
            master_id: master.identifier()?,
            master,
            subkeys: BTreeMap::new(),
        })
    }

    pub fn add_subkey_with(
        &mut self,
        mut subkey: KeyCredential<K>,
        config: &CredentialConfig,
        password: PasswordContext<'_>,
    ) -> Result<CredentialId> {
        config.validate()?;
        subkey.generate_keys(config.key_bits)?;
        subkey.set_metadata(&*self)?;
        subkey.sign_self(password)?;
        self.insert_subkey(subkey)
    }

    /// Adds a loaded subkey credential after checking that it belongs to this Nym.
    pub fn insert_subkey(&mut self, subkey: KeyCredential<K>) -> Result<CredentialId> {
        subkey.verify_internally(&*self)?;
        let id = subkey.identifier()?;
        tracing::debug!(nym = %self.nym_id, subkey = %id, "added subkey credential");
        self.subkeys.insert(id.clone(), subkey);
        Ok(id)
    }

    pub fn nym_id(&self) -> &NymId {
        &self.nym_id
    }

    pub fn master_id(&self) -> &CredentialId {
        &self.master_id
    }

    pub fn master(&self) -> &KeyCredential<K> {
        &self.master
    }

    pub fn subkey(&self, id: &CredentialId) -> Result<&KeyCredential<K>> {
        self.subkeys.get(id).ok_or_else(|| Error::UnknownSubkey(id.clone()))
    }

    pub fn subkeys(&self) -> impl Iterator<Item = (&CredentialId, &KeyCredential<K>)> {
        self.subkeys.iter()
    }

    pub fn owner_identity(&self) -> OwnerIdentity {
        OwnerIdentity {
            nym_id: Some(self.nym_id.clone()),
            master_credential_id: Some(self.master_id.clone()),
        }
    }

    fn credentials(&self) -> impl Iterator<Item = &KeyCredential<K>> {
        std::iter::once(&self.master).chain(self.subkeys.values())
    }

    /// Verifies the master and every subkey credential.
    pub fn verify_all(&self) -> Result<()> {
        for credential in self.credentials() {
            credential.verify_internally(self)?;
        }
        Ok(())
    }

    /// Candidate public keys for `signature` across all credentials, master first.
    pub fn public_keys_by_signature(&self, signature: &Signature, hint: KeyTypeHint) -> Result<Vec<PublicKey>> {
        let mut found = vec![];
        for credential in self.credentials() {
            found.extend(credential.public_keys_by_signature(signature, hint)?);
        }
        Ok(found)
    }

    /// Re-encrypts every credential's private keys and re-signs each credential with `resign`,
    /// which must name the password the keys are under afterwards.
    ///
    /// All credentials are staged first; if any of them fails, the set is left unchanged.
    pub fn re_encrypt_all(
        &mut self,
        password: &Password,
        importing: bool,
        resign: PasswordContext<'_>,
    ) -> Result<()> {
        let mut master = self.master.clone();
        master.re_encrypt_keys(password, importing)?;
        master.sign_self(resign)?;

        let mut subkeys = self.subkeys.clone();
        for (id, subkey) in subkeys.iter_mut() {
            subkey.re_encrypt_keys(password, importing).map_err(|err| {
                tracing::error!("Failed re-encrypting subkey credential {}: {}", id, err);
                err
            })?;
            subkey.sign_self(resign)?;
        }

        self.master = master;
        self.subkeys = subkeys;
        tracing::debug!(nym = %self.nym_id, importing, "re-encrypted credential set");
        Ok(())
    }
}

impl<K: KeyMaterial> CredentialOwner for CredentialSet<K> {
    fn nym_id(&self) -> Option<&NymId> {
        Some(&self.nym_id)
    }

    fn master_credential_id(&self) -> Option<&CredentialId> {
        Some(&self.master_id)
    }
}
