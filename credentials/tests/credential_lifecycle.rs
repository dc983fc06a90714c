use nym_credentials::{
    ContentMap, CredentialConfig, CredentialKind, CredentialSet, Error, KeyCredential, KeyTypeHint, OwnerIdentity,
};
use nym_crypto::{
    AsymmetricKey, KdfParams, KeyMaterial, KeyRole, KeyringRef, Password, PasswordContext, Signature, SignatureMetadata,
};
use std::convert::TryFrom;
use tracing_subscriber::EnvFilter;

const NYM_SOURCE: &str = "otx source for the lifecycle tests";

fn setup_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

fn config() -> CredentialConfig {
    CredentialConfig {
        key_bits: 1024,
        kdf: KdfParams::insecure_for_tests(),
    }
}

fn keyring() -> KeyringRef {
    config().keyring("wallet passphrase".into())
}

fn nym() -> (CredentialSet, KeyringRef) {
    setup_logger();
    let keyring = keyring();
    let set = CredentialSet::generate(NYM_SOURCE, keyring.clone(), &config(), PasswordContext::Ambient).unwrap();
    (set, keyring)
}

fn role_tags(map: &ContentMap) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

#[test]
fn generated_credentials_have_exactly_three_roles() {
    let (mut set, keyring) = nym();
    let id = set.add_subkey(keyring, &config(), PasswordContext::Ambient).unwrap();
    for cred in [set.master(), set.subkey(&id).unwrap()] {
        assert_eq!(role_tags(cred.public_contents().unwrap()), vec!["A", "E", "S"]);
        assert_eq!(role_tags(cred.private_contents().unwrap()), vec!["A", "E", "S"]);
    }
}

#[test]
fn private_contents_determine_public_keys() -> anyhow::Result<()> {
    let (set, _) = nym();
    let private = set.master().private_contents().unwrap().clone();

    let mut loaded = KeyCredential::new(CredentialKind::Master, NYM_SOURCE, keyring());
    loaded.set_private_contents(&private, PasswordContext::Ambient)?;
    for role in KeyRole::ALL {
        let mut direct = AsymmetricKey::new(keyring());
        direct.load_public_key_from_private(&private[&role.tag().to_string()], "test", PasswordContext::Ambient)?;
        assert_eq!(loaded.public_key(role), direct.public_key());
        assert_eq!(loaded.public_key(role), set.master().public_key(role));
    }
    // same public contents, so same identifier
    assert_eq!(loaded.identifier()?, *set.master_id());
    Ok(())
}

#[test]
fn flipping_any_signature_byte_breaks_self_verification() {
    let (set, _) = nym();
    let master = set.master();
    master.verify_signed_by_self().unwrap();

    let bytes = master.self_signature().unwrap().to_bytes();
    // the leading scheme and metadata bytes are a search hint, not signed
    for index in bytes.len() - 64..bytes.len() {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x80;
        let mut copy = master.clone();
        copy.set_self_signature(Signature::from_bytes(&tampered).unwrap());
        assert!(
            matches!(copy.verify_signed_by_self(), Err(Error::NotSignedBySelf)),
            "byte {} not covered",
            index
        );
    }
}

#[test]
fn candidate_search_follows_hint_and_metadata() {
    let (set, _) = nym();
    let master = set.master();
    let untagged = Signature::new([3u8; 64], None);

    assert!(master
        .public_keys_by_signature(&untagged, KeyTypeHint::try_from('0').unwrap())
        .unwrap()
        .is_empty());
    assert_eq!(
        master
            .public_keys_by_signature(&untagged, KeyTypeHint::try_from('A').unwrap())
            .unwrap(),
        vec![master.public_key(KeyRole::Authentication).unwrap()]
    );

    let signed = master.sign(&"artifact", PasswordContext::Ambient).unwrap();
    assert_eq!(signed.metadata().map(|m| m.key_type()), Some('S'));
    assert_eq!(
        master.public_keys_by_signature(&signed, KeyTypeHint::Unspecified).unwrap(),
        vec![master.public_key(KeyRole::Signing).unwrap()]
    );

    let (n, m, s) = signed.metadata().unwrap().identity();
    let odd = signed.clone().with_metadata(Some(SignatureMetadata::new('Z', n, m, s).unwrap()));
    assert!(matches!(
        master.public_keys_by_signature(&odd, KeyTypeHint::Unspecified),
        Err(Error::UnrecognizedMetadataKeyType('Z'))
    ));
    assert!(matches!(
        KeyTypeHint::try_from('x'),
        Err(Error::InvalidKeyTypeArgument('x'))
    ));
}

#[test]
fn signatures_of_other_credentials_are_not_candidates() {
    let (mut set, keyring) = nym();
    let id = set.add_subkey(keyring, &config(), PasswordContext::Ambient).unwrap();
    let subkey = set.subkey(&id).unwrap();
    let sig = subkey.sign(&"only mine", PasswordContext::Ambient).unwrap();
    let signing = subkey.public_key(KeyRole::Signing).unwrap();

    let found = set.public_keys_by_signature(&sig, KeyTypeHint::Unspecified).unwrap();
    assert!(found.contains(&signing));
    // the master only differs in the sub slot, a single character that may collide
    let master_tag = set.master().metadata(KeyRole::Signing).unwrap();
    if master_tag.sub_credential_id() != sig.metadata().unwrap().sub_credential_id() {
        assert_eq!(found, vec![signing]);
        assert!(set
            .master()
            .public_keys_by_signature(&sig, KeyTypeHint::Unspecified)
            .unwrap()
            .is_empty());
    }
}

#[test]
fn all_roles_share_identity_characters() {
    let (mut set, keyring) = nym();
    let id = set.add_subkey(keyring, &config(), PasswordContext::Ambient).unwrap();
    for cred in [set.master(), set.subkey(&id).unwrap()] {
        let tags: Vec<_> = KeyRole::ALL.iter().map(|role| *cred.metadata(*role).unwrap()).collect();
        assert!(tags.iter().all(|tag| tag.identity() == tags[0].identity()));
        let types: Vec<_> = tags.iter().map(|tag| tag.key_type()).collect();
        assert_eq!(types, vec!['A', 'E', 'S']);
    }
}

#[test]
fn export_then_import_keeps_signing_with_original_keys() -> anyhow::Result<()> {
    let (set, _) = nym();
    let mut cred = set.master().clone();
    let original = cred.public_key(KeyRole::Signing).unwrap();
    let password = Password::from("transfer");

    cred.re_encrypt_keys(&password, false)?;
    cred.re_encrypt_keys(&password, true)?;

    let sig = cred.sign(&"after the round trip", PasswordContext::Ambient)?;
    let payload = serde_cbor::to_vec(&"after the round trip")?;
    assert!(original.verify(&payload, &sig));
    assert_eq!(cred.public_contents(), set.master().public_contents());
    Ok(())
}

#[test]
fn malformed_content_maps_are_rejected() {
    let (set, _) = nym();
    let public = set.master().public_contents().unwrap().clone();
    let private = set.master().private_contents().unwrap().clone();
    let mut cred = KeyCredential::new(CredentialKind::Master, NYM_SOURCE, keyring());

    let mut too_small = public.clone();
    too_small.remove("A");
    let mut too_big = public.clone();
    too_big.insert("B".to_owned(), "bogus".to_owned());
    let mut renamed = private.clone();
    let cert = renamed.remove("E").unwrap();
    renamed.insert("e".to_owned(), cert);

    for map in [&too_small, &too_big] {
        let err = cred.set_public_contents(map).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, Error::ContentMapSize { .. }));
    }
    assert!(matches!(
        cred.set_private_contents(&renamed, PasswordContext::Ambient),
        Err(Error::MissingRoleKey {
            role: KeyRole::Encryption,
            ..
        })
    ));
    assert!(cred.public_contents().is_none());
    assert!(cred.private_contents().is_none());
}

#[test]
fn subkey_end_to_end_with_tampered_signing_key() {
    let (mut set, keyring) = nym();
    let id = set.add_subkey(keyring, &config(), PasswordContext::Ambient).unwrap();
    let mut subkey = set.subkey(&id).unwrap().clone();
    assert_eq!(subkey.public_contents().unwrap().len(), 3);
    assert_eq!(subkey.private_contents().unwrap().len(), 3);
    subkey.verify_internally(&set).unwrap();
    subkey.verify_internally(&set.owner_identity()).unwrap();

    let original = subkey.public_contents().unwrap().clone();
    let cert = &original["S"];
    // not every altered cert decodes to a curve point; those are rejected without any change
    let mut tampered_loaded = false;
    for replacement in "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz".chars() {
        if cert.chars().nth(10) == Some(replacement) {
            continue;
        }
        let mut chars: Vec<char> = cert.chars().collect();
        chars[10] = replacement;
        let mut tampered = original.clone();
        tampered.insert("S".to_owned(), chars.into_iter().collect());
        match subkey.set_public_contents(&tampered) {
            Ok(()) => {
                tampered_loaded = true;
                break;
            }
            Err(err) => {
                assert!(matches!(err, Error::Crypto { role: KeyRole::Signing, .. }));
                assert_eq!(subkey.public_contents(), Some(&original));
            }
        }
    }
    assert!(tampered_loaded);
    assert!(matches!(subkey.verify_signed_by_self(), Err(Error::NotSignedBySelf)));
    assert!(subkey.verify_internally(&set).is_err());
}

#[test]
fn subkey_of_a_different_master_fails_the_hash_chain() {
    let (mut set, keyring) = nym();
    let id = set.add_subkey(keyring, &config(), PasswordContext::Ambient).unwrap();
    let subkey = set.subkey(&id).unwrap();
    let impostor = OwnerIdentity {
        nym_id: Some(set.nym_id().clone()),
        master_credential_id: Some(id.clone()),
    };
    assert!(matches!(
        subkey.verify_internally(&impostor),
        Err(Error::MasterCredentialMismatch { .. })
    ));
}

#[test]
fn config_drives_generation() {
    setup_logger();
    let config = CredentialConfig::from_json(r#"{"keyBits": 0}"#);
    assert!(matches!(config, Err(Error::Config(_))));

    let config =
        CredentialConfig::from_json(r#"{"keyBits": 2048, "kdf": {"memoryKib": 8, "iterations": 1}}"#).unwrap();
    let keyring = config.keyring("pw".into());
    let set = CredentialSet::generate(NYM_SOURCE, keyring, &config, PasswordContext::Ambient).unwrap();
    set.verify_all().unwrap();
}
