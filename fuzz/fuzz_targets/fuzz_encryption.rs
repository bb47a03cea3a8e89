#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vouch_core::crypto::{decrypt, encrypt, looks_encrypted, EncryptionKey};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    key: [u8; 32],
    token: &'a str,
    stored: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let key = EncryptionKey::from_bytes(input.key);

    // Arbitrary file contents may fail to decrypt but must never panic.
    let _ = looks_encrypted(input.stored);
    let _ = decrypt(input.stored, &key);

    if let Ok(sealed) = encrypt(input.token, &key) {
        assert_eq!(decrypt(&sealed, &key).ok().as_deref(), Some(input.token));
    }
});
