//! AES-128-CBC over the encrypted portion of an essence triplet, and the
//! HMAC-SHA-1 MIC the original calls the AS-DCP hashing key.

use crate::error::{CryptError, Result};
use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type CbcEnc = cbc::Encryptor<Aes128>;
type CbcDec = cbc::Decryptor<Aes128>;

/// Derive a per-triplet IV from the context it is tied to, since the
/// recovered wire layout carries no explicit IV field of its own.
pub fn derive_iv(key: &[u8; 16], context_id: &[u8; 16]) -> [u8; 16] {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(context_id);
    let digest = mac.finalize().into_bytes();
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&digest[0..16]);
    iv
}

pub fn encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let enc = CbcEnc::new(key.into(), iv.into());
    enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

pub fn decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let dec = CbcDec::new(key.into(), iv.into());
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| CryptError::Cipher(e.to_string()))
}

/// The AS-DCP "hashing key": `truncate_128(HMAC-SHA-1(cipher_key,
/// 0x00112233445566778899aabbccddeeff))`.
pub fn build_hash_key(cipher_key: &[u8; 16]) -> [u8; 16] {
    const KEY_CONST: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
    ];
    let mut mac = Hmac::<Sha1>::new_from_slice(cipher_key).expect("HMAC accepts any key length");
    mac.update(&KEY_CONST);
    let digest = mac.finalize().into_bytes();
    let mut truncated = [0u8; 16];
    truncated.copy_from_slice(&digest[0..16]);
    truncated
}

/// The per-triplet Message Integrity Check: HMAC-SHA-1 of the encrypted
/// source value, keyed with the derived hashing key.
pub fn compute_mic(hash_key: &[u8; 16], encrypted_source_value: &[u8]) -> [u8; 20] {
    let mut mac = Hmac::<Sha1>::new_from_slice(hash_key).expect("HMAC accepts any key length");
    mac.update(encrypted_source_value);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = [0x42u8; 16];
        let context = [0x01u8; 16];
        let iv = derive_iv(&key, &context);
        let plaintext = b"arbitrary essence bytes of any length";

        let ciphertext = encrypt(&key, &iv, plaintext);
        assert_ne!(ciphertext[0..16], plaintext[0..16]);

        let decrypted = decrypt(&key, &iv, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn mic_changes_with_content() {
        let hash_key = build_hash_key(&[0x11u8; 16]);
        let a = compute_mic(&hash_key, b"one");
        let b = compute_mic(&hash_key, b"two");
        assert_ne!(a, b);
    }

    #[test]
    fn iv_is_deterministic_for_same_context() {
        let key = [0x55u8; 16];
        let context = [0x02u8; 16];
        assert_eq!(derive_iv(&key, &context), derive_iv(&key, &context));
    }
}
