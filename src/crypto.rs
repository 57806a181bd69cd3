//! At-rest encryption for TOTP secrets.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"qcontrol-v1";
const HKDF_INFO: &[u8] = b"totp-secret-aes256gcm";
const NONCE_LEN: usize = 12;

/// AES-256-GCM sealer keyed once from the configured encryption key.
///
/// Sealed values are laid out as `nonce (12 bytes) || ciphertext`.
pub struct SecretBox {
    cipher: Aes256Gcm,
}

impl SecretBox {
    pub fn new(key_material: &str) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key_material.as_bytes());
        let mut okm = [0u8; 32];
        hk.expand(HKDF_INFO, &mut okm)
            .expect("32 bytes is a valid HKDF-SHA256 output length");

        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&okm)),
        }
    }

    pub fn seal(&self, plaintext: &str) -> Result<Vec<u8>, String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| format!("Encryption failed: {e}"))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<String, String> {
        if sealed.len() < NONCE_LEN {
            return Err("Ciphertext too short".to_string());
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| format!("Decryption failed: {e}"))?;

        String::from_utf8(plaintext).map_err(|e| format!("Invalid UTF-8: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::SecretBox;

    #[test]
    fn sealed_secret_opens_with_same_key_only() {
        let sealer = SecretBox::new("key-one");
        let sealed = sealer.seal("JBSWY3DPEHPK3PXP").unwrap();

        assert_eq!(sealer.open(&sealed).unwrap(), "JBSWY3DPEHPK3PXP");
        assert!(SecretBox::new("key-two").open(&sealed).is_err());
    }

    #[test]
    fn sealing_twice_uses_fresh_nonces() {
        let sealer = SecretBox::new("key-one");
        assert_ne!(sealer.seal("abc").unwrap(), sealer.seal("abc").unwrap());
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(SecretBox::new("k").open(&[0u8; 4]).is_err());
    }
}
