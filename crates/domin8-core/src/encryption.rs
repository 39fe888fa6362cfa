//! Delivery encryption for produced outputs
//!
//! Every call to [`SecureDeliveryWrapper::encrypt`] draws a fresh AES-256 key and IV from
//! the operating system RNG and returns `iv || ciphertext` (AES-256-CBC, PKCS#7 padding).
//! The key is handed back to the caller exactly once and is never stored or logged.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Random source failure: {0}")]
    RandomSource(String),

    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encrypted payload too short: {0} bytes")]
    PayloadTooShort(usize),

    #[error("Decryption failed: bad key or corrupted payload")]
    Decrypt,
}

/// Ephemeral per-request AES-256 key
#[derive(Clone, PartialEq, Eq)]
pub struct DeliveryKey([u8; KEY_LEN]);

impl DeliveryKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncryptionError> {
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| EncryptionError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(key))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, EncryptionError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| EncryptionError::InvalidKeyLength(0))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.0)
    }
}

// Never print key material.
impl fmt::Debug for DeliveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeliveryKey(<redacted>)")
    }
}

/// `iv || ciphertext`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Split a serialized payload into its leading IV and the ciphertext
    pub fn parse(data: &[u8]) -> Result<Self, EncryptionError> {
        if data.len() < IV_LEN {
            return Err(EncryptionError::PayloadTooShort(data.len()));
        }
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&data[..IV_LEN]);
        Ok(Self {
            iv,
            ciphertext: data[IV_LEN..].to_vec(),
        })
    }

    /// Serialized length; never zero since the IV is always present
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        IV_LEN + self.ciphertext.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.len());
        combined.extend_from_slice(&self.iv);
        combined.extend_from_slice(&self.ciphertext);
        combined
    }
}

/// Encrypts outputs for delivery with a key generated per call
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureDeliveryWrapper;

impl SecureDeliveryWrapper {
    pub fn new() -> Self {
        Self
    }

    pub fn encrypt(
        &self,
        payload: &[u8],
    ) -> Result<(EncryptedPayload, DeliveryKey), EncryptionError> {
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| EncryptionError::RandomSource(e.to_string()))?;
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| EncryptionError::RandomSource(e.to_string()))?;

        let ciphertext = Aes256CbcEnc::new_from_slices(&key, &iv)
            .map_err(|_| EncryptionError::InvalidKeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(payload);

        Ok((EncryptedPayload { iv, ciphertext }, DeliveryKey(key)))
    }

    /// Decrypt `iv || ciphertext` with the key that produced it
    pub fn decrypt(&self, key: &DeliveryKey, data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let payload = EncryptedPayload::parse(data)?;
        Aes256CbcDec::new_from_slices(key.as_bytes(), &payload.iv)
            .map_err(|_| EncryptionError::InvalidKeyLength(KEY_LEN))?
            .decrypt_padded_vec_mut::<Pkcs7>(&payload.ciphertext)
            .map_err(|_| EncryptionError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let wrapper = SecureDeliveryWrapper::new();
        let plaintext = b"watermarked png bytes".to_vec();

        let (payload, key) = wrapper.encrypt(&plaintext).unwrap();
        assert_ne!(payload.ciphertext, plaintext);

        let decrypted = wrapper.decrypt(&key, &payload.into_bytes()).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_payload_pads_to_one_block() {
        let wrapper = SecureDeliveryWrapper::new();
        let (payload, key) = wrapper.encrypt(&[]).unwrap();
        assert_eq!(payload.ciphertext.len(), 16);
        assert_eq!(payload.len(), IV_LEN + 16);

        let decrypted = wrapper.decrypt(&key, &payload.into_bytes()).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_block_aligned_payload_gets_full_padding_block() {
        let wrapper = SecureDeliveryWrapper::new();
        let plaintext = vec![7u8; 32];
        let (payload, key) = wrapper.encrypt(&plaintext).unwrap();
        assert_eq!(payload.ciphertext.len(), 48);
        assert_eq!(wrapper.decrypt(&key, &payload.into_bytes()).unwrap(), plaintext);
    }

    #[test]
    fn test_fresh_key_and_iv_per_call() {
        let wrapper = SecureDeliveryWrapper::new();
        let (first, first_key) = wrapper.encrypt(b"same").unwrap();
        let (second, second_key) = wrapper.encrypt(b"same").unwrap();
        assert_ne!(first_key, second_key);
        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_wrong_key_does_not_yield_plaintext() {
        let wrapper = SecureDeliveryWrapper::new();
        let plaintext = b"secret frame data".to_vec();
        let (payload, _) = wrapper.encrypt(&plaintext).unwrap();
        let (_, other_key) = wrapper.encrypt(b"x").unwrap();

        match wrapper.decrypt(&other_key, &payload.into_bytes()) {
            Ok(bytes) => assert_ne!(bytes, plaintext),
            Err(e) => assert!(matches!(e, EncryptionError::Decrypt)),
        }
    }

    #[test]
    fn test_short_payload_rejected() {
        let wrapper = SecureDeliveryWrapper::new();
        let key = DeliveryKey::from_bytes(&[0u8; KEY_LEN]).unwrap();
        assert!(matches!(
            wrapper.decrypt(&key, &[1, 2, 3]),
            Err(EncryptionError::PayloadTooShort(3))
        ));
    }

    #[test]
    fn test_key_base64_round_trip_and_redacted_debug() {
        let (_, key) = SecureDeliveryWrapper::new().encrypt(b"x").unwrap();
        let restored = DeliveryKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(restored, key);
        assert_eq!(format!("{:?}", key), "DeliveryKey(<redacted>)");
        assert!(DeliveryKey::from_bytes(&[0u8; 16]).is_err());
    }
}
