//! Hybrid envelope encryption.
//!
//! A payload is sealed under a fresh random symmetric key, and the symmetric
//! key is wrapped under the recipient's RSA public key. Both outputs travel
//! as base64 text in two separate fields; that pairing is the external
//! protocol contract.
//!
//! Two cipher modes share the envelope shape:
//!
//! - **AES-256-GCM** (default): `sealed_payload = nonce(12) || ciphertext+tag`,
//!   `wrapped_key = RSA-OAEP-SHA256(key)`.
//! - **Legacy RC4** (deprecated, interop only): `sealed_payload = RC4(payload)`
//!   with a 128-bit key, `wrapped_key = RSA-PKCS#1-v1.5(key)`. This is the
//!   exact byte format the legacy counterpart emits; it is unauthenticated
//!   and must only be selected when talking to an unchanged peer.

use crate::error::{RequestError, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use rc4::consts::U16;
use rc4::{KeyInit as _, Rc4, StreamCipher};
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

const AES_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const RC4_KEY_LEN: usize = 16;

/// Sealed payload plus wrapped symmetric key, both base64 text.
///
/// Exchanged with the counterpart as two separate fields (`data` and
/// `env_key` in its POST contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub sealed_payload: String,
    pub wrapped_key: String,
}

impl Envelope {
    pub fn new(sealed_payload: impl Into<String>, wrapped_key: impl Into<String>) -> Self {
        Self {
            sealed_payload: sealed_payload.into(),
            wrapped_key: wrapped_key.into(),
        }
    }
}

/// Symmetric cipher selection for the envelope payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherMode {
    /// AES-256-GCM, authenticated (default).
    #[default]
    Aes256Gcm,
    /// RC4, unauthenticated. Deprecated; kept for interoperability with the
    /// unchanged legacy counterpart.
    LegacyRc4,
}

/// Seals and opens envelopes in a configured [`CipherMode`].
///
/// Holds no mutable state; a single codec may be shared across threads.
/// Every `seal` call draws a fresh key and nonce from the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec {
    mode: CipherMode,
}

impl EnvelopeCodec {
    pub fn new(mode: CipherMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Seals `payload` for the holder of the matching private key.
    ///
    /// # Errors
    ///
    /// Returns `Encryption` if either the symmetric or the asymmetric step
    /// fails (e.g. the recipient modulus is too small to wrap the key).
    pub fn seal(&self, payload: &[u8], public_key: &RsaPublicKey) -> Result<Envelope> {
        match self.mode {
            CipherMode::Aes256Gcm => seal_aes(payload, public_key),
            CipherMode::LegacyRc4 => seal_rc4(payload, public_key),
        }
    }

    /// Recovers the plaintext sealed into `envelope`.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if either envelope field is not valid base64, and
    /// `Decryption` for every cryptographic failure — wrong key, corrupted
    /// ciphertext, padding or tag mismatch. Which step rejected the input is
    /// never surfaced to the caller; it is logged at debug level.
    pub fn open(&self, envelope: &Envelope, private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
        let sealed = decode_field(&envelope.sealed_payload, "sealed payload")?;
        let wrapped = decode_field(&envelope.wrapped_key, "wrapped key")?;

        match self.mode {
            CipherMode::Aes256Gcm => open_aes(&sealed, &wrapped, private_key),
            CipherMode::LegacyRc4 => open_rc4(&sealed, &wrapped, private_key),
        }
    }
}

fn decode_field(field: &str, name: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(field.trim())
        .map_err(|err| RequestError::Decode(format!("{name}: {err}")))
}

fn seal_aes(payload: &[u8], public_key: &RsaPublicKey) -> Result<Envelope> {
    let mut key = [0u8; AES_KEY_LEN];
    OsRng.fill_bytes(&mut key);
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), payload)
        .map_err(|_| RequestError::Encryption("payload encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    let wrapped = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &key)
        .map_err(|err| RequestError::Encryption(format!("key wrap failed: {err}")))?;

    Ok(Envelope::new(BASE64.encode(sealed), BASE64.encode(wrapped)))
}

fn open_aes(sealed: &[u8], wrapped: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let key = private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map_err(|err| {
            tracing::debug!("envelope key unwrap rejected: {err}");
            RequestError::Decryption
        })?;
    if key.len() != AES_KEY_LEN || sealed.len() < NONCE_LEN {
        tracing::debug!("envelope has unexpected key or payload length");
        return Err(RequestError::Decryption);
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    cipher.decrypt(Nonce::from_slice(nonce), ciphertext).map_err(|_| {
        tracing::debug!("payload authentication failed");
        RequestError::Decryption
    })
}

fn seal_rc4(payload: &[u8], public_key: &RsaPublicKey) -> Result<Envelope> {
    let mut key = [0u8; RC4_KEY_LEN];
    OsRng.fill_bytes(&mut key);

    let mut sealed = payload.to_vec();
    let mut cipher = Rc4::<U16>::new(&key.into());
    cipher.apply_keystream(&mut sealed);

    let wrapped = public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, &key)
        .map_err(|err| RequestError::Encryption(format!("key wrap failed: {err}")))?;

    Ok(Envelope::new(BASE64.encode(sealed), BASE64.encode(wrapped)))
}

fn open_rc4(sealed: &[u8], wrapped: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let key = private_key.decrypt(Pkcs1v15Encrypt, wrapped).map_err(|err| {
        tracing::debug!("envelope key unwrap rejected: {err}");
        RequestError::Decryption
    })?;
    if key.len() != RC4_KEY_LEN {
        tracing::debug!("envelope has unexpected key length");
        return Err(RequestError::Decryption);
    }

    let mut plaintext = sealed.to_vec();
    let mut key_bytes = [0u8; RC4_KEY_LEN];
    key_bytes.copy_from_slice(&key);
    let mut cipher = Rc4::<U16>::new(&key_bytes.into());
    cipher.apply_keystream(&mut plaintext);
    Ok(plaintext)
}
