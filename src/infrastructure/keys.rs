//! RSA key-material loading.
//!
//! Keys are loaded once at startup and shared read-only afterwards. Public
//! keys are accepted as SPKI or PKCS#1 PEM; private keys as PKCS#8
//! (optionally passphrase-encrypted) or PKCS#1 PEM.

use crate::error::{RequestError, Result};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::Path;

/// Parses a public key from PEM text (SPKI or PKCS#1).
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    if let Ok(key) = RsaPublicKey::from_public_key_pem(pem) {
        return Ok(key);
    }
    RsaPublicKey::from_pkcs1_pem(pem)
        .map_err(|err| RequestError::KeyLoad(format!("public key: {err}")))
}

/// Reads and parses a public key PEM file.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey> {
    let pem = std::fs::read_to_string(path)
        .map_err(|err| RequestError::KeyLoad(format!("{}: {err}", path.display())))?;
    public_key_from_pem(&pem)
}

/// Parses a private key from PEM text.
///
/// With a passphrase, the input must be an encrypted PKCS#8 document;
/// without one, PKCS#8 and PKCS#1 are accepted.
pub fn private_key_from_pem(pem: &str, passphrase: Option<&str>) -> Result<RsaPrivateKey> {
    match passphrase {
        Some(passphrase) => RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.as_bytes())
            .map_err(|err| RequestError::KeyLoad(format!("private key: {err}"))),
        None => {
            if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
                return Ok(key);
            }
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|err| RequestError::KeyLoad(format!("private key: {err}")))
        }
    }
}

/// Reads and parses a private key PEM file.
pub fn load_private_key(path: &Path, passphrase: Option<&str>) -> Result<RsaPrivateKey> {
    let pem = std::fs::read_to_string(path)
        .map_err(|err| RequestError::KeyLoad(format!("{}: {err}", path.display())))?;
    private_key_from_pem(&pem, passphrase)
}
