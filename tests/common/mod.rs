use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::{Path, PathBuf};

// 1024-bit keeps generation fast in tests; production keys are 2048+.
const TEST_KEY_BITS: usize = 1024;

#[allow(dead_code)]
pub fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
    let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, TEST_KEY_BITS).unwrap();
    let public = RsaPublicKey::from(&private);
    (private, public)
}

#[allow(dead_code)]
pub fn write_pem_keypair(dir: &Path) -> (PathBuf, PathBuf) {
    let (private, public) = test_keypair();

    let private_path = dir.join("private.pem");
    let public_path = dir.join("public.pem");
    std::fs::write(
        &private_path,
        private.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();
    std::fs::write(
        &public_path,
        public.to_public_key_pem(LineEnding::LF).unwrap(),
    )
    .unwrap();
    (private_path, public_path)
}
