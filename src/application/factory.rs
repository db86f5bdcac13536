use crate::domain::request::PaymentRequest;
use crate::error::Result;
use crate::infrastructure::crypto::{Envelope, EnvelopeCodec};
use crate::infrastructure::keys;
use crate::interfaces::wire;
use rsa::RsaPrivateKey;

/// Constructs [`PaymentRequest`] instances from untrusted wire input.
///
/// The factory owns the inbound side of the lifecycle: decrypt (optional),
/// parse, dispatch on the discriminator, record provenance. It holds only a
/// codec configuration and read-only key material passed per call, so a
/// single factory may serve any number of requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFactory {
    codec: EnvelopeCodec,
}

impl RequestFactory {
    pub fn new(codec: EnvelopeCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// Parses raw bytes (markup or query string) into the matching concrete
    /// request variant. Parser failures propagate unchanged.
    pub fn from_wire_bytes(&self, raw: &[u8]) -> Result<PaymentRequest> {
        let record = wire::parse(raw)?;
        Ok(PaymentRequest::from_record(record, raw.to_vec()))
    }

    /// Opens an encrypted envelope and parses the recovered plaintext.
    ///
    /// Pure composition of the codec and the wire parser; codec and parser
    /// failures propagate unchanged.
    pub fn from_encrypted(
        &self,
        envelope: &Envelope,
        private_key: &RsaPrivateKey,
    ) -> Result<PaymentRequest> {
        let plaintext = self.codec.open(envelope, private_key)?;
        self.from_wire_bytes(&plaintext)
    }

    /// Convenience over [`from_encrypted`](Self::from_encrypted) for callers
    /// holding PEM text instead of a loaded key.
    pub fn from_encrypted_pem(
        &self,
        envelope: &Envelope,
        private_key_pem: &str,
        passphrase: Option<&str>,
    ) -> Result<PaymentRequest> {
        let private_key = keys::private_key_from_pem(private_key_pem, passphrase)?;
        self.from_encrypted(envelope, &private_key)
    }
}
