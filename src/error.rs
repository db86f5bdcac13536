use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequestError>;

/// Failure taxonomy for the payment-request protocol.
///
/// The set is closed: every defect a caller can observe maps to one of these
/// variants, and each variant carries a stable numeric code (see [`code`])
/// matching the legacy counterpart's constant table, so rejections can be
/// logged or relayed in a provider-compatible form.
///
/// [`code`]: RequestError::code
#[derive(Error, Debug)]
pub enum RequestError {
    /// Key material could not be loaded (bad path, bad PEM, bad passphrase).
    #[error("failed to load key material: {0}")]
    KeyLoad(String),
    /// Transport-encoded data (base64 envelope fields, snapshots) could not
    /// be decoded.
    #[error("failed to decode transport data: {0}")]
    Decode(String),
    /// The symmetric or asymmetric encryption step failed.
    #[error("encryption failed: {0}")]
    Encryption(String),
    /// Cryptographic failure while opening an envelope.
    ///
    /// Carries no detail about which step rejected the input; the specifics
    /// are logged at debug level only.
    #[error("decryption failed")]
    Decryption,
    #[error("expected exactly one order element, found {count}")]
    MissingRootElement { count: usize },
    #[error("order element has no type attribute")]
    MissingTypeAttribute,
    #[error("unknown request type `{0}`")]
    UnknownRequestType(String),
    #[error("order id attribute missing or empty")]
    MissingOrderId,
    #[error("signature element missing")]
    MissingSignature,
    /// A field required by the concrete request variant is unset at build
    /// time. Names the offending field.
    #[error("mandatory field `{0}` is not set")]
    MandatoryFieldUnset(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Stable numeric code for this error kind.
    ///
    /// Values are carried over from the legacy constant table and must not
    /// change between releases. `Io` is plumbing outside the protocol
    /// taxonomy and reports `0`.
    pub fn code(&self) -> u32 {
        match self {
            Self::KeyLoad(_) => 0x1000_0001,
            Self::Encryption(_) => 0x1000_0002,
            Self::MandatoryFieldUnset(_) => 0x1100_0001,
            Self::MissingRootElement { .. } => 0x2000_0001,
            Self::MissingTypeAttribute => 0x2000_0002,
            Self::UnknownRequestType(_) => 0x2000_0003,
            Self::MissingOrderId => 0x3000_0001,
            Self::MissingSignature => 0x3000_0002,
            Self::Decode(_) => 0x3000_00f1,
            Self::Decryption => 0x3000_00f3,
            Self::Io(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(RequestError::KeyLoad("x".into()).code(), 0x1000_0001);
        assert_eq!(RequestError::MandatoryFieldUnset("service").code(), 0x1100_0001);
        assert_eq!(RequestError::MissingRootElement { count: 2 }.code(), 0x2000_0001);
        assert_eq!(RequestError::UnknownRequestType("wire".into()).code(), 0x2000_0003);
        assert_eq!(RequestError::Decryption.code(), 0x3000_00f3);
    }

    #[test]
    fn test_decryption_message_carries_no_detail() {
        assert_eq!(RequestError::Decryption.to_string(), "decryption failed");
    }
}
