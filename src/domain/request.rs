use crate::domain::notification::Notification;
use crate::domain::snapshot::{RequestSnapshot, SNAPSHOT_VERSION};
use crate::error::{RequestError, Result};
use crate::infrastructure::crypto::{Envelope, EnvelopeCodec};
use crate::interfaces::wire::ParsedRecord;
use crate::interfaces::xml::request_writer;
use indexmap::IndexMap;
use rsa::RsaPublicKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request variant discriminator. Fixed at construction; decides which
/// concrete build/parse logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Sms,
    Card,
}

impl PaymentKind {
    /// Maps a wire discriminator (the `type` attribute) to a variant.
    pub fn from_discriminator(value: &str) -> Result<Self> {
        match value {
            "sms" => Ok(Self::Sms),
            "card" => Ok(Self::Card),
            other => Err(RequestError::UnknownRequestType(other.to_string())),
        }
    }

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Card => "card",
        }
    }
}

/// Wire encoding a request was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireEncoding {
    Markup,
    QueryString,
}

/// Provenance of a parsed request, retained for diagnostics and audit
/// logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub encoding: WireEncoding,
    pub raw: Vec<u8>,
}

/// SMS-variant payload. `service` is mandatory at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsDetails {
    pub service: Option<String>,
    pub msisdn: Option<String>,
}

/// Card-variant payload. `amount` and `currency` are mandatory at build
/// time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

/// Closed set of concrete request variants. Extending the protocol means
/// adding a variant here; there is no runtime registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RequestDetails {
    Sms(SmsDetails),
    Card(CardDetails),
}

impl RequestDetails {
    pub fn kind(&self) -> PaymentKind {
        match self {
            Self::Sms(_) => PaymentKind::Sms,
            Self::Card(_) => PaymentKind::Card,
        }
    }

    fn empty(kind: PaymentKind) -> Self {
        match kind {
            PaymentKind::Sms => Self::Sms(SmsDetails::default()),
            PaymentKind::Card => Self::Card(CardDetails::default()),
        }
    }
}

/// Lifecycle state of a request instance.
///
/// `Prepared` and `Sealed` are re-enterable: building or sealing again
/// re-validates and re-encrypts. There is no terminal state — a request
/// stays inspectable after sealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Constructed,
    Parsed,
    Prepared,
    Sealed,
}

/// A payment request exchanged with the processing provider.
///
/// Owns its full lifecycle: outbound `build → seal`, inbound
/// `open → parse → construct`. Strictly validated common fields live as
/// typed fields; the extension property bag is a deliberately permissive,
/// schema-less channel kept apart from them.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    order_id: String,
    signature: String,
    details: RequestDetails,
    timestamp: Option<String>,
    return_url: Option<String>,
    confirm_url: Option<String>,
    cancel_url: Option<String>,
    params: IndexMap<String, String>,
    notify: Option<Notification>,
    extensions: serde_json::Map<String, serde_json::Value>,
    request_identifier: String,
    request_info: Option<RequestInfo>,
    state: RequestState,
    sealed: Option<Envelope>,
}

impl PaymentRequest {
    /// Creates an outbound request. `order_id` and `signature` are fixed
    /// here; build-time validation rejects empty values.
    pub fn new(kind: PaymentKind, order_id: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            signature: signature.into(),
            details: RequestDetails::empty(kind),
            timestamp: None,
            return_url: None,
            confirm_url: None,
            cancel_url: None,
            params: IndexMap::new(),
            notify: None,
            extensions: serde_json::Map::new(),
            request_identifier: new_request_identifier(),
            request_info: None,
            state: RequestState::Constructed,
            sealed: None,
        }
    }

    /// Materializes a request from a parsed wire record, recording
    /// provenance. The record's discriminator selects the variant.
    pub(crate) fn from_record(record: ParsedRecord, raw: Vec<u8>) -> Self {
        let details = match record.kind {
            PaymentKind::Sms => RequestDetails::Sms(SmsDetails {
                service: record.service,
                msisdn: record.msisdn,
            }),
            PaymentKind::Card => RequestDetails::Card(CardDetails {
                amount: record.amount,
                currency: record.currency,
            }),
        };
        Self {
            order_id: record.order_id,
            signature: record.signature,
            details,
            timestamp: record.timestamp,
            return_url: record.return_url,
            confirm_url: record.confirm_url,
            cancel_url: record.cancel_url,
            params: record.params,
            notify: record.notify,
            extensions: serde_json::Map::new(),
            request_identifier: new_request_identifier(),
            request_info: Some(RequestInfo {
                encoding: record.encoding,
                raw,
            }),
            state: RequestState::Parsed,
            sealed: None,
        }
    }

    /// Restores a request from a versioned snapshot. The restored instance
    /// starts over as `Constructed`, with no provenance or cached envelope.
    pub fn from_snapshot(snapshot: RequestSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RequestError::Decode(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Self {
            order_id: snapshot.order_id,
            signature: snapshot.signature,
            details: snapshot.details,
            timestamp: snapshot.timestamp,
            return_url: snapshot.return_url,
            confirm_url: snapshot.confirm_url,
            cancel_url: snapshot.cancel_url,
            params: snapshot.params,
            notify: None,
            extensions: serde_json::Map::new(),
            request_identifier: snapshot.request_identifier,
            request_info: None,
            state: RequestState::Constructed,
            sealed: None,
        })
    }

    /// Captures the persistable fields of this request.
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            version: SNAPSHOT_VERSION,
            request_identifier: self.request_identifier.clone(),
            order_id: self.order_id.clone(),
            signature: self.signature.clone(),
            timestamp: self.timestamp.clone(),
            return_url: self.return_url.clone(),
            confirm_url: self.confirm_url.clone(),
            cancel_url: self.cancel_url.clone(),
            params: self.params.clone(),
            details: self.details.clone(),
        }
    }

    pub fn kind(&self) -> PaymentKind {
        self.details.kind()
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn details(&self) -> &RequestDetails {
        &self.details
    }

    /// Mutable access to the SMS payload, for populating outbound requests.
    /// `None` for other variants; the discriminator itself cannot change.
    pub fn sms_details_mut(&mut self) -> Option<&mut SmsDetails> {
        match &mut self.details {
            RequestDetails::Sms(details) => Some(details),
            RequestDetails::Card(_) => None,
        }
    }

    /// Mutable access to the card payload, for populating outbound requests.
    /// `None` for other variants; the discriminator itself cannot change.
    pub fn card_details_mut(&mut self) -> Option<&mut CardDetails> {
        match &mut self.details {
            RequestDetails::Card(details) => Some(details),
            RequestDetails::Sms(_) => None,
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn set_timestamp(&mut self, timestamp: impl Into<String>) {
        self.timestamp = Some(timestamp.into());
    }

    pub fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    pub fn confirm_url(&self) -> Option<&str> {
        self.confirm_url.as_deref()
    }

    pub fn cancel_url(&self) -> Option<&str> {
        self.cancel_url.as_deref()
    }

    /// Overrides the account-default return URL.
    pub fn set_return_url(&mut self, url: impl Into<String>) {
        self.return_url = Some(url.into());
    }

    pub fn set_confirm_url(&mut self, url: impl Into<String>) {
        self.confirm_url = Some(url.into());
    }

    pub fn set_cancel_url(&mut self, url: impl Into<String>) {
        self.cancel_url = Some(url.into());
    }

    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    /// Sets an extension parameter. Duplicate names overwrite in place
    /// (last write wins, original position kept).
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn notify(&self) -> Option<&Notification> {
        self.notify.as_ref()
    }

    /// Reads an extension property. Unknown keys yield `None`, never an
    /// error.
    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }

    /// Writes an extension property. Always succeeds; no schema applies.
    pub fn set_extension(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.extensions.insert(key.into(), value.into());
    }

    /// Process-local correlation id. Not part of the wire format and never
    /// key material.
    pub fn request_identifier(&self) -> &str {
        &self.request_identifier
    }

    /// How this instance was parsed, if it came off the wire.
    pub fn request_info(&self) -> Option<&RequestInfo> {
        self.request_info.as_ref()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Envelope from the most recent [`encrypt_for`](Self::encrypt_for)
    /// call, if any. Retrieval never re-encrypts.
    pub fn envelope(&self) -> Option<&Envelope> {
        self.sealed.as_ref()
    }

    /// Validates mandatory fields and serializes the canonical markup
    /// document. Byte-identical across calls for unchanged state; a
    /// validation failure produces no partial document.
    pub fn build(&mut self) -> Result<Vec<u8>> {
        self.validate()?;
        let document = request_writer::render(self)?;
        self.state = RequestState::Prepared;
        Ok(document)
    }

    /// Builds the document and seals it for the recipient. The envelope is
    /// retained on the request; calling again re-encrypts with fresh
    /// randomness, so envelope bytes differ while decrypted content does
    /// not.
    pub fn encrypt_for(
        &mut self,
        public_key: &RsaPublicKey,
        codec: &EnvelopeCodec,
    ) -> Result<&Envelope> {
        let payload = self.build()?;
        let envelope = codec.seal(&payload, public_key)?;
        self.state = RequestState::Sealed;
        Ok(self.sealed.insert(envelope))
    }

    fn validate(&self) -> Result<()> {
        if self.order_id.trim().is_empty() {
            return Err(RequestError::MandatoryFieldUnset("order_id"));
        }
        if self.signature.trim().is_empty() {
            return Err(RequestError::MandatoryFieldUnset("signature"));
        }
        match &self.details {
            RequestDetails::Sms(details) => {
                if details.service.as_deref().is_none_or(str::is_empty) {
                    return Err(RequestError::MandatoryFieldUnset("service"));
                }
            }
            RequestDetails::Card(details) => {
                if details.amount.is_none() {
                    return Err(RequestError::MandatoryFieldUnset("amount"));
                }
                if details.currency.as_deref().is_none_or(str::is_empty) {
                    return Err(RequestError::MandatoryFieldUnset("currency"));
                }
            }
        }
        Ok(())
    }
}

fn new_request_identifier() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card_request() -> PaymentRequest {
        let mut request = PaymentRequest::new(PaymentKind::Card, "ORD1", "SIG1");
        let details = request.card_details_mut().unwrap();
        details.amount = Some(dec!(10.00));
        details.currency = Some("RON".to_string());
        request
    }

    #[test]
    fn test_build_requires_variant_fields() {
        let mut request = PaymentRequest::new(PaymentKind::Sms, "ORD1", "SIG1");
        let result = request.build();
        assert!(matches!(
            result,
            Err(RequestError::MandatoryFieldUnset("service"))
        ));
        // Validation failed before any document was produced.
        assert_eq!(request.state(), RequestState::Constructed);
    }

    #[test]
    fn test_build_requires_common_fields() {
        let mut request = PaymentRequest::new(PaymentKind::Sms, "", "SIG1");
        assert!(matches!(
            request.build(),
            Err(RequestError::MandatoryFieldUnset("order_id"))
        ));
    }

    #[test]
    fn test_card_missing_currency_named() {
        let mut request = PaymentRequest::new(PaymentKind::Card, "ORD1", "SIG1");
        request.card_details_mut().unwrap().amount = Some(dec!(1.00));
        assert!(matches!(
            request.build(),
            Err(RequestError::MandatoryFieldUnset("currency"))
        ));
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut request = card_request();
        let first = request.build().unwrap();
        let second = request.build().unwrap();
        assert_eq!(first, second);
        assert_eq!(request.state(), RequestState::Prepared);
    }

    #[test]
    fn test_extension_bag_semantics() {
        let mut request = card_request();
        assert!(request.extension("installments").is_none());

        request.set_extension("installments", 3);
        assert_eq!(
            request.extension("installments"),
            Some(&serde_json::Value::from(3))
        );

        // Unconditional overwrite.
        request.set_extension("installments", "4");
        assert_eq!(
            request.extension("installments"),
            Some(&serde_json::Value::from("4"))
        );
    }

    #[test]
    fn test_param_last_write_wins() {
        let mut request = card_request();
        request.set_param("lang", "ro");
        request.set_param("theme", "dark");
        request.set_param("lang", "en");

        assert_eq!(request.params().get("lang").map(String::as_str), Some("en"));
        // Original insertion position kept.
        assert_eq!(
            request.params().keys().collect::<Vec<_>>(),
            vec!["lang", "theme"]
        );
    }

    #[test]
    fn test_request_identifiers_are_unique() {
        let a = PaymentRequest::new(PaymentKind::Sms, "O1", "S1");
        let b = PaymentRequest::new(PaymentKind::Sms, "O1", "S1");
        assert_ne!(a.request_identifier(), b.request_identifier());
        assert_eq!(a.request_identifier().len(), 32);
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_fields() {
        let mut request = card_request();
        request.set_return_url("https://merchant.example/return");
        request.set_param("lang", "ro");
        request.set_extension("transient", true);

        let restored =
            PaymentRequest::from_snapshot(request.snapshot()).unwrap();
        assert_eq!(restored.order_id(), request.order_id());
        assert_eq!(restored.signature(), request.signature());
        assert_eq!(restored.details(), request.details());
        assert_eq!(restored.params(), request.params());
        assert_eq!(restored.request_identifier(), request.request_identifier());
        assert_eq!(restored.state(), RequestState::Constructed);
        // Extensions are live-instance state, not snapshotted.
        assert!(restored.extension("transient").is_none());
    }
}
