use crate::domain::notification::Notification;
use crate::domain::request::{PaymentKind, WireEncoding};
use crate::error::Result;
use crate::interfaces::{query, xml};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Format-agnostic intermediate record produced by the wire parser, before
/// variant dispatch. Plain data; no business validation beyond the
/// structural checks performed during extraction.
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub kind: PaymentKind,
    pub order_id: String,
    pub signature: String,
    pub timestamp: Option<String>,
    pub return_url: Option<String>,
    pub confirm_url: Option<String>,
    pub cancel_url: Option<String>,
    pub params: IndexMap<String, String>,
    pub notify: Option<Notification>,
    pub service: Option<String>,
    pub msisdn: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub encoding: WireEncoding,
}

/// Parses raw untrusted bytes into a [`ParsedRecord`].
///
/// The input is first interpreted as markup. A document that parses but
/// violates the structure (wrong root count, missing attributes) aborts with
/// the specific parse error; only *outright unparsable* markup falls back to
/// the flat query-string interpretation. That fallback is the single place
/// the parser retries another encoding.
pub fn parse(raw: &[u8]) -> Result<ParsedRecord> {
    if let Ok(text) = std::str::from_utf8(raw) {
        match roxmltree::Document::parse(text) {
            Ok(document) => return xml::request_reader::extract(&document),
            Err(err) => {
                tracing::debug!("input is not well-formed markup ({err}), retrying as query string");
            }
        }
    }
    query::request_reader::parse(raw)
}
