use crate::domain::request::{PaymentKind, WireEncoding};
use crate::error::{RequestError, Result};
use crate::interfaces::wire::ParsedRecord;
use indexmap::IndexMap;

/// Parses a flat `key=value&key=value` query string.
///
/// Only the SMS variant is valid in this encoding; the discriminator is
/// fixed by convention rather than discovered. Well-known keys populate the
/// common fields, everything else lands in `params` (last write wins).
pub fn parse(raw: &[u8]) -> Result<ParsedRecord> {
    let mut order_id = String::new();
    let mut signature = String::new();
    let mut timestamp = None;
    let mut return_url = None;
    let mut confirm_url = None;
    let mut cancel_url = None;
    let mut service = None;
    let mut msisdn = None;
    let mut params = IndexMap::new();

    for (key, value) in form_urlencoded::parse(raw) {
        let value = value.into_owned();
        match key.as_ref() {
            "orderId" => order_id = value,
            "signature" => signature = value,
            "timestamp" => timestamp = Some(value),
            "returnUrl" => return_url = Some(value),
            "confirmUrl" => confirm_url = Some(value),
            "cancelUrl" => cancel_url = Some(value),
            "service" => service = Some(value),
            "msisdn" => msisdn = Some(value),
            _ => {
                params.insert(key.into_owned(), value);
            }
        }
    }

    if order_id.is_empty() {
        return Err(RequestError::MissingOrderId);
    }
    if signature.is_empty() {
        return Err(RequestError::MissingSignature);
    }

    Ok(ParsedRecord {
        kind: PaymentKind::Sms,
        order_id,
        signature,
        timestamp,
        return_url,
        confirm_url,
        cancel_url,
        params,
        notify: None,
        service,
        msisdn,
        amount: None,
        currency: None,
        encoding: WireEncoding::QueryString,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_pairs() {
        let record =
            parse(b"orderId=ORD1&signature=SIG1&param_name[]=foo&param_value[]=bar").unwrap();
        assert_eq!(record.kind, PaymentKind::Sms);
        assert_eq!(record.order_id, "ORD1");
        assert_eq!(record.signature, "SIG1");
        assert_eq!(
            record.params.get("param_name[]").map(String::as_str),
            Some("foo")
        );
        assert_eq!(
            record.params.get("param_value[]").map(String::as_str),
            Some("bar")
        );
    }

    #[test]
    fn test_values_are_url_decoded() {
        let record = parse(b"orderId=O%201&signature=S1&note=a+b%26c").unwrap();
        assert_eq!(record.order_id, "O 1");
        assert_eq!(record.params.get("note").map(String::as_str), Some("a b&c"));
    }

    #[test]
    fn test_well_known_keys_do_not_leak_into_params() {
        let record =
            parse(b"orderId=O1&signature=S1&service=SVC&returnUrl=https%3A%2F%2Fm.example%2Fr")
                .unwrap();
        assert_eq!(record.service.as_deref(), Some("SVC"));
        assert_eq!(record.return_url.as_deref(), Some("https://m.example/r"));
        assert!(record.params.is_empty());
    }

    #[test]
    fn test_missing_order_id_rejected() {
        assert!(matches!(
            parse(b"signature=S1"),
            Err(RequestError::MissingOrderId)
        ));
    }

    #[test]
    fn test_missing_signature_rejected() {
        assert!(matches!(
            parse(b"orderId=O1"),
            Err(RequestError::MissingSignature)
        ));
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let record = parse(b"orderId=O1&signature=S1&lang=ro&lang=en").unwrap();
        assert_eq!(record.params.get("lang").map(String::as_str), Some("en"));
    }
}
