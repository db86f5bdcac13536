use crate::domain::request::{PaymentRequest, RequestDetails};
use crate::error::Result;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// Serializes a request into its canonical markup document.
///
/// Output is deterministic for a given request state: fixed element order,
/// URL block and params block emitted only when populated. The same document
/// shape the reader accepts.
pub fn render(request: &PaymentRequest) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut order = BytesStart::new("order");
    order.push_attribute(("type", request.kind().discriminator()));
    order.push_attribute(("id", request.order_id()));
    if let Some(timestamp) = request.timestamp() {
        order.push_attribute(("timestamp", timestamp));
    }
    emit(&mut writer, Event::Start(order))?;

    text_element(&mut writer, "signature", request.signature())?;

    match request.details() {
        RequestDetails::Sms(details) => {
            if let Some(service) = &details.service {
                text_element(&mut writer, "service", service)?;
            }
            if let Some(msisdn) = &details.msisdn {
                text_element(&mut writer, "msisdn", msisdn)?;
            }
        }
        RequestDetails::Card(details) => {
            let mut invoice = BytesStart::new("invoice");
            if let Some(amount) = &details.amount {
                invoice.push_attribute(("amount", amount.to_string().as_str()));
            }
            if let Some(currency) = &details.currency {
                invoice.push_attribute(("currency", currency.as_str()));
            }
            emit(&mut writer, Event::Empty(invoice))?;
        }
    }

    let urls = [
        ("return", request.return_url()),
        ("confirm", request.confirm_url()),
        ("cancel", request.cancel_url()),
    ];
    if urls.iter().any(|(_, url)| url.is_some()) {
        emit(&mut writer, Event::Start(BytesStart::new("url")))?;
        for (name, url) in urls {
            if let Some(url) = url {
                text_element(&mut writer, name, url)?;
            }
        }
        emit(&mut writer, Event::End(BytesEnd::new("url")))?;
    }

    if !request.params().is_empty() {
        emit(&mut writer, Event::Start(BytesStart::new("params")))?;
        for (name, value) in request.params() {
            emit(&mut writer, Event::Start(BytesStart::new("param")))?;
            text_element(&mut writer, "name", name)?;
            let encoded = utf8_percent_encode(value, NON_ALPHANUMERIC).to_string();
            text_element(&mut writer, "value", &encoded)?;
            emit(&mut writer, Event::End(BytesEnd::new("param")))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("params")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("order")))?;
    Ok(writer.into_inner())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|err| std::io::Error::other(err).into())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(value)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::PaymentKind;
    use crate::interfaces::wire;
    use rust_decimal_macros::dec;

    fn sample_card() -> PaymentRequest {
        let mut request = PaymentRequest::new(PaymentKind::Card, "ORD1", "SIG1");
        let details = request.card_details_mut().unwrap();
        details.amount = Some(dec!(10.50));
        details.currency = Some("RON".to_string());
        request
    }

    #[test]
    fn test_minimal_document_shape() {
        let document = render(&sample_card()).unwrap();
        let text = String::from_utf8(document).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <order type=\"card\" id=\"ORD1\">\
             <signature>SIG1</signature>\
             <invoice amount=\"10.50\" currency=\"RON\"/>\
             </order>"
        );
    }

    #[test]
    fn test_output_reparses_to_same_fields() {
        let mut request = sample_card();
        request.set_timestamp("20240101120000");
        request.set_return_url("https://m.example/r?a=1&b=2");
        request.set_param("lang", "ro");
        request.set_param("note", "a b&c");

        let document = render(&request).unwrap();
        let record = wire::parse(&document).unwrap();

        assert_eq!(record.kind, PaymentKind::Card);
        assert_eq!(record.order_id, "ORD1");
        assert_eq!(record.signature, "SIG1");
        assert_eq!(record.timestamp.as_deref(), Some("20240101120000"));
        assert_eq!(record.return_url.as_deref(), Some("https://m.example/r?a=1&b=2"));
        assert_eq!(record.amount, Some(dec!(10.50)));
        assert_eq!(record.currency.as_deref(), Some("RON"));
        assert_eq!(record.params.get("lang").map(String::as_str), Some("ro"));
        assert_eq!(record.params.get("note").map(String::as_str), Some("a b&c"));
    }

    #[test]
    fn test_markup_escaping() {
        let mut request = sample_card();
        request.set_return_url("https://m.example/r?a=1&b=<2>");

        let document = render(&request).unwrap();
        let text = String::from_utf8(document).unwrap();
        assert!(text.contains("a=1&amp;b=&lt;2&gt;"));

        let record = wire::parse(&request.build().unwrap()).unwrap();
        assert_eq!(
            record.return_url.as_deref(),
            Some("https://m.example/r?a=1&b=<2>")
        );
    }
}
