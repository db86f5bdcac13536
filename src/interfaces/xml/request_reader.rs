use crate::domain::notification::Notification;
use crate::domain::request::{PaymentKind, WireEncoding};
use crate::error::{RequestError, Result};
use crate::interfaces::wire::ParsedRecord;
use indexmap::IndexMap;
use roxmltree::{Document, Node};

/// Extracts a [`ParsedRecord`] from a well-formed markup document.
///
/// Mirrors the counterpart's contract: exactly one `order` element anywhere
/// in the document, a non-empty `type` discriminator, a non-empty `id`, and
/// exactly one `signature` child. Parameter entries missing either a `name`
/// or a `value` child are skipped, not fatal.
pub fn extract(document: &Document) -> Result<ParsedRecord> {
    let orders: Vec<Node> = document
        .descendants()
        .filter(|node| node.has_tag_name("order"))
        .collect();
    if orders.len() != 1 {
        return Err(RequestError::MissingRootElement {
            count: orders.len(),
        });
    }
    let order = orders[0];

    let discriminator = order.attribute("type").unwrap_or("");
    if discriminator.is_empty() {
        return Err(RequestError::MissingTypeAttribute);
    }
    let kind = PaymentKind::from_discriminator(discriminator)?;

    let order_id = order.attribute("id").unwrap_or("");
    if order_id.is_empty() {
        return Err(RequestError::MissingOrderId);
    }

    let signatures: Vec<Node> = order
        .children()
        .filter(|node| node.has_tag_name("signature"))
        .collect();
    if signatures.len() != 1 {
        return Err(RequestError::MissingSignature);
    }
    let signature = signatures[0].text().unwrap_or("").trim();
    if signature.is_empty() {
        return Err(RequestError::MissingSignature);
    }

    let (return_url, confirm_url, cancel_url) = match child(order, "url") {
        Some(url) => (
            child_text(url, "return"),
            child_text(url, "confirm"),
            child_text(url, "cancel"),
        ),
        None => (None, None, None),
    };

    let mut params = IndexMap::new();
    if let Some(params_elem) = child(order, "params") {
        for param in params_elem.children().filter(|node| node.has_tag_name("param")) {
            let Some(name) = child_text(param, "name") else {
                tracing::warn!("skipping param entry without a name child");
                continue;
            };
            let Some(value) = child_text(param, "value") else {
                tracing::warn!(param = %name, "skipping param entry without a value child");
                continue;
            };
            params.insert(name, url_decode(&value));
        }
    }

    let notify = child(order, "mobilpay").map(Notification::parse_from_element);

    let (amount, currency) = match child(order, "invoice") {
        Some(invoice) => {
            let amount = invoice.attribute("amount").and_then(|raw| {
                let parsed = raw.parse().ok();
                if parsed.is_none() {
                    tracing::warn!(amount = raw, "ignoring unparsable invoice amount");
                }
                parsed
            });
            (amount, invoice.attribute("currency").map(str::to_string))
        }
        None => (None, None),
    };

    Ok(ParsedRecord {
        kind,
        order_id: order_id.to_string(),
        signature: signature.to_string(),
        timestamp: order.attribute("timestamp").map(str::to_string),
        return_url,
        confirm_url,
        cancel_url,
        params,
        notify,
        service: child_text(order, "service"),
        msisdn: child_text(order, "msisdn"),
        amount,
        currency,
        encoding: WireEncoding::Markup,
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

/// Text of the first matching child element. Distinguishes a missing element
/// (`None`) from a present-but-empty one (`Some("")`).
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).map(|elem| elem.text().unwrap_or("").to_string())
}

fn url_decode(value: &str) -> String {
    let plus_decoded = value.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
