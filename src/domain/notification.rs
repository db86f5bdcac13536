use serde::{Deserialize, Serialize};

/// Provider-initiated payment-status callback, carried as a nested
/// sub-document inside an incoming request.
///
/// Owned by the request it arrived with. Parsing is tolerant: the provider
/// controls this block, and missing pieces are represented as `None` rather
/// than failing the enclosing request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: Option<String>,
    pub crc: Option<String>,
    pub action: Option<String>,
    pub error_code: Option<i32>,
    pub error_message: Option<String>,
}

impl Notification {
    /// Parses a notification from its designated element.
    pub fn parse_from_element(element: roxmltree::Node<'_, '_>) -> Self {
        let mut notification = Self {
            timestamp: element.attribute("timestamp").map(str::to_string),
            crc: element.attribute("crc").map(str::to_string),
            ..Self::default()
        };

        for child in element.children() {
            if child.has_tag_name("action") {
                notification.action = child.text().map(str::to_string);
            } else if child.has_tag_name("error") {
                notification.error_code =
                    child.attribute("code").and_then(|code| code.parse().ok());
                notification.error_message = child.text().map(str::to_string);
            }
        }

        notification
    }
}
