use crate::domain::request::RequestDetails;
use crate::error::{RequestError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Versioned, selective persistence form of a request.
///
/// Carries exactly the fields a restored request needs: identity, common
/// fields, and the variant payload. Extension properties, provenance,
/// notifications, and cached envelopes are deliberately excluded — they
/// describe a live instance, not the request itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub version: u8,
    pub request_identifier: String,
    pub order_id: String,
    pub signature: String,
    pub timestamp: Option<String>,
    pub return_url: Option<String>,
    pub confirm_url: Option<String>,
    pub cancel_url: Option<String>,
    pub params: IndexMap<String, String>,
    pub details: RequestDetails,
}

impl RequestSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|err| RequestError::Decode(format!("snapshot encode: {err}")))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(raw)
            .map_err(|err| RequestError::Decode(format!("snapshot decode: {err}")))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RequestError::Decode(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::SmsDetails;

    fn sample() -> RequestSnapshot {
        RequestSnapshot {
            version: SNAPSHOT_VERSION,
            request_identifier: "abc".to_string(),
            order_id: "ORD1".to_string(),
            signature: "SIG1".to_string(),
            timestamp: None,
            return_url: Some("https://merchant.example/return".to_string()),
            confirm_url: None,
            cancel_url: None,
            params: IndexMap::from([("lang".to_string(), "ro".to_string())]),
            details: RequestDetails::Sms(SmsDetails {
                service: Some("SVC".to_string()),
                msisdn: None,
            }),
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap();
        let restored = RequestSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut snapshot = sample();
        snapshot.version = 9;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            RequestSnapshot::from_json(&json),
            Err(RequestError::Decode(_))
        ));
    }
}
