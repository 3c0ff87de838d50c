//! The `{status, msg, data}` body every blog API endpoint answers with.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::status::ApiStatus;

/// Response envelope.
///
/// `status` is mandatory; `msg` and `data` are optional and their presence
/// depends on the endpoint and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: ApiStatus,

    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            status: ApiStatus::Ok,
            msg: None,
            data: Some(data),
        }
    }

    pub fn failure(status: ApiStatus, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: Some(msg.into()),
            data: None,
        }
    }

    /// Decode a raw response body.
    ///
    /// Anything that is not a JSON object with an integer `status` is
    /// reported as [`EnvelopeError::Malformed`].
    pub fn decode(body: &[u8]) -> EnvelopeResult<Self> {
        serde_json::from_slice(body).map_err(|e| EnvelopeError::malformed(e.to_string()))
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Server-supplied message, if any non-blank one was sent.
    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// Deserialize `data` into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> EnvelopeResult<T> {
        let data = self.data.clone().ok_or(EnvelopeError::MissingPayload)?;
        serde_json::from_value(data).map_err(|e| EnvelopeError::payload(e.to_string()))
    }

    /// Like [`Envelope::data_as`] but treats a missing or null payload as `None`.
    pub fn optional_data_as<T: DeserializeOwned>(&self) -> EnvelopeResult<Option<T>> {
        match &self.data {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.data_as().map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_failure_with_message() {
        let env = Envelope::decode(br#"{"status":1,"msg":"name already taken"}"#).unwrap();
        assert_eq!(env.status, ApiStatus::BusinessRule);
        assert_eq!(env.message(), Some("name already taken"));
        assert!(env.data.is_none());
    }

    #[test]
    fn blank_message_is_treated_as_absent() {
        let env = Envelope::decode(br#"{"status":1,"msg":"  "}"#).unwrap();
        assert_eq!(env.message(), None);
    }

    #[test]
    fn body_without_status_is_malformed() {
        let err = Envelope::decode(br#"{"msg":"oops"}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));

        let err = Envelope::decode(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
    }

    #[test]
    fn typed_payload_extraction() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Site {
            title: String,
        }

        let env = Envelope::ok(json!({ "title": "my blog" }));
        let site: Site = env.data_as().unwrap();
        assert_eq!(site.title, "my blog");

        let empty = Envelope::decode(br#"{"status":0,"data":null}"#).unwrap();
        assert_eq!(empty.optional_data_as::<Site>().unwrap(), None);
        assert_eq!(empty.data_as::<Site>().unwrap_err(), EnvelopeError::MissingPayload);
    }
}
