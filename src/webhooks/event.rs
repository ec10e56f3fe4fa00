use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An event notification as delivered by the payment provider
///
/// Only `id`, `type` and `created` are required. Everything else the provider
/// sends is kept: `data` as an open map and any other top-level keys in
/// `extra`, so new provider fields never break decoding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Event {
    /// Provider-assigned identifier, used as the idempotency key
    pub id: String,
    /// Event category, e.g. `payment_intent.succeeded`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unix timestamp at which the provider created the event
    pub created: i64,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Decode an event from a raw JSON body
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_minimal_event() {
        let body = br#"{"id":"evt_1","type":"invoice.paid","created":1600000000}"#;
        let event = Event::from_slice(body).unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "invoice.paid");
        assert_eq!(event.created, 1600000000);
        assert!(event.data.is_empty());
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let body = json!({
            "id": "evt_2",
            "object": "event",
            "livemode": false,
            "type": "payment_intent.succeeded",
            "created": 1600000000,
            "data": {"amount": 2000, "currency": "usd", "object": {"id": "pi_1"}}
        })
        .to_string();

        let event = Event::from_slice(body.as_bytes()).unwrap();
        assert_eq!(event.data["amount"], 2000);
        assert_eq!(event.data["object"]["id"], "pi_1");
        assert_eq!(event.extra["object"], "event");
        assert_eq!(event.extra["livemode"], false);
        assert!(!event.extra.contains_key("id"));
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        let missing_type = br#"{"id":"evt_3","created":1600000000}"#;
        assert!(Event::from_slice(missing_type).is_err());

        let missing_created = br#"{"id":"evt_3","type":"invoice.paid"}"#;
        assert!(Event::from_slice(missing_created).is_err());

        let missing_id = br#"{"type":"invoice.paid","created":1600000000}"#;
        assert!(Event::from_slice(missing_id).is_err());
    }

    #[test]
    fn test_wrong_types_rejected() {
        let string_created = br#"{"id":"evt_4","type":"invoice.paid","created":"yesterday"}"#;
        assert!(Event::from_slice(string_created).is_err());

        let array_data = br#"{"id":"evt_4","type":"invoice.paid","created":1,"data":[1,2]}"#;
        assert!(Event::from_slice(array_data).is_err());
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(Event::from_slice(b"not json").is_err());
        assert!(Event::from_slice(b"").is_err());
        assert!(Event::from_slice(b"[]").is_err());
    }
}
