// ============================================================================
// STATISTICS EVENTS
// ============================================================================
//
// Wire format for the user-action stream consumed by the similarity
// aggregator and the similarity stream it produces. Timestamps travel as
// epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of interaction a user had with an event
///
/// Accepts the upper-case names, the `ACTION_*` names used by the collector
/// protobuf, and lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    #[serde(alias = "ACTION_VIEW", alias = "view")]
    View,
    #[serde(alias = "ACTION_REGISTER", alias = "register")]
    Register,
    #[serde(alias = "ACTION_LIKE", alias = "like")]
    Like,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::View => "VIEW",
            ActionKind::Register => "REGISTER",
            ActionKind::Like => "LIKE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user interaction with an event
///
/// ```json
/// {
///   "event_id": 100,
///   "user_id": 1,
///   "action_type": "VIEW",
///   "timestamp": 1678901234567
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    pub event_id: i64,
    pub user_id: i64,
    pub action_type: ActionKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Similarity between two events, `event_a < event_b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSimilarity {
    pub event_a: i64,
    pub event_b: i64,
    pub score: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl EventSimilarity {
    /// Kafka partition key; all updates for the same first event share a partition
    pub fn kafka_key(&self) -> String {
        self.event_a.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_action_from_json() {
        let payload = r#"{"event_id":100,"user_id":1,"action_type":"LIKE","timestamp":1700000000000}"#;
        let action: UserAction = serde_json::from_str(payload).expect("valid action");

        assert_eq!(action.event_id, 100);
        assert_eq!(action.user_id, 1);
        assert_eq!(action.action_type, ActionKind::Like);
        assert_eq!(action.timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_action_kind_aliases() {
        let proto: ActionKind = serde_json::from_str(r#""ACTION_REGISTER""#).unwrap();
        let lower: ActionKind = serde_json::from_str(r#""view""#).unwrap();

        assert_eq!(proto, ActionKind::Register);
        assert_eq!(lower, ActionKind::View);
    }

    #[test]
    fn test_unknown_action_kind_rejected() {
        let payload = r#"{"event_id":100,"user_id":1,"action_type":"SHARE","timestamp":1700000000000}"#;
        assert!(serde_json::from_str::<UserAction>(payload).is_err());
    }

    #[test]
    fn test_missing_user_id_rejected() {
        let payload = r#"{"event_id":100,"action_type":"VIEW","timestamp":1700000000000}"#;
        assert!(serde_json::from_str::<UserAction>(payload).is_err());
    }

    #[test]
    fn test_similarity_serializes_millis() {
        let similarity = EventSimilarity {
            event_a: 100,
            event_b: 200,
            score: 0.63246,
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        };

        let json = serde_json::to_value(&similarity).unwrap();
        assert_eq!(json["event_a"], 100);
        assert_eq!(json["event_b"], 200);
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(similarity.kafka_key(), "100");
    }

    #[test]
    fn test_action_kind_display() {
        assert_eq!(ActionKind::View.to_string(), "VIEW");
        assert_eq!(ActionKind::Like.as_str(), "LIKE");
    }
}
