//! Outbound wire messages.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Messages the server pushes to connected clients.
///
/// The presence protocol has a single message shape: the full list of
/// currently online identities, sent after every registry change. Clients
/// replace their entire local list on receipt; there is no incremental
/// merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Full presence snapshot, in registry insertion order.
    SetUsersFromServer {
        /// Every identity currently online.
        payload: Vec<Identity>,
    },
}

impl ServerMessage {
    /// Build a snapshot message from the current registry contents.
    pub fn snapshot(users: Vec<Identity>) -> Self {
        Self::SetUsersFromServer { payload: users }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, first: &str) -> Identity {
        Identity {
            id,
            first_name: first.into(),
            last_name: "Test".into(),
            email: format!("{first}@example.com").to_lowercase(),
            avatar_src: None,
        }
    }

    #[test]
    fn tagged_with_set_users_from_server() {
        let msg = ServerMessage::snapshot(vec![user(1, "Ada")]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "SET_USERS_FROM_SERVER");
        assert_eq!(json["payload"][0]["id"], 1);
        assert_eq!(json["payload"][0]["firstName"], "Ada");
    }

    #[test]
    fn empty_snapshot_serializes_empty_array() {
        let msg = ServerMessage::snapshot(vec![]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"], serde_json::json!([]));
    }

    #[test]
    fn payload_preserves_order() {
        let msg = ServerMessage::snapshot(vec![user(3, "C"), user(1, "A"), user(2, "B")]);
        let json = serde_json::to_value(&msg).unwrap();
        let ids: Vec<i64> = json["payload"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn deserializes_from_wire_form() {
        let json = r#"{"type":"SET_USERS_FROM_SERVER","payload":[]}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ServerMessage::snapshot(vec![]));
    }
}
