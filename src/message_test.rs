use super::*;
use crate::state::test_helpers;
use serde_json::json;

#[test]
fn parse_join_reads_camel_case_ids() {
    let msg = ClientMessage::parse(r#"{"type":"join","boardId":4,"userId":9}"#).unwrap();
    assert_eq!(msg, ClientMessage::Join { board_id: 4, user_id: 9 });
}

#[test]
fn parse_join_rejects_snake_case_ids() {
    let err = ClientMessage::parse(r#"{"type":"join","board_id":4,"user_id":9}"#).unwrap_err();
    assert_eq!(err.error_code(), "E_MALFORMED");
}

#[test]
fn parse_drawing_carries_event() {
    let event = test_helpers::stroke(2, "layer-1", &[(10.0, 10.0), (20.0, 25.0)]);
    let text = json!({ "type": "drawing", "event": event }).to_string();
    let msg = ClientMessage::parse(&text).unwrap();
    assert_eq!(msg, ClientMessage::Drawing { event });
}

#[test]
fn parse_drawing_validates_event() {
    let event = test_helpers::stroke(2, "layer-1", &[]);
    let text = json!({ "type": "drawing", "event": event }).to_string();
    let err = ClientMessage::parse(&text).unwrap_err();
    assert!(matches!(err, MessageError::InvalidEvent(_)));
    assert_eq!(err.error_code(), "E_EMPTY_POINTS");
}

#[test]
fn parse_rejects_unknown_type() {
    let err = ClientMessage::parse(r#"{"type":"cursor","x":1}"#).unwrap_err();
    assert!(matches!(err, MessageError::Malformed(_)));
}

#[test]
fn parse_rejects_invalid_json() {
    assert!(ClientMessage::parse("not json").is_err());
    assert!(ClientMessage::parse("").is_err());
}

#[test]
fn user_joined_serializes_to_wire_shape() {
    let msg = ServerMessage::UserJoined { user_id: 3, active_sessions: 2 };
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value, json!({ "type": "user_joined", "userId": 3, "activeSessions": 2 }));
}

#[test]
fn user_left_serializes_to_wire_shape() {
    let msg = ServerMessage::UserLeft { user_id: 3, active_sessions: 0 };
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value, json!({ "type": "user_left", "userId": 3, "activeSessions": 0 }));
}

#[test]
fn drawing_serializes_with_nested_event() {
    let event = test_helpers::clear(5, "all");
    let msg = ServerMessage::Drawing { event };
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value["type"], "drawing");
    assert_eq!(value["event"]["type"], "clear");
    assert_eq!(value["event"]["layerId"], "all");
}
