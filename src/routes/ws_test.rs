use super::*;
use crate::state::test_helpers::{self, clear, stroke};
use crate::surface::Surface;
use tokio::time::{Duration, timeout};

struct TestClient {
    id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
    rx: mpsc::Receiver<ServerMessage>,
    presence: Option<Presence>,
}

impl TestClient {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self { id: Uuid::new_v4(), tx, rx, presence: None }
    }

    async fn send(&mut self, state: &AppState, text: &str) {
        process_inbound_text(state, &mut self.presence, self.id, &self.tx, text).await;
    }

    async fn join(&mut self, state: &AppState, board_id: i64, user_id: i64) {
        self.send(state, &join_json(board_id, user_id)).await;
    }

    async fn draw(&mut self, state: &AppState, event: &DrawingEvent) {
        self.send(state, &drawing_json(event)).await;
    }

    async fn expect_message(&mut self) -> ServerMessage {
        timeout(Duration::from_millis(200), self.rx.recv())
            .await
            .expect("message receive timed out")
            .expect("channel closed")
    }

    async fn expect_silence(&mut self) {
        assert!(
            timeout(Duration::from_millis(80), self.rx.recv()).await.is_err(),
            "expected channel to remain empty"
        );
    }
}

fn join_json(board_id: i64, user_id: i64) -> String {
    serde_json::json!({ "type": "join", "boardId": board_id, "userId": user_id }).to_string()
}

fn drawing_json(event: &DrawingEvent) -> String {
    serde_json::json!({ "type": "drawing", "event": event }).to_string()
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

#[tokio::test]
async fn join_announces_to_every_member_including_joiner() {
    let state = test_helpers::test_app_state();
    let mut a = TestClient::new();
    let mut b = TestClient::new();

    a.join(&state, 1, 10).await;
    assert_eq!(a.expect_message().await, ServerMessage::UserJoined { user_id: 10, active_sessions: 1 });

    b.join(&state, 1, 11).await;
    let joined = ServerMessage::UserJoined { user_id: 11, active_sessions: 2 };
    assert_eq!(a.expect_message().await, joined);
    assert_eq!(b.expect_message().await, joined);
    assert_eq!(b.presence.map(|p| p.board_id), Some(1));
}

#[tokio::test]
async fn leave_reports_decremented_count_to_remaining_members() {
    let state = test_helpers::test_app_state();
    let mut a = TestClient::new();
    let mut b = TestClient::new();
    a.join(&state, 1, 10).await;
    b.join(&state, 1, 11).await;
    a.expect_message().await;
    a.expect_message().await;
    b.expect_message().await;

    let presence = a.presence.expect("a joined");
    leave_board(&state, presence, a.id).await;

    assert_eq!(b.expect_message().await, ServerMessage::UserLeft { user_id: 10, active_sessions: 1 });
    a.expect_silence().await;
    assert_eq!(services::board::active_session_count(&state, 1).await.unwrap(), 1);
}

#[tokio::test]
async fn last_member_leaving_broadcasts_nothing() {
    let state = test_helpers::test_app_state();
    let mut a = TestClient::new();
    a.join(&state, 1, 10).await;
    a.expect_message().await;

    leave_board(&state, a.presence.expect("joined"), a.id).await;

    a.expect_silence().await;
    assert!(state.rooms.read().await.is_empty());
    assert_eq!(services::board::active_session_count(&state, 1).await.unwrap(), 0);
}

#[tokio::test]
async fn rejoining_elsewhere_leaves_previous_board() {
    let state = test_helpers::test_app_state();
    let mut a = TestClient::new();
    let mut b = TestClient::new();
    a.join(&state, 1, 10).await;
    b.join(&state, 1, 11).await;
    a.expect_message().await;
    a.expect_message().await;
    b.expect_message().await;

    a.join(&state, 2, 10).await;

    assert_eq!(b.expect_message().await, ServerMessage::UserLeft { user_id: 10, active_sessions: 1 });
    assert_eq!(a.expect_message().await, ServerMessage::UserJoined { user_id: 10, active_sessions: 1 });
    assert_eq!(a.presence.map(|p| p.board_id), Some(2));
    assert_eq!(services::board::active_session_count(&state, 1).await.unwrap(), 1);
}

// =============================================================================
// DRAWING RELAY
// =============================================================================

#[tokio::test]
async fn drawing_reaches_same_board_peers_only() {
    let state = test_helpers::test_app_state();
    let mut a = TestClient::new();
    let mut b = TestClient::new();
    let mut c = TestClient::new();
    a.join(&state, 1, 10).await;
    b.join(&state, 1, 11).await;
    c.join(&state, 2, 12).await;
    a.expect_message().await;
    a.expect_message().await;
    b.expect_message().await;
    c.expect_message().await;

    let event = stroke(10, "layer-1", &[(1.0, 2.0), (3.0, 4.0)]);
    a.draw(&state, &event).await;

    assert_eq!(b.expect_message().await, ServerMessage::Drawing { event });
    a.expect_silence().await;
    c.expect_silence().await;
}

#[tokio::test]
async fn drawings_are_appended_in_order() {
    let state = test_helpers::test_app_state();
    let board = test_helpers::seed_board(&state, "log").await;
    let mut a = TestClient::new();
    a.join(&state, board.id, 10).await;

    let first = stroke(10, "layer-1", &[(0.0, 0.0)]);
    let second = stroke(10, "layer-2", &[(5.0, 5.0)]);
    a.draw(&state, &first).await;
    a.draw(&state, &second).await;

    let stored = state.store.get_board(board.id).await.unwrap().unwrap();
    assert_eq!(stored.data.events, vec![first, second]);
}

#[tokio::test]
async fn clear_is_logged_and_empties_surface() {
    let state = test_helpers::test_app_state();
    let board = test_helpers::seed_board(&state, "wipe").await;
    let mut a = TestClient::new();
    let mut b = TestClient::new();
    a.join(&state, board.id, 10).await;
    b.join(&state, board.id, 11).await;

    a.draw(&state, &stroke(10, "layer-1", &[(1.0, 1.0)])).await;
    let wipe = clear(10, "all");
    a.draw(&state, &wipe).await;

    let stored = state.store.get_board(board.id).await.unwrap().unwrap();
    assert_eq!(stored.data.events.len(), 2);
    assert_eq!(stored.data.events[1], wipe);
    assert!(Surface::replay(&stored.data.events).strokes.is_empty());

    b.expect_message().await;
    b.expect_message().await;
    assert_eq!(b.expect_message().await, ServerMessage::Drawing { event: wipe });
}

#[tokio::test]
async fn drawing_before_join_is_dropped() {
    let state = test_helpers::test_app_state();
    let board = test_helpers::seed_board(&state, "quiet").await;
    let mut watcher = TestClient::new();
    watcher.join(&state, board.id, 11).await;
    watcher.expect_message().await;

    let mut stranger = TestClient::new();
    stranger.draw(&state, &stroke(10, "layer-1", &[(1.0, 1.0)])).await;

    watcher.expect_silence().await;
    assert!(stranger.presence.is_none());
    let stored = state.store.get_board(board.id).await.unwrap().unwrap();
    assert!(stored.data.events.is_empty());
}

#[tokio::test]
async fn drawing_on_unstored_board_is_still_relayed() {
    let state = test_helpers::test_app_state();
    let mut a = TestClient::new();
    let mut b = TestClient::new();
    a.join(&state, 404, 10).await;
    b.join(&state, 404, 11).await;
    a.expect_message().await;
    a.expect_message().await;
    b.expect_message().await;

    let event = stroke(10, "layer-1", &[(1.0, 1.0)]);
    a.draw(&state, &event).await;

    assert_eq!(b.expect_message().await, ServerMessage::Drawing { event });
}

#[tokio::test]
async fn malformed_messages_are_dropped() {
    let state = test_helpers::test_app_state();
    let board = test_helpers::seed_board(&state, "noise").await;
    let mut a = TestClient::new();
    let mut b = TestClient::new();
    a.join(&state, board.id, 10).await;
    b.join(&state, board.id, 11).await;
    a.expect_message().await;
    a.expect_message().await;
    b.expect_message().await;

    a.send(&state, "not json").await;
    a.send(&state, r#"{"type":"cursor","x":1}"#).await;
    a.send(&state, r#"{"type":"join","boardId":"seven"}"#).await;
    a.draw(&state, &stroke(10, "layer-1", &[])).await;

    b.expect_silence().await;
    a.expect_silence().await;
    assert_eq!(a.presence.map(|p| p.board_id), Some(board.id));
    let stored = state.store.get_board(board.id).await.unwrap().unwrap();
    assert!(stored.data.events.is_empty());
}

// =============================================================================
// END TO END
// =============================================================================

mod end_to_end {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    async fn serve(state: AppState) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, crate::routes::app(state)).await.unwrap();
        });
        addr
    }

    async fn connect(addr: std::net::SocketAddr) -> Client {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("websocket connect");
        ws
    }

    async fn next_json(ws: &mut Client) -> serde_json::Value {
        loop {
            let msg = timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("receive timed out")
                .expect("stream ended")
                .expect("websocket error");
            if let WsMessage::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("server sends JSON");
            }
        }
    }

    #[tokio::test]
    async fn two_clients_share_a_board_over_the_socket() {
        let state = test_helpers::test_app_state();
        let board = test_helpers::seed_board(&state, "live").await;
        let addr = serve(state.clone()).await;

        let mut a = connect(addr).await;
        a.send(WsMessage::text(join_json(board.id, 10))).await.unwrap();
        let joined = next_json(&mut a).await;
        assert_eq!(joined, serde_json::json!({ "type": "user_joined", "userId": 10, "activeSessions": 1 }));

        let mut b = connect(addr).await;
        b.send(WsMessage::text(join_json(board.id, 11))).await.unwrap();
        assert_eq!(next_json(&mut a).await["activeSessions"], 2);
        assert_eq!(next_json(&mut b).await["userId"], 11);

        let event = stroke(10, "layer-1", &[(4.0, 2.0)]);
        a.send(WsMessage::text(drawing_json(&event))).await.unwrap();
        let relayed = next_json(&mut b).await;
        assert_eq!(relayed["type"], "drawing");
        assert_eq!(relayed["event"]["layerId"], "layer-1");
        assert_eq!(relayed["event"]["points"][0]["x"], 4.0);

        a.close(None).await.unwrap();
        let left = next_json(&mut b).await;
        assert_eq!(left, serde_json::json!({ "type": "user_left", "userId": 10, "activeSessions": 1 }));

        let stored = state.store.get_board(board.id).await.unwrap().unwrap();
        assert_eq!(stored.data.events, vec![event]);
    }
}
