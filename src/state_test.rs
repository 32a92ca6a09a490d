use super::*;

#[test]
fn board_room_new_is_empty() {
    let room = BoardRoom::new();
    assert!(room.clients.is_empty());
}

#[tokio::test]
async fn app_state_starts_with_no_rooms() {
    let state = test_helpers::test_app_state();
    assert!(state.rooms.read().await.is_empty());
    assert_eq!(state.config.default_owner_id, 1);
}

#[tokio::test]
async fn cloned_state_shares_registry() {
    let state = test_helpers::test_app_state();
    let clone = state.clone();
    let (_client, _rx) = test_helpers::register_client(&state, 3, 1).await;
    assert!(clone.rooms.read().await.contains_key(&3));
}

#[tokio::test]
async fn cloned_state_shares_store() {
    let state = test_helpers::test_app_state();
    let clone = state.clone();
    let board = test_helpers::seed_board(&state, "shared").await;
    assert!(clone.store.get_board(board.id).await.unwrap().is_some());
}
