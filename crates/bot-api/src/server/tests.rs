use super::*;

fn test_state() -> AppState {
    AppState::new(BotApi::from_config(BotConfig::default()).expect("stock config is valid"))
}

#[test]
fn pagination_enforces_max_bounds() {
    let (start, end, next_cursor) = paginate(100, Some(10), Some(20)).expect("page should work");
    assert_eq!(start, 10);
    assert_eq!(end, 30);
    assert_eq!(next_cursor, Some(30));

    let out_of_range = paginate(5, Some(10), Some(1));
    assert!(out_of_range.is_err());
}

#[tokio::test]
async fn command_route_always_produces_a_reply() {
    let state = test_state();
    let command = Command::new(
        "cmd_1",
        "user_a",
        9_000,
        contracts::CommandType::QueryPoints,
        contracts::CommandPayload::QueryPoints,
    );

    let Json(reply) = submit_command(State(state), Json(command)).await;
    assert_eq!(reply.text, "You have **0 points**.");
    assert!(reply.error.is_none());
}

#[tokio::test]
async fn activity_route_broadcasts_milestone_notices() {
    let state = test_state();
    let mut rx = state.stream_tx.subscribe();

    for offset in 0..10 {
        let event = ActivityEvent::new("user_a", "chan_general", 1_000 + offset);
        let Json(accrual) = submit_activity(State(state.clone()), Json(event))
            .await
            .expect("activity accepted");
        assert!(accrual.counted);
    }

    let mut saw_milestone = false;
    while let Ok(message) = rx.try_recv() {
        if message.message_type == "notice.milestone" {
            saw_milestone = true;
        }
    }
    assert!(saw_milestone, "crossing Well-Known should broadcast a notice");
}
