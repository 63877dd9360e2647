// Reason-coded command failures still reply with HTTP 200; only malformed
// requests are rejected at the transport layer.
async fn submit_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Json<CommandReply> {
    let (reply, messages) = {
        let mut inner = state.inner.lock().await;
        let reply = inner.api.handle_command(command);

        let mut messages = vec![StreamMessage::command_reply(&reply)];
        messages.extend(collect_delta_messages(&mut inner));

        (reply, messages)
    };

    broadcast_messages(&state, messages);

    Json(reply)
}
