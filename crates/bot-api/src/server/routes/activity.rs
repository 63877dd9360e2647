async fn submit_activity(
    State(state): State<AppState>,
    Json(event): Json<ActivityEvent>,
) -> Result<Json<Accrual>, HttpApiError> {
    let (accrual, messages) = {
        let mut inner = state.inner.lock().await;
        let accrual = inner
            .api
            .record_activity(&event)
            .map_err(HttpApiError::bad_request)?;

        let mut messages = Vec::new();
        for notice in &accrual.milestones {
            messages.push(StreamMessage::milestone(notice));
        }
        messages.extend(collect_delta_messages(&mut inner));

        (accrual, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(accrual))
}
