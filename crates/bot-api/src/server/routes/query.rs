async fn get_points(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Json<QueryResponse> {
    let response = {
        let mut inner = state.inner.lock().await;
        let points = inner.api.current_points(&user_id);

        QueryResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            query_type: "user.points".to_string(),
            generated_at_sequence: inner.api.events().len() as u64,
            data: json!({ "user_id": user_id, "points": points }),
        }
    };

    Json(response)
}

async fn get_available_roles(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Json<QueryResponse> {
    let response = {
        let mut inner = state.inner.lock().await;
        let roles = inner.api.available_roles(&user_id);

        QueryResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            query_type: "user.available_roles".to_string(),
            generated_at_sequence: inner.api.events().len() as u64,
            data: json!({ "user_id": user_id, "roles": roles }),
        }
    };

    Json(response)
}

async fn get_all_roles(State(state): State<AppState>) -> Json<QueryResponse> {
    let response = {
        let inner = state.inner.lock().await;

        QueryResponse {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            query_type: "roles.all".to_string(),
            generated_at_sequence: inner.api.events().len() as u64,
            data: json!({ "tiers": inner.api.all_tiers() }),
        }
    };

    Json(response)
}

async fn get_ledger(State(state): State<AppState>) -> Json<LedgerSnapshot> {
    let snapshot = {
        let inner = state.inner.lock().await;
        inner.api.snapshot()
    };

    Json(snapshot)
}

#[derive(Debug, Deserialize, Default)]
struct PaginationQuery {
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EventPage {
    schema_version: String,
    cursor: usize,
    next_cursor: Option<usize>,
    total: usize,
    events: Vec<Event>,
}

async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<EventPage>, HttpApiError> {
    let page = {
        let inner = state.inner.lock().await;
        let events = inner.api.events();
        let (start, end, next_cursor) = paginate(events.len(), query.cursor, query.page_size)?;

        EventPage {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            cursor: start,
            next_cursor,
            total: events.len(),
            events: events[start..end].to_vec(),
        }
    };

    Ok(Json(page))
}
