#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<ServerInner>>,
    stream_tx: broadcast::Sender<StreamMessage>,
}

impl AppState {
    fn new(api: BotApi) -> Self {
        let (stream_tx, _) = broadcast::channel(4096);
        Self {
            inner: Arc::new(Mutex::new(ServerInner {
                api,
                emitted_event_count: 0,
            })),
            stream_tx,
        }
    }
}

struct ServerInner {
    api: BotApi,
    emitted_event_count: usize,
}

fn collect_delta_messages(inner: &mut ServerInner) -> Vec<StreamMessage> {
    let mut messages = Vec::new();

    let events = inner.api.events();
    for event in &events[inner.emitted_event_count..] {
        messages.push(StreamMessage::event_appended(event));
    }
    inner.emitted_event_count = events.len();

    messages
}

fn broadcast_messages(state: &AppState, messages: Vec<StreamMessage>) {
    for message in messages {
        let _ = state.stream_tx.send(message);
    }
}
