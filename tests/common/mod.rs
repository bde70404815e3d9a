#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, post},
};
use futures::{SinkExt, StreamExt, future::BoxFuture};
use simon_engine::{
    dto::score::ScoreRecord,
    services::ports::{Clock, DisplayPort, Highlight, LogLine, ScoreDisplay, SoundPort},
    state::session::{ElementId, Tone},
};
use time::{Date, Month};
use tokio::{net::TcpListener, sync::broadcast};

/// How the fake score endpoint answers.
#[derive(Clone, Copy)]
pub enum ScoreMode {
    Healthy,
    Failing(StatusCode),
    Garbage,
}

#[derive(Clone)]
struct BackendState {
    mode: ScoreMode,
    scores: Arc<Mutex<Vec<ScoreRecord>>>,
    submitted: Arc<Mutex<Vec<ScoreRecord>>>,
    relay: broadcast::Sender<Message>,
}

/// In-process stand-in for the score service and the peer relay.
pub struct Backend {
    pub addr: SocketAddr,
    submitted: Arc<Mutex<Vec<ScoreRecord>>>,
}

impl Backend {
    pub async fn spawn(mode: ScoreMode, scores: Vec<ScoreRecord>) -> Self {
        let (relay, _) = broadcast::channel(64);
        let state = BackendState {
            mode,
            scores: Arc::new(Mutex::new(scores)),
            submitted: Arc::default(),
            relay,
        };
        let submitted = state.submitted.clone();

        let app = Router::new()
            .route("/api/score", post(submit_score))
            .route("/ws", any(relay_upgrade))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, submitted }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn relay_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn submitted(&self) -> Vec<ScoreRecord> {
        self.submitted.lock().unwrap().clone()
    }
}

async fn submit_score(
    State(state): State<BackendState>,
    Json(record): Json<ScoreRecord>,
) -> Response {
    state.submitted.lock().unwrap().push(record.clone());
    match state.mode {
        ScoreMode::Healthy => {
            let mut scores = state.scores.lock().unwrap();
            scores.push(record);
            scores.sort_by(|a, b| b.score.cmp(&a.score));
            scores.truncate(10);
            Json(scores.clone()).into_response()
        }
        ScoreMode::Failing(status) => status.into_response(),
        ScoreMode::Garbage => "definitely not json".into_response(),
    }
}

async fn relay_upgrade(ws: WebSocketUpgrade, State(state): State<BackendState>) -> Response {
    ws.on_upgrade(move |socket| serve_peer(socket, state.relay))
}

/// Forward every text or binary frame to every connected peer, sender included.
async fn serve_peer(socket: WebSocket, relay: broadcast::Sender<Message>) {
    let (mut sender, mut receiver) = socket.split();
    let mut inbound = relay.subscribe();

    let forward = tokio::spawn(async move {
        while let Ok(message) = inbound.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(_) | Message::Binary(_) => {
                let _ = relay.send(message);
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    forward.abort();
}

/// Display, sound and clock fake with a fast real-time clock.
#[derive(Clone, Default)]
pub struct Screen {
    lines: Arc<Mutex<Vec<String>>>,
    scores: Arc<Mutex<Vec<ScoreDisplay>>>,
    high_scores: Arc<Mutex<Vec<Vec<ScoreRecord>>>>,
    tones: Arc<Mutex<Vec<String>>>,
}

impl Screen {
    pub fn log_lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn scores(&self) -> Vec<ScoreDisplay> {
        self.scores.lock().unwrap().clone()
    }

    pub fn last_high_scores(&self) -> Option<Vec<ScoreRecord>> {
        self.high_scores.lock().unwrap().last().cloned()
    }

    pub fn tones(&self) -> Vec<String> {
        self.tones.lock().unwrap().clone()
    }
}

impl DisplayPort for Screen {
    fn show_player_name(&self, _name: &str) {}

    fn show_score(&self, score: ScoreDisplay) {
        self.scores.lock().unwrap().push(score);
    }

    fn set_element(&self, _id: &ElementId, _highlight: Highlight) {}

    fn prepend_log(&self, line: LogLine) {
        self.lines.lock().unwrap().insert(0, line.to_string());
    }

    fn show_high_scores(&self, scores: &[ScoreRecord]) {
        self.high_scores.lock().unwrap().push(scores.to_vec());
    }
}

impl SoundPort for Screen {
    fn play(&self, tone: &Tone) {
        self.tones.lock().unwrap().push(tone.as_str().to_string());
    }
}

impl Clock for Screen {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }

    fn today(&self) -> Date {
        Date::from_calendar_date(2026, Month::October, 14).unwrap()
    }
}

pub fn record(name: &str, score: u32) -> ScoreRecord {
    ScoreRecord {
        name: name.into(),
        score,
        date: "10/14/2026".into(),
    }
}

/// Poll `condition` every few milliseconds for up to two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
