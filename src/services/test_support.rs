//! Recording fakes shared by the service unit tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::{self, BoxFuture};
use reqwest::StatusCode;
use time::{Date, Month};

use crate::{
    dao::score_api::{ScoreApi, ScoreApiError, ScoreApiResult},
    dto::{peer::PeerEvent, score::ScoreRecord},
    services::{
        activity_log::ActivityLog,
        peer_channel::PeerBroadcast,
        ports::{Clock, DisplayPort, Highlight, LogLine, ScoreDisplay, SoundPort},
    },
    state::session::{Element, ElementId, ElementRegistry, Tone},
};

/// Observable side effect, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Name(String),
    Score(ScoreDisplay),
    Lit(String),
    Dim(String),
    Tone(String),
    Sleep(Duration),
    HighScores(Vec<ScoreRecord>),
}

/// Display, sound and clock fake writing into one ordered log. Sleeps go
/// through the tokio timer so paused-time tests can interleave sessions.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    activity: Arc<ActivityLog>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn lit(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Lit(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn tones(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Tone(tone) => Some(tone),
                _ => None,
            })
            .collect()
    }

    /// Activity log as displayed, most recent first.
    pub fn logs(&self) -> Vec<String> {
        self.activity
            .lines()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Largest number of elements that were lit at the same moment.
    pub fn max_lit_at_once(&self) -> usize {
        let mut lit = HashSet::new();
        let mut max = 0;
        for event in self.events() {
            match event {
                Event::Lit(id) => {
                    lit.insert(id);
                }
                Event::Dim(id) => {
                    lit.remove(&id);
                }
                _ => continue,
            }
            max = max.max(lit.len());
        }
        max
    }

    pub fn scores(&self) -> Vec<ScoreDisplay> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Score(score) => Some(score),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplayPort for Recorder {
    fn show_player_name(&self, name: &str) {
        self.push(Event::Name(name.to_string()));
    }

    fn show_score(&self, score: ScoreDisplay) {
        self.push(Event::Score(score));
    }

    fn set_element(&self, id: &ElementId, highlight: Highlight) {
        let id = id.to_string();
        self.push(match highlight {
            Highlight::Lit => Event::Lit(id),
            Highlight::Dim => Event::Dim(id),
        });
    }

    fn prepend_log(&self, line: LogLine) {
        self.activity.prepend(line);
    }

    fn show_high_scores(&self, scores: &[ScoreRecord]) {
        self.push(Event::HighScores(scores.to_vec()));
    }
}

impl SoundPort for Recorder {
    fn play(&self, tone: &Tone) {
        self.push(Event::Tone(tone.as_str().to_string()));
    }
}

impl Clock for Recorder {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.push(Event::Sleep(duration));
        Box::pin(tokio::time::sleep(duration))
    }

    fn today(&self) -> Date {
        Date::from_calendar_date(2026, Month::October, 14).unwrap()
    }
}

/// Scripted remote score service.
#[derive(Clone)]
pub enum Reply {
    Scores(Vec<ScoreRecord>),
    Unavailable,
    Hang,
}

#[derive(Clone)]
pub struct FakeScoreApi {
    reply: Arc<Mutex<Reply>>,
    submitted: Arc<Mutex<Vec<ScoreRecord>>>,
}

impl FakeScoreApi {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply)),
            submitted: Arc::default(),
        }
    }

    pub fn submitted(&self) -> Vec<ScoreRecord> {
        self.submitted.lock().unwrap().clone()
    }
}

impl ScoreApi for FakeScoreApi {
    fn submit(&self, record: ScoreRecord) -> BoxFuture<'static, ScoreApiResult<Vec<ScoreRecord>>> {
        self.submitted.lock().unwrap().push(record);
        match self.reply.lock().unwrap().clone() {
            Reply::Scores(scores) => Box::pin(future::ready(Ok(scores))),
            Reply::Unavailable => Box::pin(future::ready(Err(ScoreApiError::RequestStatus {
                url: "http://fake/api/score".into(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            }))),
            Reply::Hang => Box::pin(future::pending()),
        }
    }
}

/// Broadcaster remembering what was published.
#[derive(Clone, Default)]
pub struct RecordingBroadcast {
    sent: Arc<Mutex<Vec<PeerEvent>>>,
}

impl RecordingBroadcast {
    pub fn sent(&self) -> Vec<PeerEvent> {
        self.sent.lock().unwrap().clone()
    }
}

impl PeerBroadcast for RecordingBroadcast {
    fn broadcast(&self, event: PeerEvent) {
        self.sent.lock().unwrap().push(event);
    }
}

pub fn record(name: &str, score: u32) -> ScoreRecord {
    ScoreRecord {
        name: name.into(),
        score,
        date: "10/14/2026".into(),
    }
}

pub fn four_buttons() -> ElementRegistry {
    ElementRegistry::new(
        [
            ("green", "sound1.mp3"),
            ("red", "sound2.mp3"),
            ("yellow", "sound3.mp3"),
            ("blue", "sound4.mp3"),
        ]
        .into_iter()
        .map(|(id, tone)| Element::new(id, Tone::new(tone))),
    )
}
