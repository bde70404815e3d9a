//! Side-effect ports injected into the engine: what the participant sees,
//! what they hear, and how time passes.

use std::{fmt, time::Duration};

use futures::future::BoxFuture;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    dto::score::ScoreRecord,
    state::session::{ElementId, Tone},
};

/// Visual state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Pressed / highlighted.
    Lit,
    /// Resting state.
    Dim,
}

/// Value shown in the score area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDisplay {
    /// Session just started; rendered as `00`.
    Empty,
    /// Completed rounds.
    Rounds(u32),
}

impl fmt::Display for ScoreDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("00"),
            Self::Rounds(rounds) => write!(f, "{rounds}"),
        }
    }
}

/// Origin of a line in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Local notice about the relay connection.
    System,
    /// Notice received from another participant.
    Player,
}

/// One line of the peer activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Who the line is about.
    pub kind: LogKind,
    /// Attribution shown before the message.
    pub from: String,
    /// Human readable text.
    pub message: String,
}

impl LogLine {
    /// Local notice attributed to the game itself.
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::System,
            from: "game".into(),
            message: message.into(),
        }
    }

    /// Notice attributed to participant `from`.
    pub fn player(from: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::Player,
            from: from.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.from, self.message)
    }
}

/// Everything the engine renders.
pub trait DisplayPort: Send + Sync {
    /// Show the participant display name.
    fn show_player_name(&self, name: &str);
    /// Update the score area.
    fn show_score(&self, score: ScoreDisplay);
    /// Change the visual state of one element.
    fn set_element(&self, id: &ElementId, highlight: Highlight);
    /// Add a line at the top of the activity log.
    fn prepend_log(&self, line: LogLine);
    /// Render the current high-score list.
    fn show_high_scores(&self, scores: &[ScoreRecord]);
}

/// Fire-and-forget tone output.
pub trait SoundPort: Send + Sync {
    /// Start playing `tone`; must not block.
    fn play(&self, tone: &Tone);
}

/// Source of delays and calendar dates.
pub trait Clock: Send + Sync {
    /// Resolve after `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
    /// Current calendar date used to stamp score records.
    fn today(&self) -> Date;
}

/// [`Clock`] backed by the tokio timer. Dates are taken at a fixed UTC offset,
/// normally the local one read before the runtime spawned its threads.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    offset: UtcOffset,
}

impl TokioClock {
    /// Clock stamping dates at `offset`.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::with_offset(UtcOffset::UTC)
    }
}

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }

    fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.offset).date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_score_renders_two_zeros() {
        assert_eq!(ScoreDisplay::Empty.to_string(), "00");
        assert_eq!(ScoreDisplay::Rounds(0).to_string(), "0");
        assert_eq!(ScoreDisplay::Rounds(12).to_string(), "12");
    }

    #[test]
    fn log_lines_prefix_the_attribution() {
        assert_eq!(LogLine::system("connected").to_string(), "game connected");
        assert_eq!(
            LogLine::player("Ada", "started a new game").to_string(),
            "Ada started a new game"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_sleeps_for_the_requested_duration() {
        let start = tokio::time::Instant::now();
        TokioClock::default().sleep(Duration::from_millis(600)).await;
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[test]
    fn tokio_clock_dates_follow_the_injected_offset() {
        let east = TokioClock::with_offset(UtcOffset::from_hms(14, 0, 0).unwrap());
        let west = TokioClock::with_offset(UtcOffset::from_hms(-12, 0, 0).unwrap());

        // 26 hours apart: never the same calendar day.
        assert!(east.today() > west.today());
        assert_eq!(TokioClock::default().today(), OffsetDateTime::now_utc().date());
    }
}
