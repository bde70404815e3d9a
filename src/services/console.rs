//! Terminal front-end: line-oriented display, silent sound port and the
//! stdin command grammar.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    dto::score::ScoreRecord,
    services::{
        activity_log::ActivityLog,
        ports::{DisplayPort, Highlight, LogLine, ScoreDisplay, SoundPort},
    },
    state::session::{ElementId, ElementRegistry, Tone},
};

/// [`DisplayPort`] writing one line per visible change to stdout. Every new
/// activity line reprints the activity log, newest first.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    activity: ActivityLog,
}

impl ConsoleDisplay {
    fn activity_text(&self) -> String {
        let mut text = String::from("activity:");
        for line in self.activity.lines() {
            text.push_str(&format!("\n  * {line}"));
        }
        text
    }

    fn line(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{text}") {
            warn!(error = %err, "failed to write to terminal");
        }
    }
}

impl DisplayPort for ConsoleDisplay {
    fn show_player_name(&self, name: &str) {
        self.line(&format!("player: {name}"));
    }

    fn show_score(&self, score: ScoreDisplay) {
        self.line(&format!("score: {score}"));
    }

    fn set_element(&self, id: &ElementId, highlight: Highlight) {
        if highlight == Highlight::Lit {
            self.line(&format!("  [{id}]"));
        }
    }

    fn prepend_log(&self, line: LogLine) {
        self.activity.prepend(line);
        self.line(&self.activity_text());
    }

    fn show_high_scores(&self, scores: &[ScoreRecord]) {
        if scores.is_empty() {
            self.line("high scores: none yet");
            return;
        }
        let mut table = String::from("high scores:");
        for (rank, record) in scores.iter().enumerate() {
            table.push_str(&format!(
                "\n  {:>2}. {:<20} {:>4}  {}",
                rank + 1,
                record.name,
                record.score,
                record.date
            ));
        }
        self.line(&table);
    }
}

/// [`SoundPort`] for terminals without audio: tones are only traced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSound;

impl SoundPort for ConsoleSound {
    fn play(&self, tone: &Tone) {
        debug!(tone = tone.as_str(), "play tone");
    }
}

/// One line typed by the participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start (or restart) a session.
    Start,
    /// Activate an element.
    Press(ElementId),
    /// Change the display name.
    Name(String),
    /// Print the high-score list.
    Scores,
    /// Print the command summary.
    Help,
    /// Leave the program.
    Quit,
}

/// Rejected command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The line matches no command nor element.
    #[error("unknown command `{0}` (type `help`)")]
    Unknown(String),
    /// `name` was given without a value.
    #[error("usage: name <text>")]
    MissingName,
}

/// Parse a line. Elements are addressed by their id or by their 1-based
/// position in the registry. Blank lines yield `Ok(None)`.
pub fn parse_command(
    line: &str,
    registry: &ElementRegistry,
) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "start" | "s" => Command::Start,
        "scores" => Command::Scores,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "name" if rest.is_empty() => return Err(CommandError::MissingName),
        "name" => Command::Name(rest.to_string()),
        _ => return resolve_element(line, registry).map(|id| Some(Command::Press(id))),
    };
    Ok(Some(command))
}

/// Human readable command summary for `registry`.
pub fn help_text(registry: &ElementRegistry) -> String {
    let elements: Vec<String> = registry
        .iter()
        .enumerate()
        .map(|(index, element)| format!("{}={}", index + 1, element.id))
        .collect();
    format!(
        "commands: start | <element> ({}) | name <text> | scores | quit",
        elements.join(" ")
    )
}

fn resolve_element(token: &str, registry: &ElementRegistry) -> Result<ElementId, CommandError> {
    if let Ok(position) = token.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|index| registry.get_index(index))
            .map(|element| element.id.clone())
            .ok_or_else(|| CommandError::Unknown(token.to_string()));
    }

    let id = ElementId::from(token);
    registry
        .get(&id)
        .map(|element| element.id.clone())
        .ok_or_else(|| CommandError::Unknown(token.to_string()))
}
