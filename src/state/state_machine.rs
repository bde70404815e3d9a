use thiserror::Error;

/// High-level phases of the turn arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No session is running; both the initial and the between-sessions state.
    Idle,
    /// The engine is animating or playing the target sequence; input is ignored.
    Presenting,
    /// The participant is repeating the sequence.
    Collecting,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Start a new session, from idle or as a restart mid-session.
    StartSession,
    /// Playback of the target sequence finished; open the response window.
    PresentationFinished,
    /// The participant repeated the full sequence.
    RoundCompleted,
    /// The participant pressed the wrong element.
    Mistake,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Monotonic session counter. Delayed continuations capture the epoch they were
/// scheduled under and must not touch state once it has moved on.
pub type Epoch = u64;

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: GamePhase,
    /// Epoch of the current (or last) session.
    pub epoch: Epoch,
    /// Number of transitions applied so far.
    pub version: usize,
}

/// State machine implementing the present/collect round flow.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    epoch: Epoch,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            epoch: 0,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Epoch of the current session.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Whether `epoch` still designates the running session.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch == epoch
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            epoch: self.epoch,
            version: self.version,
        }
    }

    /// Apply `event`, returning the new phase. Starting a session bumps the epoch.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        if event == GameEvent::StartSession {
            self.epoch += 1;
        }
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (_, GameEvent::StartSession) => GamePhase::Presenting,
            (GamePhase::Presenting, GameEvent::PresentationFinished) => GamePhase::Collecting,
            (GamePhase::Collecting, GameEvent::RoundCompleted) => GamePhase::Presenting,
            (GamePhase::Collecting, GameEvent::Mistake) => GamePhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
