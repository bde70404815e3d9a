/// Elements, registry and the active session.
pub mod session;
/// Phase machine with session epochs.
pub mod state_machine;

use tokio::sync::watch;

use self::{
    session::Session,
    state_machine::{Epoch, GameEvent, GamePhase, GameStateMachine, InvalidTransition, Snapshot},
};

/// Everything the turn arbiter mutates, kept behind a single lock.
///
/// The lock guarding this value is only ever held for short synchronous
/// sections and never across a playback delay or a network call.
#[derive(Debug)]
pub struct EngineState {
    machine: GameStateMachine,
    session: Session,
}

impl EngineState {
    /// Idle state with an empty session for `player_name`.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            machine: GameStateMachine::new(),
            session: Session::new(player_name),
        }
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Snapshot of the state machine.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Whether `epoch` still designates the running session.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.machine.is_current(epoch)
    }

    /// Borrow the active session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutably borrow the active session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Throw away the current session and start a new epoch for `player_name`.
    pub fn begin_session(&mut self, player_name: String) -> Result<Epoch, InvalidTransition> {
        self.machine.apply(GameEvent::StartSession)?;
        self.session = Session::new(player_name);
        Ok(self.machine.epoch())
    }

    /// Clear the finished session, keeping the participant name.
    pub fn end_session(&mut self) {
        let player_name = self.session.player_name().to_string();
        self.session = Session::new(player_name);
    }

    /// Apply a non-start event to the state machine.
    pub fn transition(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        self.machine.apply(event)
    }

    /// True when participant input must be evaluated right now.
    pub fn accepts_input(&self) -> bool {
        self.machine.phase() == GamePhase::Collecting && self.session.is_accepting()
    }
}

/// Handle held by delayed work scheduled for one session.
///
/// The engine publishes every new epoch on a watch channel; the guard compares
/// it with the epoch captured when the work was scheduled.
#[derive(Debug, Clone)]
pub struct EpochGuard {
    current: watch::Receiver<Epoch>,
    epoch: Epoch,
}

impl EpochGuard {
    /// Guard for work scheduled under `epoch`.
    pub fn new(current: watch::Receiver<Epoch>, epoch: Epoch) -> Self {
        Self { current, epoch }
    }

    /// Epoch the guarded work belongs to.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// False once a newer session has started.
    pub fn is_current(&self) -> bool {
        *self.current.borrow() == self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::ElementId;

    #[test]
    fn begin_session_resets_previous_data() {
        let mut state = EngineState::new("Ada");
        let first = state.begin_session("Ada".into()).unwrap();
        state.session_mut().push(ElementId::from("red"));
        state.transition(GameEvent::PresentationFinished).unwrap();
        state.session_mut().set_accepting(true);
        assert!(state.accepts_input());

        let second = state.begin_session("Grace".into()).unwrap();
        assert!(second > first);
        assert!(state.session().sequence().is_empty());
        assert_eq!(state.session().player_name(), "Grace");
        assert!(!state.accepts_input());
        assert_eq!(state.phase(), GamePhase::Presenting);
    }

    #[test]
    fn accepting_flag_alone_does_not_open_input_outside_collecting() {
        let mut state = EngineState::new("Ada");
        state.session_mut().set_accepting(true);
        assert!(!state.accepts_input());
    }

    #[test]
    fn guard_goes_stale_when_a_new_epoch_is_published() {
        let (tx, rx) = watch::channel(1);
        let guard = EpochGuard::new(rx, 1);
        assert!(guard.is_current());
        tx.send_replace(2);
        assert!(!guard.is_current());
        assert_eq!(guard.epoch(), 1);
    }
}
