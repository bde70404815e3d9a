//! Turn arbiter: owns the session, drives playback and judges every input.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::{
    config::{AppConfig, TimingConfig},
    dao::{
        profile::{load_player_name, save_player_name},
        score_api::ScoreApi,
        score_cache::LocalScoreCache,
        storage::KeyValueStore,
    },
    dto::{peer::PeerEvent, score::ScoreRecord, validation::validate_player_name},
    error::EngineError,
    services::{
        peer_channel::PeerBroadcast,
        playback::Playback,
        ports::{Clock, DisplayPort, ScoreDisplay, SoundPort},
        score_gateway::ScoreGateway,
        sequence::SequenceGenerator,
    },
    state::{
        EngineState, EpochGuard,
        session::{Element, ElementId, ElementRegistry, InputVerdict, Tone},
        state_machine::{Epoch, GameEvent, Snapshot},
    },
};

/// Collaborators injected into [`GameEngine`].
pub struct EnginePorts {
    /// What the participant sees.
    pub display: Arc<dyn DisplayPort>,
    /// What the participant hears.
    pub sound: Arc<dyn SoundPort>,
    /// Delays and dates.
    pub clock: Arc<dyn Clock>,
    /// Durable `"scores"` and `"userName"` slots.
    pub store: Arc<dyn KeyValueStore>,
    /// Remote score service.
    pub score_api: Arc<dyn ScoreApi>,
    /// Outbound side of the relay connection.
    pub peers: Arc<dyn PeerBroadcast>,
    /// Source of new sequence elements.
    pub generator: Arc<dyn SequenceGenerator>,
}

/// Result of [`GameEngine::submit_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Input arrived outside the accepting window and was not evaluated.
    Ignored,
    /// A newer session started while the press animation played.
    Superseded,
    /// Correct element; the round continues.
    Accepted,
    /// Correct element completing the round; the longer sequence was presented.
    RoundCompleted {
        /// Completed rounds now shown on the score display.
        score: u32,
    },
    /// Wrong element; the session is over and its record was submitted.
    SessionEnded {
        /// Final score of the session.
        score: u32,
    },
}

/// The game session engine.
///
/// All mutable state sits behind one mutex that is released before every
/// playback delay and network call. Work resumed after a delay re-checks the
/// epoch it was scheduled under and stops once a newer session has started.
pub struct GameEngine {
    state: Mutex<EngineState>,
    epoch_tx: watch::Sender<Epoch>,
    registry: ElementRegistry,
    mistake_tone: Tone,
    timing: TimingConfig,
    playback: Playback,
    gateway: ScoreGateway,
    display: Arc<dyn DisplayPort>,
    sound: Arc<dyn SoundPort>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    peers: Arc<dyn PeerBroadcast>,
    generator: Arc<dyn SequenceGenerator>,
}

impl GameEngine {
    /// Build an idle engine and show the stored participant name.
    pub fn new(
        registry: ElementRegistry,
        mistake_tone: Tone,
        timing: TimingConfig,
        ports: EnginePorts,
    ) -> Result<Self, EngineError> {
        if registry.is_empty() {
            return Err(EngineError::NoElements);
        }

        let EnginePorts {
            display,
            sound,
            clock,
            store,
            score_api,
            peers,
            generator,
        } = ports;

        let playback = Playback::new(
            display.clone(),
            sound.clone(),
            clock.clone(),
            timing.clone(),
        );
        let gateway = ScoreGateway::new(
            score_api,
            LocalScoreCache::new(store.clone()),
            timing.submit_timeout,
        );

        let player_name = load_player_name(store.as_ref());
        display.show_player_name(&player_name);
        display.show_high_scores(&gateway.high_scores());

        let (epoch_tx, _) = watch::channel(0);

        Ok(Self {
            state: Mutex::new(EngineState::new(player_name)),
            epoch_tx,
            registry,
            mistake_tone,
            timing,
            playback,
            gateway,
            display,
            sound,
            clock,
            store,
            peers,
            generator,
        })
    }

    /// Build an engine from the application configuration.
    pub fn from_config(config: &AppConfig, ports: EnginePorts) -> Result<Self, EngineError> {
        Self::new(
            config.registry(),
            config.mistake_tone(),
            config.timing.clone(),
            ports,
        )
    }

    /// Start a session, restarting the running one if any.
    ///
    /// Resolves once the first presentation finished and input is accepted,
    /// or early when yet another session superseded this one.
    pub async fn start_session(&self) -> Result<(), EngineError> {
        let player_name = load_player_name(self.store.as_ref());
        let epoch = {
            let mut state = self.state.lock().await;
            let epoch = state.begin_session(player_name.clone())?;
            self.epoch_tx.send_replace(epoch);
            epoch
        };
        let guard = self.guard(epoch);
        info!(epoch, player = %player_name, "session started");

        self.display.show_score(ScoreDisplay::Empty);
        if !self
            .playback
            .dance(&self.registry, self.timing.start_laps, &guard)
            .await
            .is_completed()
        {
            return Ok(());
        }

        let elements = {
            let mut state = self.state.lock().await;
            if !state.is_current(epoch) {
                return Ok(());
            }
            self.extend_sequence(&mut state)?
        };

        if !self
            .playback
            .present(self.timing.start_lead_in, &elements, &guard)
            .await
            .is_completed()
        {
            return Ok(());
        }

        if !self.open_input(epoch).await? {
            return Ok(());
        }

        self.peers.broadcast(PeerEvent::SessionStarted { from: player_name });
        Ok(())
    }

    /// Evaluate one participant activation.
    ///
    /// Outside the accepting window the activation is a no-op. Otherwise the
    /// press animation plays with input closed before the element is judged.
    pub async fn submit_input(&self, id: &ElementId) -> Result<InputOutcome, EngineError> {
        let element = self.element(id)?.clone();

        let epoch = {
            let mut state = self.state.lock().await;
            if !state.accepts_input() {
                debug!(element = %id, phase = ?state.phase(), "input ignored");
                return Ok(InputOutcome::Ignored);
            }
            state.session_mut().set_accepting(false);
            state.snapshot().epoch
        };
        let guard = self.guard(epoch);

        self.playback.present_press(&element).await;

        let mut state = self.state.lock().await;
        if !state.is_current(epoch) {
            return Ok(InputOutcome::Superseded);
        }

        match state.session_mut().check(id) {
            InputVerdict::Advance => {
                state.session_mut().set_accepting(true);
                Ok(InputOutcome::Accepted)
            }
            InputVerdict::RoundComplete => {
                state.transition(GameEvent::RoundCompleted)?;
                let elements = self.extend_sequence(&mut state)?;
                let score = state.session().completed_rounds();
                drop(state);

                info!(epoch, score, "round completed");
                self.display.show_score(ScoreDisplay::Rounds(score));

                if self
                    .playback
                    .present(self.timing.round_lead_in, &elements, &guard)
                    .await
                    .is_completed()
                {
                    self.open_input(epoch).await?;
                }
                Ok(InputOutcome::RoundCompleted { score })
            }
            InputVerdict::Mistake { score } => {
                state.transition(GameEvent::Mistake)?;
                let player_name = state.session().player_name().to_string();
                state.end_session();
                drop(state);

                info!(epoch, score, player = %player_name, "session ended");
                self.finish_session(player_name, score, &guard).await;
                Ok(InputOutcome::SessionEnded { score })
            }
        }
    }

    /// Current high-score list from the local cache.
    pub fn high_scores(&self) -> Vec<ScoreRecord> {
        self.gateway.high_scores()
    }

    /// Validate, persist and display a new participant name. Takes effect at
    /// the next session start.
    pub fn set_player_name(&self, name: &str) -> Result<(), EngineError> {
        let name = name.trim();
        validate_player_name(name).map_err(|err| {
            EngineError::InvalidPlayerName(
                err.message
                    .map(|message| message.into_owned())
                    .unwrap_or_else(|| err.code.into_owned()),
            )
        })?;
        save_player_name(self.store.as_ref(), name)?;
        self.display.show_player_name(name);
        info!(player = %name, "player name updated");
        Ok(())
    }

    /// Participant name that the next session will use.
    pub fn player_name(&self) -> String {
        load_player_name(self.store.as_ref())
    }

    /// Snapshot of the state machine.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.snapshot()
    }

    /// Target sequence of the current (or last) session.
    pub async fn sequence(&self) -> Vec<ElementId> {
        self.state.lock().await.session().sequence().to_vec()
    }

    /// Registered elements in display order.
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Submit the record while the mistake feedback plays, then announce the
    /// result and render the new high-score list.
    async fn finish_session(&self, player_name: String, score: u32, guard: &EpochGuard) {
        let record = ScoreRecord::new(player_name.clone(), score, self.clock.today());

        self.sound.play(&self.mistake_tone);
        let (outcome, _) = tokio::join!(
            self.gateway.submit(record.clone()),
            self.playback
                .dance(&self.registry, self.timing.mistake_laps, guard),
        );

        self.peers.broadcast(PeerEvent::SessionEnded {
            from: player_name,
            record,
        });
        self.display.show_high_scores(outcome.scores());
    }

    /// Close the presentation and open the accepting window, unless the
    /// session was superseded meanwhile.
    async fn open_input(&self, epoch: Epoch) -> Result<bool, EngineError> {
        let mut state = self.state.lock().await;
        if !state.is_current(epoch) {
            return Ok(false);
        }
        state.transition(GameEvent::PresentationFinished)?;
        state.session_mut().set_accepting(true);
        Ok(true)
    }

    /// Append one generated element and return the elements to present.
    fn extend_sequence(&self, state: &mut EngineState) -> Result<Vec<Element>, EngineError> {
        let id = self
            .generator
            .next_element(&self.registry)
            .ok_or(EngineError::NoElements)?;
        self.element(&id)?;
        state.session_mut().push(id);

        state
            .session()
            .sequence()
            .iter()
            .map(|id| self.element(id).cloned())
            .collect()
    }

    fn element(&self, id: &ElementId) -> Result<&Element, EngineError> {
        self.registry
            .get(id)
            .ok_or_else(|| EngineError::UnknownElement(id.clone()))
    }

    fn guard(&self, epoch: Epoch) -> EpochGuard {
        EpochGuard::new(self.epoch_tx.subscribe(), epoch)
    }
}
