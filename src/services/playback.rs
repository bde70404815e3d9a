//! Timed highlight/tone playback: sequence presentation and the cyclic
//! attention and mistake animations.

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    config::TimingConfig,
    services::ports::{Clock, DisplayPort, Highlight, SoundPort},
    state::{
        EpochGuard,
        session::{Element, ElementRegistry},
    },
};

/// Whether a playback ran to the end or was abandoned for a newer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every step played.
    Completed,
    /// A newer session started; the remaining steps were skipped.
    Superseded,
}

impl PlaybackOutcome {
    /// Shorthand for `self == PlaybackOutcome::Completed`.
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

/// Drives the display, sound and clock ports according to the timing contract.
///
/// Steps never overlap: a press starts only after the previous press and its
/// settle delay resolved, across clones and across sessions. A press that
/// already started always finishes, so no element is left lit when a session
/// is superseded.
#[derive(Clone)]
pub struct Playback {
    display: Arc<dyn DisplayPort>,
    sound: Arc<dyn SoundPort>,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    gate: Arc<Mutex<()>>,
}

impl Playback {
    /// Build a controller over the given ports.
    pub fn new(
        display: Arc<dyn DisplayPort>,
        sound: Arc<dyn SoundPort>,
        clock: Arc<dyn Clock>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            display,
            sound,
            clock,
            timing,
            gate: Arc::default(),
        }
    }

    /// Timing contract in use.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Highlight `element` (optionally with its tone), hold, dim, then settle.
    ///
    /// Waits for any press in flight to settle first.
    pub async fn press(&self, element: &Element, hold: Duration, with_tone: bool) {
        let _turn = self.gate.lock().await;
        self.display.set_element(&element.id, Highlight::Lit);
        if with_tone {
            self.sound.play(&element.tone);
        }
        self.clock.sleep(hold).await;
        self.display.set_element(&element.id, Highlight::Dim);
        self.clock.sleep(self.timing.settle).await;
    }

    /// Press used for a presentation step and for participant feedback.
    pub async fn present_press(&self, element: &Element) {
        self.press(element, self.timing.present_hold, true).await;
    }

    /// Wait `lead_in`, then play `elements` one after the other with tones.
    pub async fn present(
        &self,
        lead_in: Duration,
        elements: &[Element],
        guard: &EpochGuard,
    ) -> PlaybackOutcome {
        self.clock.sleep(lead_in).await;
        for element in elements {
            if !guard.is_current() {
                return superseded(guard, "presentation");
            }
            self.present_press(element).await;
        }
        if guard.is_current() {
            PlaybackOutcome::Completed
        } else {
            superseded(guard, "presentation")
        }
    }

    /// Cycle muted short presses through every element in registration order,
    /// `laps` times.
    pub async fn dance(
        &self,
        registry: &ElementRegistry,
        laps: u32,
        guard: &EpochGuard,
    ) -> PlaybackOutcome {
        for _ in 0..laps {
            for element in registry.iter() {
                if !guard.is_current() {
                    return superseded(guard, "animation");
                }
                self.press(element, self.timing.dance_hold, false).await;
            }
        }
        if guard.is_current() {
            PlaybackOutcome::Completed
        } else {
            superseded(guard, "animation")
        }
    }
}

fn superseded(guard: &EpochGuard, what: &'static str) -> PlaybackOutcome {
    debug!(epoch = guard.epoch(), what, "playback superseded by a newer session");
    PlaybackOutcome::Superseded
}
