use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    state::{session::ElementId, state_machine::InvalidTransition},
};

/// Errors surfaced by the turn arbiter to its callers.
///
/// Ignored input and remote failures are not errors: the former is reported
/// as an outcome, the latter degrades to the local score cache.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input referenced an element that is not registered.
    #[error("unknown element `{0}`")]
    UnknownElement(ElementId),
    /// The state machine rejected an event; indicates an engine bug.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// The engine was built without any element.
    #[error("at least one game element is required")]
    NoElements,
    /// Supplied display name was rejected.
    #[error("invalid player name: {0}")]
    InvalidPlayerName(String),
    /// Local storage could not be written.
    #[error("local storage failed")]
    Storage(#[from] StorageError),
}
