use std::sync::atomic::{AtomicUsize, Ordering};

use rand::{Rng, rng};

use crate::state::session::{ElementId, ElementRegistry};

/// Chooses the element appended to the target sequence each round.
pub trait SequenceGenerator: Send + Sync {
    /// Pick the next element, `None` only when the registry is empty.
    fn next_element(&self, registry: &ElementRegistry) -> Option<ElementId>;
}

/// Uniform choice among all registered elements, independent of previous picks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl SequenceGenerator for RandomGenerator {
    fn next_element(&self, registry: &ElementRegistry) -> Option<ElementId> {
        if registry.is_empty() {
            return None;
        }
        let index = rng().random_range(0..registry.len());
        registry.get_index(index).map(|element| element.id.clone())
    }
}

/// Replays a fixed list of elements, wrapping around at the end. Handy for
/// demos and reproducible sessions.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Vec<ElementId>,
    next: AtomicUsize,
}

impl ScriptedGenerator {
    /// Generator yielding `script` in order, cycling forever.
    pub fn new(script: impl IntoIterator<Item = impl Into<ElementId>>) -> Self {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl SequenceGenerator for ScriptedGenerator {
    fn next_element(&self, _registry: &ElementRegistry) -> Option<ElementId> {
        if self.script.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.script.len();
        Some(self.script[index].clone())
    }
}
