use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stable identifier of a game element (one of the coloured buttons).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reference to a sound asset played through the sound port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tone(String);

impl Tone {
    /// Wrap a raw asset reference (file name or URL).
    pub fn new(asset: impl Into<String>) -> Self {
        Self(asset.into())
    }

    /// Borrow the asset reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A selectable game element bound to a distinct tone. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Identifier used by the input source and the display.
    pub id: ElementId,
    /// Tone played whenever the element is pressed with sound.
    pub tone: Tone,
}

impl Element {
    /// Build an element from its identifier and tone.
    pub fn new(id: impl Into<ElementId>, tone: Tone) -> Self {
        Self {
            id: id.into(),
            tone,
        }
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered set of elements owned by the engine. Registration order defines the
/// order of the attention and mistake animations.
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    elements: IndexMap<ElementId, Element>,
}

impl ElementRegistry {
    /// Build a registry from elements, keeping the first occurrence of a duplicated id.
    pub fn new(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut map = IndexMap::new();
        for element in elements {
            map.entry(element.id.clone()).or_insert(element);
        }
        Self { elements: map }
    }

    /// Look up an element by its identifier.
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Element at `index` in registration order.
    pub fn get_index(&self, index: usize) -> Option<&Element> {
        self.elements.get_index(index).map(|(_, element)| element)
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no element is registered.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over elements in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }
}

/// Outcome of checking one participant input against the target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputVerdict {
    /// Correct element, more elements remain in this round.
    Advance,
    /// Correct element and the whole sequence was repeated.
    RoundComplete,
    /// Wrong element; carries the final score of the session.
    Mistake {
        /// Number of rounds completed before the mistake.
        score: u32,
    },
}

/// Mutable data of the single active session.
#[derive(Debug, Clone)]
pub struct Session {
    sequence: Vec<ElementId>,
    cursor: usize,
    accepting: bool,
    player_name: String,
}

impl Session {
    /// Fresh session for `player_name`: empty sequence, cursor at zero, input closed.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            sequence: Vec::new(),
            cursor: 0,
            accepting: false,
            player_name: player_name.into(),
        }
    }

    /// Target sequence in presentation order.
    pub fn sequence(&self) -> &[ElementId] {
        &self.sequence
    }

    /// Index of the next element the participant must repeat.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether participant input is currently evaluated.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Open or close the accepting window.
    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    /// Display name captured when the session started.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Rounds completed so far (`length(sequence) - 1`, never negative).
    pub fn completed_rounds(&self) -> u32 {
        self.sequence.len().saturating_sub(1) as u32
    }

    /// Append one element to the target sequence.
    pub fn push(&mut self, id: ElementId) {
        self.sequence.push(id);
    }

    /// Evaluate `id` against `sequence[cursor]`, advancing or rewinding the cursor.
    ///
    /// A mistake leaves the cursor untouched; the session is over at that point.
    pub fn check(&mut self, id: &ElementId) -> InputVerdict {
        match self.sequence.get(self.cursor) {
            Some(expected) if expected == id => {
                self.cursor += 1;
                if self.cursor == self.sequence.len() {
                    self.cursor = 0;
                    InputVerdict::RoundComplete
                } else {
                    InputVerdict::Advance
                }
            }
            _ => InputVerdict::Mistake {
                score: self.completed_rounds(),
            },
        }
    }
}
