/*!
Data model for the annotation kinds found in brat standoff files. Every kind is a plain
struct, fully formed at construction time. Entities are shared through `Rc` so that a
`Relation` found in `Document::relations` refers to the same allocation one would find in
`Document::entities`.
*/
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::rc::Rc;

/// A text-bound annotation (a `T` line). The `spans` are `(start, end)` pairs of character
/// offsets into the source text, end exclusive. Discontiguous entities carry more than one
/// pair. The `mention` is the covered text as it was written in the annotation file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub tag: String,
    pub spans: Vec<(usize, usize)>,
    pub mention: String,
}

impl Entity {
    /// Spans are sorted ascending on construction and never reordered afterwards.
    pub fn new<S: Into<String>>(tag: S, mut spans: Vec<(usize, usize)>, mention: S) -> Self {
        spans.sort_unstable();
        Entity {
            tag: tag.into(),
            spans,
            mention: mention.into(),
        }
    }

    /// Start of the first span. A manually built entity without spans yields 0.
    pub fn start(&self) -> usize {
        self.spans.first().map_or(0, |s| s.0)
    }

    /// End of the last span. A manually built entity without spans yields 0.
    pub fn end(&self) -> usize {
        self.spans.last().map_or(0, |s| s.1)
    }

    pub fn is_contiguous(&self) -> bool {
        self.spans.len() <= 1
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.spans.first(), self.spans.last())
            .cmp(&(other.spans.first(), other.spans.last()))
            .then_with(|| self.tag.cmp(&other.tag))
            .then_with(|| self.spans.cmp(&other.spans))
            .then_with(|| self.mention.cmp(&other.mention))
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An event annotation (an `E` line): a type, a trigger entity and role-named arguments.
/// The arguments keep the order in which they were written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub trigger: Rc<Entity>,
    pub arguments: Vec<(String, Rc<Entity>)>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.trigger
            .cmp(&other.trigger)
            .then_with(|| self.event_type.cmp(&other.event_type))
            .then_with(|| self.arguments.cmp(&other.arguments))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A binary relation annotation (an `R` line) between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub relation: String,
    pub arg1: Rc<Entity>,
    pub arg2: Rc<Entity>,
}

impl Ord for Relation {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.arg1, &self.arg2)
            .cmp(&(&other.arg1, &other.arg2))
            .then_with(|| self.relation.cmp(&other.relation))
    }
}

impl PartialOrd for Relation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An equivalence annotation (a `*\tEquiv` line). The members are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Equivalence {
    pub items: Vec<Rc<Entity>>,
}

/// Target of an attribute annotation. Attributes can point at entities or events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnRef {
    Entity(Rc<Entity>),
    Event(Rc<Event>),
}

/// An attribute annotation (an `A` line) attached to one or more annotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub tag: String,
    pub items: Vec<AnnRef>,
}

impl Ord for Attribute {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag
            .cmp(&other.tag)
            .then_with(|| self.items.cmp(&other.items))
    }
}

impl PartialOrd for Attribute {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A normalization annotation (an `N` line) linking an entity to an external resource,
/// identified by an ontology name and an identifier inside that ontology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Normalization {
    pub entity: Rc<Entity>,
    pub ontology: String,
    pub ont_id: String,
}

impl Ord for Normalization {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entity
            .cmp(&other.entity)
            .then_with(|| self.ontology.cmp(&other.ontology))
            .then_with(|| self.ont_id.cmp(&other.ont_id))
    }
}

impl PartialOrd for Normalization {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
