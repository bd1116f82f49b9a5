/*!
Line oriented parser for the brat standoff format. Each line kind is recognized by a
regular expression. Lines that do not match any known shape are skipped silently, which is
how stray comments and unsupported annotation kinds are tolerated. The only hard failure
is a reference to an identifier that does not appear anywhere in the text.

Parsing happens in two phases: lines are first bucketed by kind, then processed in
dependency order (entities, events, relations, equivalences, attributes, normalizations)
so that every cross reference can be resolved against a single context map.
*/
use crate::annotation::{
    AnnRef, Attribute, Entity, Equivalence, Event, Normalization, Relation,
};
use ahash::AHashMap;
use regex::Regex;
use std::error::Error;
use std::fmt::Display;
use std::rc::Rc;
use std::sync::LazyLock;

static ENTITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(T\d+)\t([^\t]+) ((?:\d+ \d+;)*\d+ \d+)\t(.*)$").unwrap()
});
static EVENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(E\d+)\t([^\t:]+):(T\d+)((?:\s+[^\t:]+:T\d+)*)").unwrap());
static RELATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^R\d+\t(\S+) Arg1:(T\d+) Arg2:(T\d+)").unwrap());
static EQUIV_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\tEquiv ((?:T\d+\s?)+)").unwrap());
static ATTRIB_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^A\d+\t(\S+) ((?:[TE]\d+\s?)+)").unwrap());
static NORM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^N\d+\tReference (T\d+) ([^:]+):([^\t]+)\t.*$").unwrap()
});
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static ROLE_ARG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^\t:]+):(T\d+)").unwrap());
static ENTITY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"T\d+").unwrap());
static TARGET_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[TE]\d+").unwrap());

/// Error raised while resolving the cross references of an annotation file.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    /// An annotation line refers to an identifier that does not appear in the file. The
    /// line number is 1-based.
    UnresolvedReference { line: usize, reference: String },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedReference { line, reference } => write!(
                f,
                "line {}: an annotation refers to {}, though this identifier does not appear in the file",
                line, reference
            ),
        }
    }
}

impl Error for ParseError {}

/// The six annotation lists parsed out of one standoff text, each sorted in its canonical
/// order. Entities and events are reference counted because relations, equivalences,
/// attributes and normalizations point back into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standoff {
    pub entities: Vec<Rc<Entity>>,
    pub events: Vec<Rc<Event>>,
    pub relations: Vec<Relation>,
    pub equivalences: Vec<Equivalence>,
    pub attributes: Vec<Attribute>,
    pub normalizations: Vec<Normalization>,
}

fn resolve<'a>(
    context: &'a AHashMap<String, AnnRef>,
    reference: &str,
    line: usize,
) -> Result<&'a AnnRef, ParseError> {
    context.get(reference).ok_or_else(|| ParseError::UnresolvedReference {
        line,
        reference: reference.to_string(),
    })
}

fn resolve_entity(
    context: &AHashMap<String, AnnRef>,
    reference: &str,
    line: usize,
) -> Result<Rc<Entity>, ParseError> {
    match resolve(context, reference, line)? {
        AnnRef::Entity(ent) => Ok(Rc::clone(ent)),
        AnnRef::Event(_) => Err(ParseError::UnresolvedReference {
            line,
            reference: reference.to_string(),
        }),
    }
}

/// Turns a span column such as `"0 5;8 12"` into `(start, end)` pairs. Returns `None`
/// when an offset does not fit in `usize`, in which case the whole line is skipped.
fn parse_spans(column: &str) -> Option<Vec<(usize, usize)>> {
    let numbers: Option<Vec<usize>> = NUMBER
        .find_iter(column)
        .map(|m| m.as_str().parse::<usize>().ok())
        .collect();
    let numbers = numbers?;
    Some(numbers.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

/// Parses one standoff text into its six annotation lists.
///
/// * `text`: The content of an `.ann` file.
///
/// Lines that do not match any known annotation shape are ignored. When the same
/// identifier appears on more than one line, the last occurrence wins. The returned lists
/// are sorted.
pub fn parse_standoff(text: &str) -> Result<Standoff, ParseError> {
    let mut entity_lines: Vec<(usize, &str)> = Vec::new();
    let mut event_lines: Vec<(usize, &str)> = Vec::new();
    let mut relation_lines: Vec<(usize, &str)> = Vec::new();
    let mut equiv_lines: Vec<(usize, &str)> = Vec::new();
    let mut attrib_lines: Vec<(usize, &str)> = Vec::new();
    let mut norm_lines: Vec<(usize, &str)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let numbered = (idx + 1, line);
        match line.as_bytes().first() {
            Some(b'T') => entity_lines.push(numbered),
            Some(b'E') => event_lines.push(numbered),
            Some(b'R') => relation_lines.push(numbered),
            Some(b'*') => equiv_lines.push(numbered),
            Some(b'A') => attrib_lines.push(numbered),
            Some(b'N') => norm_lines.push(numbered),
            _ => (),
        }
    }

    let mut context: AHashMap<String, AnnRef> = AHashMap::default();

    let mut entity_map: AHashMap<String, Rc<Entity>> = AHashMap::default();
    for (_, line) in &entity_lines {
        let Some(caps) = ENTITY_LINE.captures(line) else {
            continue;
        };
        let Some(spans) = parse_spans(&caps[3]) else {
            continue;
        };
        let entity = Rc::new(Entity::new(caps[2].to_string(), spans, caps[4].to_string()));
        entity_map.insert(caps[1].to_string(), entity);
    }
    let mut entities: Vec<Rc<Entity>> = entity_map.values().cloned().collect();
    entities.sort();
    context.extend(
        entity_map
            .into_iter()
            .map(|(id, ent)| (id, AnnRef::Entity(ent))),
    );

    let mut events: Vec<Rc<Event>> = Vec::new();
    for &(line_no, line) in &event_lines {
        let Some(caps) = EVENT_LINE.captures(line) else {
            continue;
        };
        let trigger = resolve_entity(&context, &caps[3], line_no)?;
        let mut arguments = Vec::new();
        for arg in ROLE_ARG.captures_iter(&caps[4]) {
            let role = arg[1].trim().to_string();
            let target = resolve_entity(&context, &arg[2], line_no)?;
            arguments.push((role, target));
        }
        let event = Rc::new(Event {
            event_type: caps[2].to_string(),
            trigger,
            arguments,
        });
        context.insert(caps[1].to_string(), AnnRef::Event(Rc::clone(&event)));
        events.push(event);
    }
    events.sort();

    let mut relations: Vec<Relation> = Vec::new();
    for &(line_no, line) in &relation_lines {
        let Some(caps) = RELATION_LINE.captures(line) else {
            continue;
        };
        relations.push(Relation {
            relation: caps[1].to_string(),
            arg1: resolve_entity(&context, &caps[2], line_no)?,
            arg2: resolve_entity(&context, &caps[3], line_no)?,
        });
    }
    relations.sort();

    let mut equivalences: Vec<Equivalence> = Vec::new();
    for &(line_no, line) in &equiv_lines {
        let Some(caps) = EQUIV_LINE.captures(line) else {
            continue;
        };
        let mut items = Vec::new();
        for id in ENTITY_ID.find_iter(&caps[1]) {
            items.push(resolve_entity(&context, id.as_str(), line_no)?);
        }
        items.sort();
        equivalences.push(Equivalence { items });
    }
    equivalences.sort();

    let mut attributes: Vec<Attribute> = Vec::new();
    for &(line_no, line) in &attrib_lines {
        let Some(caps) = ATTRIB_LINE.captures(line) else {
            continue;
        };
        let mut items = Vec::new();
        for id in TARGET_ID.find_iter(&caps[2]) {
            items.push(resolve(&context, id.as_str(), line_no)?.clone());
        }
        attributes.push(Attribute {
            tag: caps[1].to_string(),
            items,
        });
    }
    attributes.sort();

    let mut normalizations: Vec<Normalization> = Vec::new();
    for &(line_no, line) in &norm_lines {
        let Some(caps) = NORM_LINE.captures(line) else {
            continue;
        };
        normalizations.push(Normalization {
            entity: resolve_entity(&context, &caps[1], line_no)?,
            ontology: caps[2].to_string(),
            ont_id: caps[3].to_string(),
        });
    }
    normalizations.sort();

    Ok(Standoff {
        entities,
        events,
        relations,
        equivalences,
        attributes,
        normalizations,
    })
}
