/*!
A `Document` ties the six annotation lists of one `.ann` file to its name and, when one
exists, to the `.txt` file holding the source text. Documents compare equal on their
annotations only, which is what round trip and agreement code care about.
*/
use crate::annotation::{AnnRef, Entity, Event};
use crate::parser::{parse_standoff, ParseError, Standoff};
use ahash::AHashMap;
use std::error::Error;
use std::fmt::Display;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Error raised when loading a document or reading its source text.
#[derive(Debug)]
pub enum DocumentError {
    Io(std::io::Error),
    Parse(ParseError),
    /// The document has no associated `.txt` file.
    NoText,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "could not read the file: {}", err),
            Self::Parse(err) => write!(f, "{}", err),
            Self::NoText => write!(f, "this document does not have an associated txt file"),
        }
    }
}

impl Error for DocumentError {}

impl From<std::io::Error> for DocumentError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ParseError> for DocumentError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

/// Error raised while serializing a document whose relations, events, equivalences,
/// attributes or normalizations refer to an entity or event that is not part of it.
#[derive(Debug, PartialEq, Eq)]
pub struct DanglingReferenceError;

impl Display for DanglingReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "an annotation refers to an entity or event that is not part of this document"
        )
    }
}

impl Error for DanglingReferenceError {}

/// One annotated document: a name, optional paths and the six annotation lists.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub name: String,
    pub ann_path: Option<PathBuf>,
    pub txt_path: Option<PathBuf>,
    pub annotations: Standoff,
}

/// Two documents are equal when they carry the same annotations. Names and paths do not
/// take part in the comparison.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.annotations == other.annotations
    }
}

impl Document {
    /// Builds a document from already constructed annotation lists.
    pub fn from_parts<S: Into<String>>(name: S, annotations: Standoff) -> Self {
        Document {
            name: name.into(),
            ann_path: None,
            txt_path: None,
            annotations,
        }
    }

    /// Parses a document from standoff text held in memory.
    pub fn from_standoff<S: Into<String>>(name: S, text: &str) -> Result<Self, ParseError> {
        Ok(Document {
            name: name.into(),
            ann_path: None,
            txt_path: None,
            annotations: parse_standoff(text)?,
        })
    }

    /// Loads and parses an `.ann` file. A `.txt` file sitting next to it with the same
    /// stem is picked up automatically as the source text.
    pub fn from_ann_path<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let ann_path = path.as_ref().to_path_buf();
        let text = read_to_string(&ann_path)?;
        let annotations = parse_standoff(&text)?;
        let name = ann_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let possible_txt = ann_path.with_extension("txt");
        let txt_path = possible_txt.exists().then_some(possible_txt);
        Ok(Document {
            name,
            ann_path: Some(ann_path),
            txt_path,
            annotations,
        })
    }

    /// Reads the source text of this document.
    pub fn text(&self) -> Result<String, DocumentError> {
        let path = self.txt_path.as_ref().ok_or(DocumentError::NoText)?;
        Ok(read_to_string(path)?)
    }

    /// Renders the document back into standoff text. Identifiers are assigned anew, per
    /// kind and in canonical order, so serializing a freshly parsed document produces a
    /// normalized version of its file.
    pub fn to_standoff(&self) -> Result<String, DanglingReferenceError> {
        let mut entities = self.annotations.entities.clone();
        entities.sort();
        let mut events = self.annotations.events.clone();
        events.sort();
        let mut relations = self.annotations.relations.clone();
        relations.sort();
        let mut equivalences = self.annotations.equivalences.clone();
        equivalences.sort();
        let mut attributes = self.annotations.attributes.clone();
        attributes.sort();
        let mut normalizations = self.annotations.normalizations.clone();
        normalizations.sort();

        let mut output = String::new();

        let mut entity_ids: AHashMap<&Entity, String> = AHashMap::default();
        for (i, ent) in entities.iter().enumerate() {
            let id = format!("T{}", i + 1);
            let spans = ent
                .spans
                .iter()
                .map(|(start, end)| format!("{} {}", start, end))
                .collect::<Vec<_>>()
                .join(";");
            output.push_str(&format!("{}\t{} {}\t{}\n", id, ent.tag, spans, ent.mention));
            entity_ids.insert(ent.as_ref(), id);
        }

        let entity_id = |ent: &Entity| -> Result<&String, DanglingReferenceError> {
            entity_ids.get(ent).ok_or(DanglingReferenceError)
        };

        let mut event_ids: AHashMap<&Event, String> = AHashMap::default();
        for (i, event) in events.iter().enumerate() {
            let id = format!("E{}", i + 1);
            let mut line = format!("{}\t{}:{}", id, event.event_type, entity_id(&event.trigger)?);
            for (role, target) in &event.arguments {
                line.push_str(&format!(" {}:{}", role, entity_id(target)?));
            }
            line.push('\n');
            output.push_str(&line);
            event_ids.insert(event.as_ref(), id);
        }

        for (i, rel) in relations.iter().enumerate() {
            output.push_str(&format!(
                "R{}\t{} Arg1:{} Arg2:{}\n",
                i + 1,
                rel.relation,
                entity_id(&rel.arg1)?,
                entity_id(&rel.arg2)?
            ));
        }

        for equiv in &equivalences {
            let ids = equiv
                .items
                .iter()
                .map(|ent| entity_id(ent).map(String::as_str))
                .collect::<Result<Vec<_>, _>>()?;
            output.push_str(&format!("*\tEquiv {}\n", ids.join(" ")));
        }

        for (i, attr) in attributes.iter().enumerate() {
            let ids = attr
                .items
                .iter()
                .map(|item| match item {
                    AnnRef::Entity(ent) => entity_id(ent).map(String::as_str),
                    AnnRef::Event(event) => event_ids
                        .get(event.as_ref())
                        .map(String::as_str)
                        .ok_or(DanglingReferenceError),
                })
                .collect::<Result<Vec<_>, _>>()?;
            output.push_str(&format!("A{}\t{} {}\n", i + 1, attr.tag, ids.join(" ")));
        }

        for (i, norm) in normalizations.iter().enumerate() {
            output.push_str(&format!(
                "N{}\tReference {} {}:{}\t{}\n",
                i + 1,
                entity_id(&norm.entity)?,
                norm.ontology,
                norm.ont_id,
                norm.entity.mention
            ));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotation::Relation;
    use quickcheck::{Arbitrary, Gen};
    use std::rc::Rc;

    const SAMPLE: &str = "T1\tDrug 0 5\tadvil\n\
T2\tReaction 10 18;22 27\tswelling spots\n\
T3\tDrug 30 35\taleve\n\
E1\tCausation:T1 Theme:T2\n\
R1\tCauses Arg1:T3 Arg2:T2\n\
*\tEquiv T3 T1\n\
A1\tNegated T1 E1\n\
N1\tReference T1 MedDRA:10000123\tadvil\n";

    #[test]
    fn test_round_trip_preserves_annotations() {
        let doc = Document::from_standoff("sample", SAMPLE).unwrap();
        let rendered = doc.to_standoff().unwrap();
        let reparsed = Document::from_standoff("sample_again", rendered.as_str()).unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn test_serialization_renumbers_identifiers() {
        let text = "T9\tDrug 30 35\taleve\nT5\tDrug 0 5\tadvil\n";
        let doc = Document::from_standoff("doc", text).unwrap();
        let expected = "T1\tDrug 0 5\tadvil\nT2\tDrug 30 35\taleve\n";
        assert_eq!(expected, doc.to_standoff().unwrap());
    }

    #[test]
    fn test_serialization_of_every_kind_matches_the_format() {
        let doc = Document::from_standoff("sample", SAMPLE).unwrap();
        let rendered = doc.to_standoff().unwrap();
        let expected = "T1\tDrug 0 5\tadvil\n\
T2\tReaction 10 18;22 27\tswelling spots\n\
T3\tDrug 30 35\taleve\n\
E1\tCausation:T1 Theme:T2\n\
R1\tCauses Arg1:T3 Arg2:T2\n\
*\tEquiv T1 T3\n\
A1\tNegated T1 E1\n\
N1\tReference T1 MedDRA:10000123\tadvil\n";
        assert_eq!(expected, rendered);
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let orphan = Rc::new(Entity::new("Drug", vec![(0, 5)], "advil"));
        let standoff = Standoff {
            relations: vec![Relation {
                relation: String::from("Causes"),
                arg1: Rc::clone(&orphan),
                arg2: orphan,
            }],
            ..Standoff::default()
        };
        let doc = Document::from_parts("broken", standoff);
        assert_eq!(DanglingReferenceError, doc.to_standoff().unwrap_err());
    }

    #[test]
    fn test_text_without_txt_path_is_an_error() {
        let doc = Document::from_standoff("sample", SAMPLE).unwrap();
        assert!(matches!(doc.text(), Err(DocumentError::NoText)));
    }

    #[test]
    fn test_equality_ignores_names_and_paths() {
        let a = Document::from_standoff("left", SAMPLE).unwrap();
        let b = Document::from_standoff("right", SAMPLE).unwrap();
        assert_eq!(a, b);
    }

    #[derive(Debug, Clone)]
    struct ArbStandoff(Standoff);

    fn pick<'a, T>(g: &mut Gen, choices: &'a [T]) -> &'a T {
        g.choose(choices).unwrap()
    }

    fn arbitrary_entity(g: &mut Gen) -> Entity {
        let tag = pick(g, &["Drug", "Reaction", "Dose", "ADE"]).to_string();
        let start = (u8::arbitrary(g) % 40) as usize;
        let len = (u8::arbitrary(g) % 10) as usize + 1;
        let spans = if bool::arbitrary(g) {
            vec![(start, start + len)]
        } else {
            let gap = (u8::arbitrary(g) % 5) as usize + 1;
            let second = (u8::arbitrary(g) % 10) as usize + 1;
            vec![
                (start, start + len),
                (start + len + gap, start + len + gap + second),
            ]
        };
        let mention = pick(g, &["advil", "aleve", "sore throat", "rash", ""]).to_string();
        Entity {
            tag,
            spans,
            mention,
        }
    }

    impl Arbitrary for ArbStandoff {
        fn arbitrary(g: &mut Gen) -> Self {
            let entity_count = u8::arbitrary(g) % 5 + 1;
            let entities: Vec<Rc<Entity>> = (0..entity_count)
                .map(|_| Rc::new(arbitrary_entity(g)))
                .collect();
            let any_entity = |g: &mut Gen| -> Rc<Entity> {
                let idx = usize::arbitrary(g) % entities.len();
                Rc::clone(&entities[idx])
            };

            let mut events: Vec<Rc<Event>> = (0..u8::arbitrary(g) % 3)
                .map(|_| {
                    let arguments = (0..u8::arbitrary(g) % 2)
                        .map(|_| (pick(g, &["Theme", "Cause"]).to_string(), any_entity(g)))
                        .collect();
                    Rc::new(Event {
                        event_type: pick(g, &["Causation", "Administration"]).to_string(),
                        trigger: any_entity(g),
                        arguments,
                    })
                })
                .collect();

            let mut relations: Vec<Relation> = (0..u8::arbitrary(g) % 3)
                .map(|_| Relation {
                    relation: pick(g, &["Causes", "Treats"]).to_string(),
                    arg1: any_entity(g),
                    arg2: any_entity(g),
                })
                .collect();

            let mut equivalences: Vec<crate::annotation::Equivalence> = (0..u8::arbitrary(g) % 2)
                .map(|_| {
                    let mut items = vec![any_entity(g), any_entity(g)];
                    items.sort();
                    crate::annotation::Equivalence { items }
                })
                .collect();

            let mut attributes: Vec<crate::annotation::Attribute> = (0..u8::arbitrary(g) % 3)
                .map(|_| {
                    let item = if !events.is_empty() && bool::arbitrary(g) {
                        let idx = usize::arbitrary(g) % events.len();
                        AnnRef::Event(Rc::clone(&events[idx]))
                    } else {
                        AnnRef::Entity(any_entity(g))
                    };
                    crate::annotation::Attribute {
                        tag: pick(g, &["Negated", "Hypothetical"]).to_string(),
                        items: vec![item],
                    }
                })
                .collect();

            let mut normalizations: Vec<crate::annotation::Normalization> =
                (0..u8::arbitrary(g) % 2)
                    .map(|_| crate::annotation::Normalization {
                        entity: any_entity(g),
                        ontology: pick(g, &["MedDRA", "SNOMED"]).to_string(),
                        ont_id: format!("{}", u16::arbitrary(g)),
                    })
                    .collect();

            let mut entities = entities;
            entities.sort();
            events.sort();
            relations.sort();
            equivalences.sort();
            attributes.sort();
            normalizations.sort();

            ArbStandoff(Standoff {
                entities,
                events,
                relations,
                equivalences,
                attributes,
                normalizations,
            })
        }
    }

    quickcheck::quickcheck! {
        fn prop_round_trip_is_lossless(standoff: ArbStandoff) -> bool {
            let doc = Document::from_parts("generated", standoff.0);
            let rendered = match doc.to_standoff() {
                Ok(rendered) => rendered,
                Err(_) => return false,
            };
            match Document::from_standoff("reparsed", rendered.as_str()) {
                Ok(reparsed) => reparsed == doc,
                Err(_) => false,
            }
        }
    }
}
