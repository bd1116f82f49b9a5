/*!
Checks that the mention recorded on each entity is the text its spans actually cover.
Offsets are counted in characters, not bytes, which is how brat counts them.

Contiguous entities must reproduce their slice exactly. For discontiguous entities the
covered fragments may be separated by any amount of whitespace in the mention, since brat
collapses the text between spans when it writes the file.
*/
use crate::annotation::Entity;
use crate::dataset::Dataset;
use crate::document::{Document, DocumentError};
use regex::Regex;
use std::rc::Rc;

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

fn check_entity(entity: &Entity, text: &str) -> bool {
    let fragments: Vec<String> = entity
        .spans
        .iter()
        .map(|&(start, end)| char_slice(text, start, end))
        .collect();
    if entity.is_contiguous() {
        return fragments.first().map(String::as_str).unwrap_or("") == entity.mention;
    }
    let pattern = format!(
        "^{}$",
        fragments
            .iter()
            .map(|fragment| regex::escape(fragment))
            .collect::<Vec<_>>()
            .join(r"\s*")
    );
    Regex::new(&pattern)
        .expect("Escaped fragments should always form a valid pattern")
        .is_match(&entity.mention)
}

/// Checks every entity of a document against the given source text. Returns one flag per
/// entity, in entity list order.
pub fn validate_text(document: &Document, text: &str) -> Vec<bool> {
    document
        .annotations
        .entities
        .iter()
        .map(|entity| check_entity(entity, text))
        .collect()
}

/// Checks every entity of a document against its `.txt` file.
pub fn validate_document(document: &Document) -> Result<Vec<bool>, DocumentError> {
    let text = document.text()?;
    Ok(validate_text(document, &text))
}

/// Checks every document of a dataset. Each row carries the name of the document the
/// entity comes from. With `invalid_only` only the mismatching rows are collected, which
/// keeps the output small on a large corpus.
pub fn validate_dataset(
    dataset: &Dataset,
    invalid_only: bool,
) -> Result<Vec<(String, Rc<Entity>, bool)>, DocumentError> {
    let mut rows = Vec::new();
    for document in dataset {
        let flags = validate_document(document)?;
        for (entity, matches) in document.annotations.entities.iter().zip(flags) {
            if invalid_only && matches {
                continue;
            }
            rows.push((document.name.clone(), Rc::clone(entity), matches));
        }
    }
    Ok(rows)
}
