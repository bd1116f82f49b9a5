/*!
This library reads and writes the brat standoff annotation format. An annotated corpus is
a directory of `.ann` files, one per source document, each usually sitting next to a
`.txt` file with the text the annotations point into.

# Annotation kinds
The following line kinds of the format are supported:
* `T` lines: text-bound entities, made of a tag, one or more `start end` character spans
    and the covered text (the mention). More than one span makes the entity
    discontiguous.
* `E` lines: events, made of an event type, a trigger entity and role-named entity
    arguments.
* `R` lines: binary relations between two entities.
* `*\tEquiv` lines: equivalence classes of entities.
* `A` lines: attributes attached to entities or events.
* `N` lines: normalizations linking an entity to an identifier in an external ontology.

Any other line kind is ignored.

# Terminology
* A document is the set of annotations parsed from one `.ann` file, see [`Document`].
* A dataset is a directory of documents, see [`Dataset`]. Two datasets over the same
    text corpus are walked in parallel with [`zip_documents`], which pairs their
    documents by file name.
* A mention is the text fragment recorded on an entity. [`validate_document`] checks
    mentions against the source text.

# Example
```rust
use standoff_parsing::Document;

let text = "T1\tDrug 0 5\tadvil\nT2\tReaction 10 14\trash\nR1\tCauses Arg1:T1 Arg2:T2\n";
let doc = Document::from_standoff("example", text).unwrap();
assert_eq!(2, doc.annotations.entities.len());
assert_eq!("Causes", doc.annotations.relations[0].relation);
// Serializing normalizes the file: identifiers are reassigned in canonical order.
assert_eq!(text, doc.to_standoff().unwrap());
```
*/

mod annotation;
mod dataset;
mod document;
mod parser;
mod validation;

// The public api starts here
pub use annotation::{AnnRef, Attribute, Entity, Equivalence, Event, Normalization, Relation};

pub use parser::{parse_standoff, ParseError, Standoff};

pub use document::{DanglingReferenceError, Document, DocumentError};

pub use dataset::{zip_documents, Dataset, DatasetError};

pub use validation::{validate_dataset, validate_document, validate_text};
