/*!
A `Dataset` is the set of documents loaded from one directory of `.ann` files. Two
datasets produced by different annotators over the same corpus are walked in parallel
with [`zip_documents`], which pairs documents by name.
*/
use crate::document::{Document, DocumentError};
use ahash::AHashMap;
use std::error::Error;
use std::fmt::Display;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

/// Error raised while loading a directory of annotation files.
#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Document {
        file: PathBuf,
        source: DocumentError,
    },
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "could not read the directory: {}", err),
            Self::Document { file, source } => {
                write!(f, "could not load {}: {}", file.display(), source)
            }
        }
    }
}

impl Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// The documents found in one annotation directory, sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub directory: PathBuf,
    pub documents: Vec<Document>,
}

impl Dataset {
    /// Loads every `.ann` file of a directory. Files with any other extension are
    /// ignored. All documents are parsed eagerly, so the first malformed file fails the
    /// whole load with the offending path attached.
    pub fn from_directory<P: AsRef<Path>>(dir_path: P) -> Result<Self, DatasetError> {
        let directory = dir_path.as_ref().to_path_buf();
        let mut documents = Vec::new();
        for entry in read_dir(&directory)? {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "ann") {
                continue;
            }
            let document = Document::from_ann_path(&path).map_err(|source| {
                DatasetError::Document {
                    file: path.clone(),
                    source,
                }
            })?;
            documents.push(document);
        }
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Dataset {
            directory,
            documents,
        })
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Pairs the documents of two datasets by name, in name order. Documents present in only
/// one of the datasets are left out.
pub fn zip_documents<'a>(left: &'a Dataset, right: &'a Dataset) -> Vec<(&'a Document, &'a Document)> {
    let right_by_name: AHashMap<&str, &Document> = right
        .documents
        .iter()
        .map(|doc| (doc.name.as_str(), doc))
        .collect();
    let mut sorted_left: Vec<&Document> = left.documents.iter().collect();
    sorted_left.sort_by(|a, b| a.name.cmp(&b.name));
    sorted_left
        .into_iter()
        .filter_map(|doc| {
            right_by_name
                .get(doc.name.as_str())
                .map(|other| (doc, *other))
        })
        .collect()
}
