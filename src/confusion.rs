/*!
This module builds confusion matrices out of two parallel sets of
annotations. Annotations are paired on WHERE they are, not on how they are
tagged: two entities pair up when they cover the same range, two relations
when they link the same arguments. The matrix then counts how often a gold
tag was rendered as each system tag. Annotations left unpaired are counted
under the reserved `NONE` label, unless the caller drops them.
*/
use ahash::AHashMap;
use ndarray::Array2;
use serde::Serialize;
use standoff_parsing::{zip_documents, Dataset, Entity, Relation};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt::Display;

/// Label of the row and column holding unpaired annotations.
pub const NONE_LABEL: &str = "NONE";

/// A square confusion matrix. Rows are the tags of the gold annotator,
/// columns the tags of the system annotator, both in the same order. The
/// labels are sorted, with `NONE` last when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionTable {
    labels: Vec<String>,
    counts: Array2<usize>,
}

impl ConfusionTable {
    /// Labels of both axes of the matrix.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    /// Looks a cell up by its labels. Returns `None` when either label is
    /// not an axis of the matrix.
    pub fn get(&self, gold_label: &str, system_label: &str) -> Option<usize> {
        let row = self.labels.iter().position(|label| label == gold_label)?;
        let column = self.labels.iter().position(|label| label == system_label)?;
        self.counts.get((row, column)).copied()
    }
}

impl Display for ConfusionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|label| label.len())
            .chain(self.counts.iter().map(|count| count.to_string().len()))
            .max()
            .unwrap_or(1)
            + 2;
        write!(f, "{:>width$}", "")?;
        for label in self.labels.iter() {
            write!(f, "{label:>width$}")?;
        }
        writeln!(f)?;
        for (row, label) in self.labels.iter().enumerate() {
            write!(f, "{label:>width$}")?;
            for count in self.counts.row(row).iter() {
                write!(f, "{count:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Collects (gold tag, system tag) pairs, keeping `None` for the side of an
/// unpaired annotation. The labels of both inputs are tracked separately
/// from the pairs, so that a tag every annotation of which got paired away
/// still gets its axis.
#[derive(Debug, Default)]
struct PairAccumulator {
    pairs: AHashMap<(Option<String>, Option<String>), usize>,
    labels: BTreeSet<String>,
}

impl PairAccumulator {
    fn record(&mut self, gold: Option<&str>, system: Option<&str>) {
        *self
            .pairs
            .entry((gold.map(String::from), system.map(String::from)))
            .or_insert(0) += 1;
    }

    fn add_labels<'a>(&mut self, labels: impl Iterator<Item = &'a str>) {
        for label in labels {
            if !self.labels.contains(label) {
                self.labels.insert(String::from(label));
            }
        }
    }

    fn into_table(self, include_none: bool) -> ConfusionTable {
        let mut labels: Vec<String> = self.labels.into_iter().collect();
        if include_none {
            labels.push(String::from(NONE_LABEL));
        }
        let index: AHashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(position, label)| (label.as_str(), position))
            .collect();
        let mut counts = Array2::zeros((labels.len(), labels.len()));
        for ((gold, system), count) in self.pairs.iter() {
            if !include_none && (gold.is_none() || system.is_none()) {
                continue;
            }
            // Unpaired sides land on the NONE axis, which is always last.
            let row = match gold.as_deref() {
                Some(label) => index[label],
                None => labels.len() - 1,
            };
            let column = match system.as_deref() {
                Some(label) => index[label],
                None => labels.len() - 1,
            };
            counts[[row, column]] += count;
        }
        ConfusionTable { labels, counts }
    }
}

fn accumulate_entity_pairs<E: Borrow<Entity>>(
    accumulator: &mut PairAccumulator,
    gold: &[E],
    system: &[E],
) {
    accumulator.add_labels(gold.iter().map(|entity| entity.borrow().tag.as_str()));
    accumulator.add_labels(system.iter().map(|entity| entity.borrow().tag.as_str()));
    let mut system_used = vec![false; system.len()];
    for gold_entity in gold.iter() {
        let gold_entity = gold_entity.borrow();
        let mut matched = false;
        for (position, sys_entity) in system.iter().enumerate() {
            if system_used[position] {
                continue;
            }
            let sys_entity = sys_entity.borrow();
            if gold_entity.start() == sys_entity.start() && gold_entity.end() == sys_entity.end() {
                system_used[position] = true;
                accumulator.record(Some(&gold_entity.tag), Some(&sys_entity.tag));
                matched = true;
                break;
            }
        }
        if !matched {
            accumulator.record(Some(&gold_entity.tag), None);
        }
    }
    for (position, sys_entity) in system.iter().enumerate() {
        if !system_used[position] {
            accumulator.record(None, Some(&sys_entity.borrow().tag));
        }
    }
}

fn accumulate_relation_pairs(
    accumulator: &mut PairAccumulator,
    gold: &[Relation],
    system: &[Relation],
) {
    accumulator.add_labels(gold.iter().map(|relation| relation.relation.as_str()));
    accumulator.add_labels(system.iter().map(|relation| relation.relation.as_str()));
    let mut system_used = vec![false; system.len()];
    for gold_relation in gold.iter() {
        let mut matched = false;
        for (position, sys_relation) in system.iter().enumerate() {
            if system_used[position] {
                continue;
            }
            if gold_relation.arg1 == sys_relation.arg1 && gold_relation.arg2 == sys_relation.arg2 {
                system_used[position] = true;
                accumulator.record(Some(&gold_relation.relation), Some(&sys_relation.relation));
                matched = true;
                break;
            }
        }
        if !matched {
            accumulator.record(Some(&gold_relation.relation), None);
        }
    }
    for (position, sys_relation) in system.iter().enumerate() {
        if !system_used[position] {
            accumulator.record(None, Some(&sys_relation.relation));
        }
    }
}

/// Builds the confusion matrix of two sets of entities. Entities are paired
/// on their exact boundaries, whatever their tags.
///
/// * `gold`: entities of the reference annotator.
/// * `system`: entities of the annotator being evaluated.
/// * `include_none`: Do unpaired entities get a `NONE` row and column?
pub fn entity_confusion<E: Borrow<Entity>>(
    gold: &[E],
    system: &[E],
    include_none: bool,
) -> ConfusionTable {
    let mut accumulator = PairAccumulator::default();
    accumulate_entity_pairs(&mut accumulator, gold, system);
    accumulator.into_table(include_none)
}

/// Builds the confusion matrix of two sets of relations. Relations are
/// paired when both their arguments are equal, whatever their labels.
pub fn relation_confusion(
    gold: &[Relation],
    system: &[Relation],
    include_none: bool,
) -> ConfusionTable {
    let mut accumulator = PairAccumulator::default();
    accumulate_relation_pairs(&mut accumulator, gold, system);
    accumulator.into_table(include_none)
}

/// Builds one entity confusion matrix for a whole pair of datasets, pairing
/// entities inside each pair of documents sharing a name.
pub fn entity_confusion_dataset(
    gold: &Dataset,
    system: &Dataset,
    include_none: bool,
) -> ConfusionTable {
    let mut accumulator = PairAccumulator::default();
    for (gold_doc, sys_doc) in zip_documents(gold, system) {
        accumulate_entity_pairs(
            &mut accumulator,
            &gold_doc.annotations.entities,
            &sys_doc.annotations.entities,
        );
    }
    accumulator.into_table(include_none)
}

/// Builds one relation confusion matrix for a whole pair of datasets.
pub fn relation_confusion_dataset(
    gold: &Dataset,
    system: &Dataset,
    include_none: bool,
) -> ConfusionTable {
    let mut accumulator = PairAccumulator::default();
    for (gold_doc, sys_doc) in zip_documents(gold, system) {
        accumulate_relation_pairs(
            &mut accumulator,
            &gold_doc.annotations.relations,
            &sys_doc.annotations.relations,
        );
    }
    accumulator.into_table(include_none)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use standoff_parsing::{Document, Standoff};
    use std::path::PathBuf;
    use std::rc::Rc;

    #[test]
    fn test_entity_confusion_with_the_none_axis() {
        let (gold, system) = entity_fixture();
        let table = entity_confusion(&gold, &system, true);
        assert_eq!(vec!["A", "B", "C", "D", "NONE"], table.labels());
        let expected: Array2<usize> = array![
            [1, 0, 1, 0, 0],
            [1, 0, 0, 0, 0],
            [0, 0, 1, 1, 1],
            [0, 0, 0, 0, 0],
            [0, 0, 0, 1, 0]
        ];
        assert_eq!(expected, *table.counts());
    }

    #[test]
    fn test_entity_confusion_without_the_none_axis() {
        let (gold, system) = entity_fixture();
        let table = entity_confusion(&gold, &system, false);
        assert_eq!(vec!["A", "B", "C", "D"], table.labels());
        let expected: Array2<usize> = array![
            [1, 0, 1, 0],
            [1, 0, 0, 0],
            [0, 0, 1, 1],
            [0, 0, 0, 0]
        ];
        assert_eq!(expected, *table.counts());
    }

    #[test]
    fn test_relation_confusion_pairs_on_arguments() {
        let ents = vec![
            ent("A", 1, 2),
            ent("B", 3, 4),
            ent("A", 5, 6),
            ent("C", 7, 8),
            ent("C", 9, 10),
        ];
        let gold = vec![
            rel("AB", &ents[0], &ents[1]),
            rel("AC", &ents[2], &ents[3]),
            rel("BC", &ents[1], &ents[4]),
            rel("AC", &ents[2], &ents[4]),
        ];
        let system = vec![
            rel("AB", &ents[0], &ents[1]),
            rel("AC", &ents[2], &ents[3]),
            rel("BC", &ents[1], &ents[4]),
            rel("BC", &ents[1], &ents[3]),
        ];
        let table = relation_confusion(&gold, &system, true);
        assert_eq!(vec!["AB", "AC", "BC", "NONE"], table.labels());
        let expected: Array2<usize> = array![
            [1, 0, 0, 0],
            [0, 1, 0, 1],
            [0, 0, 1, 0],
            [0, 0, 1, 0]
        ];
        assert_eq!(expected, *table.counts());

        let table = relation_confusion(&gold, &system, false);
        assert_eq!(vec!["AB", "AC", "BC"], table.labels());
        let expected: Array2<usize> = array![[1, 0, 0], [0, 1, 0], [0, 0, 1]];
        assert_eq!(expected, *table.counts());
    }

    #[test]
    fn test_dataset_confusion_accumulates_every_document_pair() {
        let gold = dataset(vec![
            doc("first", vec![ent("A", 1, 2)]),
            doc("second", vec![ent("A", 3, 4), ent("B", 5, 6)]),
        ]);
        let system = dataset(vec![
            doc("first", vec![ent("B", 1, 2)]),
            doc("second", vec![ent("A", 3, 4)]),
        ]);
        let table = entity_confusion_dataset(&gold, &system, true);
        assert_eq!(vec!["A", "B", "NONE"], table.labels());
        let expected: Array2<usize> = array![[1, 1, 0], [0, 0, 1], [0, 0, 0]];
        assert_eq!(expected, *table.counts());
    }

    #[test]
    fn test_cells_can_be_looked_up_by_labels() {
        let (gold, system) = entity_fixture();
        let table = entity_confusion(&gold, &system, true);
        assert_eq!(Some(1), table.get("B", "A"));
        assert_eq!(Some(1), table.get("C", "NONE"));
        assert_eq!(Some(0), table.get("D", "D"));
        assert_eq!(None, table.get("E", "A"));
    }

    #[test]
    fn test_display_aligns_the_columns() {
        let gold = vec![ent("A", 1, 2)];
        let system = vec![ent("A", 1, 2), ent("A", 3, 4)];
        let table = entity_confusion(&gold, &system, true);
        let expected = "           A  NONE\n\
                        \u{20}    A     1     0\n\
                        \u{20} NONE     1     0\n";
        assert_eq!(expected, table.to_string());
    }

    fn entity_fixture() -> (Vec<Rc<Entity>>, Vec<Rc<Entity>>) {
        let gold = vec![
            ent("A", 1, 2),
            ent("B", 3, 4),
            ent("A", 5, 6),
            ent("C", 7, 8),
            ent("C", 9, 10),
            ent("C", 11, 12),
        ];
        let system = vec![
            ent("A", 1, 2),
            ent("A", 3, 4),
            ent("C", 5, 6),
            ent("C", 7, 8),
            ent("D", 9, 10),
            ent("D", 13, 14),
        ];
        (gold, system)
    }

    fn ent(tag: &str, start: usize, end: usize) -> Rc<Entity> {
        Rc::new(Entity::new(tag, vec![(start, end)], ""))
    }

    fn rel(label: &str, arg1: &Rc<Entity>, arg2: &Rc<Entity>) -> Relation {
        Relation {
            relation: String::from(label),
            arg1: Rc::clone(arg1),
            arg2: Rc::clone(arg2),
        }
    }

    fn doc(name: &str, entities: Vec<Rc<Entity>>) -> Document {
        Document::from_parts(
            name,
            Standoff {
                entities,
                ..Standoff::default()
            },
        )
    }

    fn dataset(documents: Vec<Document>) -> Dataset {
        Dataset {
            directory: PathBuf::new(),
            documents,
        }
    }
}
