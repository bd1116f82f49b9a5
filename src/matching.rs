/*!
This module pairs the annotations of two annotators and counts how often
they agree. Entities can be paired strictly, on their exact boundaries, or
leniently, on any overlap. Relations are paired on their argument structure.
All counting functions return one `Measures` per tag, with a zero row for
every tag that only one of the two annotators used.
*/
use crate::measures::Measures;
use ahash::AHashMap;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use standoff_parsing::{zip_documents, Dataset, Entity, Relation};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// How two entities must relate for the annotators to count as agreeing.
/// `Strict` requires the same tag and the exact same boundaries, `Lenient`
/// accepts any overlap between entities of the same tag.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence,
)]
pub enum MatchMode {
    #[default]
    Strict,
    Lenient,
}

impl Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidModeError(String);

impl Display for InvalidModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mode must be 'strict' or 'lenient', got '{}'", self.0)
    }
}
impl Error for InvalidModeError {}

impl FromStr for MatchMode {
    type Err = InvalidModeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" | "Strict" => Ok(MatchMode::Strict),
            "lenient" | "Lenient" => Ok(MatchMode::Lenient),
            _ => Err(InvalidModeError(s.to_string())),
        }
    }
}

/// Tells whether two entities count as the same annotation under the given
/// mode. Both modes require the tags to be equal. Entities that merely touch
/// do not overlap, so adjacent entities never match leniently.
pub fn entities_match(left: &Entity, right: &Entity, mode: MatchMode) -> bool {
    if left.tag != right.tag {
        return false;
    }
    match mode {
        MatchMode::Strict => left.start() == right.start() && left.end() == right.end(),
        MatchMode::Lenient => left.end() > right.start() && left.start() < right.end(),
    }
}

/// Counts the agreement between two sets of entities, per tag.
///
/// Each gold entity can agree with at most one system entity. A system
/// entity that agrees with no gold entity is a false positive of its tag; a
/// gold entity left unmatched is a false negative.
///
/// * `gold`: entities of the reference annotator.
/// * `system`: entities of the annotator being evaluated.
/// * `mode`: how entities are paired.
pub fn measure_entities<E: Borrow<Entity>>(
    gold: &[E],
    system: &[E],
    mode: MatchMode,
) -> BTreeMap<String, Measures> {
    match mode {
        MatchMode::Strict => measure_entities_strict(gold, system),
        MatchMode::Lenient => measure_entities_pairwise(gold, system, mode),
    }
}

/// Strict agreement only depends on the multiset of (tag, start, end) keys,
/// so the pairing loop reduces to counting keys on both sides.
fn measure_entities_strict<E: Borrow<Entity>>(
    gold: &[E],
    system: &[E],
) -> BTreeMap<String, Measures> {
    let gold_keys = strict_keys(gold);
    let system_keys = strict_keys(system);
    let mut true_pos: AHashMap<&str, usize> = AHashMap::new();
    for (key, gold_count) in gold_keys.iter() {
        let system_count = system_keys.get(key).copied().unwrap_or(0);
        *true_pos.entry(key.0).or_insert(0) += (*gold_count).min(system_count);
    }
    assemble_counts(&tag_totals(gold), &tag_totals(system), &true_pos)
}

/// Pairs each system entity with the first gold entity it matches, in the
/// order both slices come in. Used directly for lenient matching, where the
/// outcome depends on the pairing order.
fn measure_entities_pairwise<E: Borrow<Entity>>(
    gold: &[E],
    system: &[E],
    mode: MatchMode,
) -> BTreeMap<String, Measures> {
    let mut gold_used = vec![false; gold.len()];
    let mut true_pos: AHashMap<&str, usize> = AHashMap::new();
    for sys_entity in system.iter() {
        let sys_entity = sys_entity.borrow();
        for (index, gold_entity) in gold.iter().enumerate() {
            if gold_used[index] {
                continue;
            }
            if entities_match(sys_entity, gold_entity.borrow(), mode) {
                gold_used[index] = true;
                *true_pos.entry(sys_entity.tag.as_str()).or_insert(0) += 1;
                break;
            }
        }
    }
    assemble_counts(&tag_totals(gold), &tag_totals(system), &true_pos)
}

/// Counts the agreement between two sets of relations, per relation label.
///
/// Two relations are paired when both their arguments are equal, whatever
/// their labels. A pair only counts as an agreement when the labels are
/// equal too; a pair with different labels costs a false positive to the
/// system label and a false negative to the gold label.
pub fn measure_relations(gold: &[Relation], system: &[Relation]) -> BTreeMap<String, Measures> {
    let mut gold_used = vec![false; gold.len()];
    let mut true_pos: AHashMap<&str, usize> = AHashMap::new();
    for sys_relation in system.iter() {
        for (index, gold_relation) in gold.iter().enumerate() {
            if gold_used[index] {
                continue;
            }
            if sys_relation.arg1 == gold_relation.arg1 && sys_relation.arg2 == gold_relation.arg2 {
                gold_used[index] = true;
                if sys_relation.relation == gold_relation.relation {
                    *true_pos
                        .entry(sys_relation.relation.as_str())
                        .or_insert(0) += 1;
                }
                break;
            }
        }
    }
    let gold_totals = relation_totals(gold);
    let system_totals = relation_totals(system);
    assemble_counts(&gold_totals, &system_totals, &true_pos)
}

/// Adds the counts of `right` into `left`, tag by tag.
pub fn merge_measures(
    left: BTreeMap<String, Measures>,
    right: BTreeMap<String, Measures>,
) -> BTreeMap<String, Measures> {
    let mut merged = left;
    for (tag, counts) in right {
        *merged.entry(tag).or_default() += counts;
    }
    merged
}

/// Counts entity agreement over every pair of documents sharing a name in
/// the two datasets, summing the counts per tag. Documents present in only
/// one dataset are ignored.
pub fn measure_entity_dataset(
    gold: &Dataset,
    system: &Dataset,
    mode: MatchMode,
) -> BTreeMap<String, Measures> {
    zip_documents(gold, system)
        .into_iter()
        .map(|(gold_doc, sys_doc)| {
            measure_entities(
                &gold_doc.annotations.entities,
                &sys_doc.annotations.entities,
                mode,
            )
        })
        .fold(BTreeMap::new(), merge_measures)
}

/// Counts relation agreement over every pair of documents sharing a name in
/// the two datasets, summing the counts per label.
pub fn measure_relation_dataset(gold: &Dataset, system: &Dataset) -> BTreeMap<String, Measures> {
    zip_documents(gold, system)
        .into_iter()
        .map(|(gold_doc, sys_doc)| {
            measure_relations(&gold_doc.annotations.relations, &sys_doc.annotations.relations)
        })
        .fold(BTreeMap::new(), merge_measures)
}

fn strict_keys<E: Borrow<Entity>>(entities: &[E]) -> AHashMap<(&str, usize, usize), usize> {
    let mut keys = AHashMap::new();
    for entity in entities.iter() {
        let entity = entity.borrow();
        *keys
            .entry((entity.tag.as_str(), entity.start(), entity.end()))
            .or_insert(0) += 1;
    }
    keys
}

fn tag_totals<E: Borrow<Entity>>(entities: &[E]) -> AHashMap<&str, usize> {
    let mut totals = AHashMap::new();
    for entity in entities.iter() {
        *totals.entry(entity.borrow().tag.as_str()).or_insert(0) += 1;
    }
    totals
}

fn relation_totals(relations: &[Relation]) -> AHashMap<&str, usize> {
    let mut totals = AHashMap::new();
    for relation in relations.iter() {
        *totals.entry(relation.relation.as_str()).or_insert(0) += 1;
    }
    totals
}

/// Derives the false counts from the totals of both sides. Every true
/// positive consumes one annotation on each side, so the leftovers are the
/// false positives and false negatives of the tag.
fn assemble_counts(
    gold_totals: &AHashMap<&str, usize>,
    system_totals: &AHashMap<&str, usize>,
    true_pos: &AHashMap<&str, usize>,
) -> BTreeMap<String, Measures> {
    let tags: BTreeSet<&str> = gold_totals
        .keys()
        .chain(system_totals.keys())
        .copied()
        .collect();
    let mut counts = BTreeMap::new();
    for tag in tags {
        let tp = true_pos.get(tag).copied().unwrap_or(0);
        let gold_total = gold_totals.get(tag).copied().unwrap_or(0);
        let system_total = system_totals.get(tag).copied().unwrap_or(0);
        debug_assert!(tp <= gold_total && tp <= system_total);
        counts.insert(
            tag.to_string(),
            Measures::new(
                tp,
                system_total.saturating_sub(tp),
                0,
                gold_total.saturating_sub(tp),
            ),
        );
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use standoff_parsing::{Document, Standoff};
    use std::path::PathBuf;
    use std::rc::Rc;

    #[test]
    fn test_strict_counts_on_mixed_tags() {
        let gold = vec![
            ent("A", 1, 2),
            ent("B", 3, 4),
            ent("A", 5, 6),
            ent("C", 7, 8),
            ent("C", 9, 10),
        ];
        let system = vec![
            ent("B", 1, 2),
            ent("B", 3, 4),
            ent("C", 9, 10),
            ent("D", 11, 12),
            ent("A", 13, 14),
        ];
        let expected = BTreeMap::from([
            (String::from("A"), Measures::new(0, 1, 0, 2)),
            (String::from("B"), Measures::new(1, 1, 0, 0)),
            (String::from("C"), Measures::new(1, 0, 0, 1)),
            (String::from("D"), Measures::new(0, 1, 0, 0)),
        ]);
        let actual = measure_entities(&gold, &system, MatchMode::Strict);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_lenient_counts_overlapping_mentions() {
        let gold = vec![ent("A", 0, 5), ent("B", 10, 12)];
        let system = vec![ent("A", 3, 8), ent("B", 12, 14)];
        let expected = BTreeMap::from([
            (String::from("A"), Measures::new(1, 0, 0, 0)),
            (String::from("B"), Measures::new(0, 1, 0, 1)),
        ]);
        let actual = measure_entities(&gold, &system, MatchMode::Lenient);
        assert_eq!(expected, actual);
        // The same annotations disagree on the exact boundaries of A.
        let expected = BTreeMap::from([
            (String::from("A"), Measures::new(0, 1, 0, 1)),
            (String::from("B"), Measures::new(0, 1, 0, 1)),
        ]);
        let actual = measure_entities(&gold, &system, MatchMode::Strict);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_each_gold_entity_agrees_at_most_once() {
        let gold = vec![ent("A", 0, 10)];
        let system = vec![ent("A", 0, 3), ent("A", 4, 6)];
        let expected = BTreeMap::from([(String::from("A"), Measures::new(1, 1, 0, 0))]);
        let actual = measure_entities(&gold, &system, MatchMode::Lenient);
        assert_eq!(expected, actual);

        let gold = vec![ent("A", 0, 3), ent("A", 4, 6)];
        let system = vec![ent("A", 0, 10)];
        let expected = BTreeMap::from([(String::from("A"), Measures::new(1, 0, 0, 1))]);
        let actual = measure_entities(&gold, &system, MatchMode::Lenient);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_adjacent_entities_never_match_leniently() {
        let left = ent("A", 0, 5);
        assert!(!entities_match(&left, &ent("A", 5, 10), MatchMode::Lenient));
        assert!(entities_match(&left, &ent("A", 4, 9), MatchMode::Lenient));
        assert!(!entities_match(&left, &ent("B", 0, 5), MatchMode::Lenient));
    }

    #[test]
    fn test_relation_counts_on_argument_structure() {
        let ents = vec![
            ent("A", 1, 2),
            ent("B", 3, 4),
            ent("A", 5, 6),
            ent("C", 7, 8),
            ent("C", 9, 10),
            ent("C", 11, 12),
            ent("C", 13, 14),
        ];
        let gold = vec![
            rel("A", &ents[0], &ents[1]),
            rel("B", &ents[2], &ents[3]),
            rel("B", &ents[4], &ents[5]),
            rel("C", &ents[5], &ents[6]),
        ];
        let system = vec![
            rel("A", &ents[0], &ents[1]),
            rel("B", &ents[4], &ents[3]),
            rel("C", &ents[5], &ents[6]),
        ];
        let expected = BTreeMap::from([
            (String::from("A"), Measures::new(1, 0, 0, 0)),
            (String::from("B"), Measures::new(0, 1, 0, 2)),
            (String::from("C"), Measures::new(1, 0, 0, 0)),
        ]);
        let actual = measure_relations(&gold, &system);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_relabeled_relation_consumes_the_gold_pair() {
        let ents = vec![ent("A", 1, 2), ent("B", 3, 4)];
        let gold = vec![rel("X", &ents[0], &ents[1])];
        let system = vec![rel("Y", &ents[0], &ents[1])];
        let expected = BTreeMap::from([
            (String::from("X"), Measures::new(0, 0, 0, 1)),
            (String::from("Y"), Measures::new(0, 1, 0, 0)),
        ]);
        let actual = measure_relations(&gold, &system);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_merging_adds_counts_per_tag() {
        let left = BTreeMap::from([
            (String::from("A"), Measures::new(1, 0, 0, 1)),
            (String::from("B"), Measures::new(2, 1, 0, 0)),
        ]);
        let right = BTreeMap::from([
            (String::from("B"), Measures::new(0, 1, 0, 3)),
            (String::from("C"), Measures::new(4, 0, 0, 0)),
        ]);
        let expected = BTreeMap::from([
            (String::from("A"), Measures::new(1, 0, 0, 1)),
            (String::from("B"), Measures::new(2, 2, 0, 3)),
            (String::from("C"), Measures::new(4, 0, 0, 0)),
        ]);
        let actual = merge_measures(left, right);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_dataset_counts_sum_over_paired_documents() {
        let gold = dataset(vec![
            doc("first", vec![ent("A", 1, 2), ent("B", 3, 4)]),
            doc("second", vec![ent("A", 5, 6), ent("A", 7, 8)]),
            doc("gold_only", vec![ent("C", 0, 9)]),
        ]);
        let system = dataset(vec![
            doc("first", vec![ent("A", 1, 2), ent("B", 9, 10)]),
            doc("second", vec![ent("A", 5, 6)]),
        ]);
        let expected = BTreeMap::from([
            (String::from("A"), Measures::new(2, 0, 0, 1)),
            (String::from("B"), Measures::new(0, 1, 0, 1)),
        ]);
        let actual = measure_entity_dataset(&gold, &system, MatchMode::Strict);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_parsing_modes_from_strings() {
        let expected = Ok(MatchMode::Lenient);
        let actual = MatchMode::from_str("lenient");
        assert_eq!(expected, actual);
        let error = MatchMode::from_str("fuzzy").unwrap_err();
        let expected = "mode must be 'strict' or 'lenient', got 'fuzzy'";
        assert_eq!(expected, error.to_string());
    }

    #[test]
    fn prop_strict_counting_matches_greedy_pairing() {
        fn prop(gold_raw: Vec<(u8, u8, u8)>, system_raw: Vec<(u8, u8, u8)>) -> bool {
            let gold = build_entities(gold_raw);
            let system = build_entities(system_raw);
            let shortcut = measure_entities(&gold, &system, MatchMode::Strict);
            let greedy = measure_entities_pairwise(&gold, &system, MatchMode::Strict);
            shortcut == greedy
        }
        quickcheck(prop as fn(Vec<(u8, u8, u8)>, Vec<(u8, u8, u8)>) -> bool);
    }

    #[test]
    fn prop_agreements_and_misses_cover_every_gold_entity() {
        fn prop(gold_raw: Vec<(u8, u8, u8)>, system_raw: Vec<(u8, u8, u8)>) -> bool {
            let gold = build_entities(gold_raw);
            let system = build_entities(system_raw);
            enum_iterator::all::<MatchMode>().all(|mode| {
                let counts = measure_entities(&gold, &system, mode);
                counts.iter().all(|(tag, measures)| {
                    let gold_total = gold.iter().filter(|e| &e.tag == tag).count();
                    measures.true_pos + measures.false_neg == gold_total
                })
            })
        }
        quickcheck(prop as fn(Vec<(u8, u8, u8)>, Vec<(u8, u8, u8)>) -> bool);
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

    fn build_entities(raw: Vec<(u8, u8, u8)>) -> Vec<Rc<Entity>> {
        let tags = ["A", "B", "C"];
        raw.into_iter()
            .map(|(tag, start, length)| {
                let start = usize::from(start % 8);
                let end = start + 1 + usize::from(length % 3);
                ent(tags[usize::from(tag) % tags.len()], start, end)
            })
            .collect()
    }
}
