/*!
This library computes inter-annotator agreement for brat standoff
annotation data. It parses pairs of `.ann` files produced by two annotators
over the same documents and reports how often they agree, per annotation
tag, using the usual precision, recall and fscore metrics.

# Annotations
The standoff format is parsed by the `standoff_parsing` crate, whose main
types are re-exported here. The calculators of this crate compare two kinds
of annotations:
* Entities: a tag attached to one or more spans of the document text, such
    as a drug name or an adverse reaction.
* Relations: a label linking two entities, such as which drug caused a
    reaction.

# Pairing modes
Agreement between entities can be counted in two modes:
* Strict: two entities agree when they carry the same tag and cover exactly
    the same range of the text.
* Lenient: two entities agree when they carry the same tag and their ranges
    overlap by at least one character.

Relations always pair on their arguments: both entities must be equal on
both sides. A pair of relations whose labels differ is not an agreement,
but it consumes both relations, costing a false positive and a false
negative.

# Terminology
* The gold annotator is the reference; the system annotator is the one
    being evaluated. Swapping them swaps precision and recall.
* The support of a tag is the number of gold annotations carrying it.
* Unpaired annotations appear under the reserved `NONE` label in confusion
    matrices.
*/

mod config;
mod confusion;
mod matching;
mod measures;
mod reporter;
mod scores;

// The public api starts here
pub use standoff_parsing::{Dataset, Document, Entity, Relation, Standoff};

pub use config::{AgreementConfig, AgreementConfigBuilder, DefaultAgreementConfig};

pub use confusion::{
    entity_confusion, entity_confusion_dataset, relation_confusion, relation_confusion_dataset,
    ConfusionTable, NONE_LABEL,
};

pub use matching::{
    entities_match, measure_entities, measure_entity_dataset, measure_relation_dataset,
    measure_relations, merge_measures, InvalidModeError, MatchMode,
};

pub use measures::{BetaNotPositiveError, Measures};

pub use reporter::{Average, AverageParsingError, OverallAverage, ScoreReport, TagMetrics};

pub use scores::{
    agreement_report, precision_recall_fscore_support, FloatExt, PrecisionRecallFScoreSupport,
    ScoreError,
};

/// Computes the entity agreement report of two versions of one document.
///
/// * `gold`: document of the reference annotator.
/// * `system`: document of the annotator being evaluated.
/// * `mode`: how entities are paired.
/// * `beta`: Value of the `beta` parameter of the fscore.
/// * `decimals`: How many decimals to print when formatting the report.
/// * `weighted`: Do we also report the support-weighted average?
/// * `parallel`: Can we use multiple cores for computations?
pub fn entity_agreement_report(
    gold: &Document,
    system: &Document,
    mode: MatchMode,
    beta: f64,
    decimals: usize,
    weighted: bool,
    parallel: bool,
) -> Result<ScoreReport, ScoreError> {
    let counts = measure_entities(
        &gold.annotations.entities,
        &system.annotations.entities,
        mode,
    );
    agreement_report(&counts, beta, decimals, weighted, parallel)
}

/// Computes the entity agreement report of two versions of one document.
/// Instead of taking in the raw parameters, this function takes an
/// `AgreementConfig` struct and uses sensible defaults.
///
/// * `gold`: document of the reference annotator.
/// * `system`: document of the annotator being evaluated.
/// * `config`: Parameters used to compute the agreement scores.
///
/// #Example
/// ```rust
/// use rubrat::{entity_agreement_report_conf, AgreementConfigBuilder, DefaultAgreementConfig,
///     MatchMode};
/// use standoff_parsing::Document;
///
/// let gold = Document::from_standoff(
///     "note", "T1\tDrug 0 5\tadvil\nT2\tReaction 10 14\trash\n").unwrap();
/// let system = Document::from_standoff(
///     "note", "T1\tDrug 0 5\tadvil\nT2\tReaction 15 19\titch\n").unwrap();
/// let config: DefaultAgreementConfig =
/// AgreementConfigBuilder::default().mode(MatchMode::Strict).build();
///
/// let report = entity_agreement_report_conf(&gold, &system, config).unwrap();
/// let expected_report = "Tag, Precision, Recall, Fscore, Support
/// Drug, 1.000, 1.000, 1.000, 1
/// Reaction, 0.000, 0.000, 0.000, 1
/// (macro), 0.500, 0.500, 0.500, 2
/// (micro), 0.500, 0.500, 0.500, 2\n";
///
/// assert_eq!(expected_report, report.to_string());
/// ```
pub fn entity_agreement_report_conf<Mode: Into<MatchMode>>(
    gold: &Document,
    system: &Document,
    config: AgreementConfig<Mode>,
) -> Result<ScoreReport, ScoreError> {
    let (mode, beta, decimals, weighted, _include_none, parallel) = config.into();
    entity_agreement_report(gold, system, mode, beta, decimals, weighted, parallel)
}

/// Computes the relation agreement report of two versions of one document.
/// Relations are paired on their arguments, so there is no pairing mode to
/// choose.
pub fn relation_agreement_report(
    gold: &Document,
    system: &Document,
    beta: f64,
    decimals: usize,
    weighted: bool,
    parallel: bool,
) -> Result<ScoreReport, ScoreError> {
    let counts = measure_relations(&gold.annotations.relations, &system.annotations.relations);
    agreement_report(&counts, beta, decimals, weighted, parallel)
}

/// Computes the relation agreement report of two versions of one document,
/// taking its parameters from an `AgreementConfig`.
pub fn relation_agreement_report_conf<Mode: Into<MatchMode>>(
    gold: &Document,
    system: &Document,
    config: AgreementConfig<Mode>,
) -> Result<ScoreReport, ScoreError> {
    let (_mode, beta, decimals, weighted, _include_none, parallel) = config.into();
    relation_agreement_report(gold, system, beta, decimals, weighted, parallel)
}

/// Computes one entity agreement report for a whole pair of datasets. The
/// counts of every pair of documents sharing a name are summed per tag
/// before computing the scores.
pub fn entity_dataset_agreement_report(
    gold: &Dataset,
    system: &Dataset,
    mode: MatchMode,
    beta: f64,
    decimals: usize,
    weighted: bool,
    parallel: bool,
) -> Result<ScoreReport, ScoreError> {
    let counts = measure_entity_dataset(gold, system, mode);
    agreement_report(&counts, beta, decimals, weighted, parallel)
}

/// Computes one relation agreement report for a whole pair of datasets.
pub fn relation_dataset_agreement_report(
    gold: &Dataset,
    system: &Dataset,
    beta: f64,
    decimals: usize,
    weighted: bool,
    parallel: bool,
) -> Result<ScoreReport, ScoreError> {
    let counts = measure_relation_dataset(gold, system);
    agreement_report(&counts, beta, decimals, weighted, parallel)
}
