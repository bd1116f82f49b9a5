/*!
This module contains the structures used to report agreement results to the
user. The `ScoreReport` struct is the main abstraction of this module. It
holds one row per annotation tag and one row per overall average, and it
knows how many decimals to print when formatting floats.
*/
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Reports the precision, recall, fscore and support of each tag found in
/// the annotations, along with the overall averages requested by the caller.
/// Its `Display` implementation writes one line per tag, in alphabetical
/// order, followed by the overall rows.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScoreReport {
    pub(crate) rows: BTreeSet<TagMetricsInner>,
    pub(crate) decimals: usize,
}

impl Default for ScoreReport {
    fn default() -> Self {
        ScoreReport {
            rows: BTreeSet::default(),
            decimals: 3,
        }
    }
}

impl Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dec = self.decimals;
        writeln!(f, "Tag, Precision, Recall, Fscore, Support")?;
        // Ascending iteration puts the per-tag rows first and the overall
        // rows last, since `Average::None` sorts below the other variants.
        for row in self.rows.iter() {
            writeln!(
                f,
                "{}, {:.dec$}, {:.dec$}, {:.dec$}, {}",
                row.tag, row.precision, row.recall, row.fscore, row.support
            )?;
        }
        Ok(())
    }
}

impl From<ScoreReport> for HashSet<TagMetrics> {
    fn from(value: ScoreReport) -> Self {
        HashSet::from_iter(value.rows.into_iter().map(TagMetrics::from))
    }
}

/// Public version of the rows contained in a `ScoreReport`. Two `TagMetrics`
/// are equal if they share the same tag and the same average.
#[derive(Debug, Clone)]
pub struct TagMetrics {
    pub tag: String,
    pub average: Average,
    pub precision: f64,
    pub recall: f64,
    pub fscore: f64,
    pub support: usize,
}

impl Hash for TagMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        self.average.hash(state);
    }
}

impl PartialEq for TagMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.average == other.average
    }
}
impl Eq for TagMetrics {}

impl From<TagMetricsInner> for TagMetrics {
    fn from(value: TagMetricsInner) -> Self {
        TagMetrics {
            tag: value.tag,
            average: value.average,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct TagMetricsInner {
    pub(crate) tag: String,
    pub(crate) average: Average,
    pub(crate) precision: f64,
    pub(crate) recall: f64,
    pub(crate) fscore: f64,
    pub(crate) support: usize,
}

impl TagMetricsInner {
    pub(crate) fn new(
        tag: String,
        average: Average,
        precision: f64,
        recall: f64,
        fscore: f64,
        support: usize,
    ) -> Self {
        TagMetricsInner {
            tag,
            average,
            precision,
            recall,
            fscore,
            support,
        }
    }

    /// Builds an overall row, such as the micro average of every tag. The
    /// tag of the returned row is the display name of the average.
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f64,
        recall: f64,
        fscore: f64,
        support: usize,
    ) -> Self {
        TagMetricsInner {
            tag: average.to_string(),
            average: Average::from(average),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

impl PartialEq for TagMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.average == other.average
    }
}
impl Eq for TagMetricsInner {}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for TagMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.average.partial_cmp(&other.average) {
            Some(Ordering::Equal) | None => self.tag.partial_cmp(&other.tag),
            ord => ord,
        }
    }
}

impl Ord for TagMetricsInner {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Display for TagMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.tag, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Averaging schemes supported when computing overall scores. `None` stands
/// for the per-tag rows, which are not averaged.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, PartialEq, Eq, Sequence)]
pub enum Average {
    None,
    Micro,
    Macro,
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// `Average::None` sorts below every other variant, so that per-tag rows
/// come before the overall rows in a `ScoreReport`. The other variants are
/// not ordered between themselves; the tag of the row breaks the tie.
impl PartialOrd for Average {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Average::None, Average::None) => Some(Ordering::Equal),
            (Average::None, _) => Some(Ordering::Less),
            (_, Average::None) => Some(Ordering::Greater),
            (_, _) => Some(Ordering::Equal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageParsingError(String);

impl Display for AverageParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not parse '{}' into an average; expected one of none, micro, macro or weighted",
            self.0
        )
    }
}
impl Error for AverageParsingError {}

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "None" => Ok(Average::None),
            "micro" | "Micro" => Ok(Average::Micro),
            "macro" | "Macro" => Ok(Average::Macro),
            "weighted" | "Weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(s.to_string())),
        }
    }
}

/// Subset of the averaging schemes that can appear as an overall row in a
/// report. Their display names are parenthesized so that they cannot collide
/// with an annotation tag.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, PartialEq, Eq, Sequence)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallAverage::Micro => write!(f, "(micro)"),
            OverallAverage::Macro => write!(f, "(macro)"),
            OverallAverage::Weighted => write!(f, "(weighted)"),
        }
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}
