/*!
This module turns agreement counts into precision, recall, fscore and
support values. The counts of every tag are laid out in arrays so that the
same masked divisions compute the per-tag scores and the overall averages.
Any division by zero yields a score of zero for the tag.
*/
use crate::measures::Measures;
use crate::reporter::{Average, OverallAverage, ScoreReport, TagMetricsInner};
use itertools::multizip;
use ndarray::{prelude::*, Array, Data, ScalarOperand, Zip};
use ndarray_stats::{errors::MultiInputError, SummaryStatisticsExt};
use num::{Float, FromPrimitive, Num};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Debug, Display};

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNotUniqueOrEmpty(usize);

impl Display for ArrayNotUniqueOrEmpty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "This array should contain exactly one element, but has length: {}. Cannot call `item` on it",
            self.0
        )
    }
}
impl Error for ArrayNotUniqueOrEmpty {}

trait ItemArrayExt<Output> {
    /// Returns the single element of the array. Returns an error if the
    /// array is empty or holds more than one element.
    fn item(&self) -> Result<Output, ArrayNotUniqueOrEmpty> {
        match self.length() {
            1 => Ok(self.get_first()),
            n => Err(ArrayNotUniqueOrEmpty(n)),
        }
    }
    /// Returns the length of the array.
    fn length(&self) -> usize;
    /// Gets the first element of the array.
    fn get_first(&self) -> Output;
}

impl<F: Clone, T: Data<Elem = F>> ItemArrayExt<F> for ArrayBase<T, Dim<[usize; 1]>> {
    fn length(&self) -> usize {
        self.len()
    }
    fn get_first(&self) -> F {
        self.first().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing the failures that can happen when computing the
/// precision, recall, fscore and support of agreement counts.
pub enum ScoreError {
    BetaNotPositive,
    EmptyCounts,
    InputError(MultiInputError),
    EmptyArray(String),
    EmptyOrNotUnique(ArrayNotUniqueOrEmpty),
}

impl Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BetaNotPositive => write!(f, "Beta value is not positive"),
            Self::EmptyCounts => write!(f, "Received an empty map of counts"),
            Self::InputError(input_err) => std::fmt::Display::fmt(&input_err, f),
            Self::EmptyArray(which) => write!(f, "Found an empty array in {}", which),
            Self::EmptyOrNotUnique(size_err) => std::fmt::Display::fmt(size_err, f),
        }
    }
}
impl Error for ScoreError {}

impl From<MultiInputError> for ScoreError {
    fn from(value: MultiInputError) -> Self {
        Self::InputError(value)
    }
}

impl From<ArrayNotUniqueOrEmpty> for ScoreError {
    fn from(value: ArrayNotUniqueOrEmpty) -> Self {
        Self::EmptyOrNotUnique(value)
    }
}

/// Internal extension trait for Num's Float trait
pub trait FloatExt: Float + FromPrimitive + Send + Sync + Clone + ScalarOperand + Debug {}

impl<T: Float + FromPrimitive + Send + Sync + Clone + Copy + ScalarOperand + Debug> FloatExt for T {}

/// Divides the numerator by the denominator, element by element, and zeroes
/// out every position where the denominator was zero.
fn prf_divide<I: Debug + Num + Clone + Send + Sync + Copy, D: Dimension>(
    numerator: ArcArray<I, D>,
    denominator: ArrayViewMut<I, D>,
    parallel: bool,
) -> ArcArray<I, D> {
    let (result, zero_mask) = if parallel {
        par_prf_divide_results_and_mask(numerator, denominator)
    } else {
        prf_divide_results_and_mask(numerator, denominator)
    };
    result * zero_mask
}

/// This function computes the result in parallel. For a synchronous
/// version of this function, see `prf_divide_results_and_mask`.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn par_prf_divide_results_and_mask<I: Debug + Num + Clone + Send + Sync, D: Dimension>(
    numerator: ArcArray<I, D>,
    mut denominator: ArrayViewMut<I, D>,
) -> (ArcArray<I, D>, Array<I, D>) {
    let zero_at_mask = Zip::from(&mut denominator).par_map_collect(|d| {
        if *d == I::zero() {
            I::zero()
        } else {
            I::one()
        }
    });
    denominator.par_mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / denominator, zero_at_mask)
}

/// This function computes the result synchronously. For a parallel
/// version of this function, see `par_prf_divide_results_and_mask`.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn prf_divide_results_and_mask<I: Debug + Num + Clone, D: Dimension>(
    numerator: ArcArray<I, D>,
    mut denominator: ArrayViewMut<I, D>,
) -> (ArcArray<I, D>, Array<I, D>) {
    let zero_at_mask =
        Zip::from(&mut denominator)
            .map_collect(|d| if *d == I::zero() { I::zero() } else { I::one() });
    denominator.mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / denominator, zero_at_mask)
}

/// Helper function to replace values from an array.
fn replace<Data: PartialEq + Copy, D: Dimension>(
    mut array: ArcArray<Data, D>,
    replaced: Data,
    new_value: Data,
) -> ArcArray<Data, D> {
    array.mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}

/// Helper function to replace values from an array in parallel.
fn par_replace<Data: PartialEq + Send + Sync + Copy, D: Dimension>(
    mut array: ArcArray<Data, D>,
    replaced: Data,
    new_value: Data,
) -> ArcArray<Data, D> {
    array.par_mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}

/// Type alias for representing the output of `precision_recall_fscore_support`.
/// The first array contains the precision, the second the recall, the third
/// the fscore and the last one the support. When an average is requested,
/// each array holds a single element.
pub type PrecisionRecallFScoreSupport<F> = (
    Array<F, Dim<[usize; 1]>>,
    Array<F, Dim<[usize; 1]>>,
    Array<F, Dim<[usize; 1]>>,
    Array<usize, Dim<[usize; 1]>>,
);

fn cast_count<F: FloatExt>(count: usize) -> F {
    F::from(count).expect("Casting from usize to a float should always be possible")
}

/// Lays the counts out in arrays, in the ascending order of the tags. The
/// first array holds the agreements, the second the totals of the system
/// annotator and the third the totals of the gold annotator.
fn count_arrays(
    counts: &BTreeMap<String, Measures>,
) -> (Array1<usize>, Array1<usize>, Array1<usize>) {
    let tp_sum = Array::from_iter(counts.values().map(|m| m.true_pos));
    let pred_sum = Array::from_iter(counts.values().map(|m| m.true_pos + m.false_pos));
    let true_sum = Array::from_iter(counts.values().map(|m| m.support()));
    (tp_sum, pred_sum, true_sum)
}

/// Computes the precision, recall, fscore and support of agreement counts.
/// With `Average::None` the arrays hold one element per tag, in the
/// ascending order of the tags; with any other average they hold a single
/// element.
///
/// * `counts`: agreement counts, one `Measures` per tag.
/// * `beta`: Value of the `beta` parameter of the fscore. `beta=1` for F1
///   and `beta=0.5` for F0.5. Must be positive.
/// * `average`: What type of average to use.
/// * `parallel`: Can we use multiple cores for computations?
pub fn precision_recall_fscore_support<F: FloatExt>(
    counts: &BTreeMap<String, Measures>,
    beta: F,
    average: Average,
    parallel: bool,
) -> Result<PrecisionRecallFScoreSupport<F>, ScoreError> {
    if counts.is_empty() {
        return Err(ScoreError::EmptyCounts);
    }
    if !(beta > F::zero()) {
        return Err(ScoreError::BetaNotPositive);
    };
    let (mut tp_sum, mut pred_sum, mut true_sum) = count_arrays(counts);
    let beta2 = beta.powi(2);
    if matches!(average, Average::Micro) {
        tp_sum = array![tp_sum.sum()];
        pred_sum = array![pred_sum.sum()];
        true_sum = array![true_sum.sum()];
    };
    let arc_tp_sum = tp_sum.mapv(cast_count::<F>).to_shared();
    let precision = prf_divide(
        arc_tp_sum.clone(), // ArcArray are (often) inexpensive to clone. They are in fact `Copy`
        pred_sum.mapv(cast_count::<F>).view_mut(),
        parallel,
    );
    let recall = prf_divide(
        arc_tp_sum,
        true_sum.mapv(cast_count::<F>).view_mut(),
        parallel,
    );
    let f_score: ArcArray<F, Dim<[usize; 1]>> = if beta2.is_infinite() && beta2.is_sign_positive()
    {
        recall.clone()
    } else {
        // The fscore divides (1 + beta^2) * p * r by beta^2 * (p + r). The
        // numerator is zero wherever the denominator is, so replacing the
        // zero denominators by one yields a zero score there.
        let denom = (precision.clone() + recall.view()) * beta2;
        let denom_non_zero = if parallel {
            par_replace(denom, F::zero(), F::one())
        } else {
            replace(denom, F::zero(), F::one())
        };
        let beta2p1 = beta2 + F::one();
        precision.clone() * recall.view() * beta2p1 / denom_non_zero
    };
    match average {
        Average::Weighted => {
            let tmp_weights = true_sum;
            if tmp_weights.sum() == 0 {
                return Ok((
                    array![F::zero()],
                    array![F::zero()],
                    array![F::zero()],
                    array![0],
                ));
            };
            let final_tmp_weights = tmp_weights.mapv(cast_count::<F>).into_shared();
            let final_precision =
                Array::from_vec(vec![precision.weighted_mean(&final_tmp_weights)?]);
            let final_recall = Array::from_vec(vec![recall.weighted_mean(&final_tmp_weights)?]);
            let final_f_score = Array::from_vec(vec![f_score.weighted_mean(&final_tmp_weights)?]);
            let final_true_sum = array![tmp_weights.sum()];
            Ok((final_precision, final_recall, final_f_score, final_true_sum))
        }
        Average::None => {
            let final_precision = precision.into_owned();
            let final_recall = recall.into_owned();
            let final_f_score = f_score.into_owned();
            Ok((final_precision, final_recall, final_f_score, true_sum))
        }
        _ => {
            let final_precision = Array::from_vec(vec![precision
                .mean()
                .ok_or_else(|| ScoreError::EmptyArray(String::from("precision")))?]);
            let final_recall = Array::from_vec(vec![recall
                .mean()
                .ok_or_else(|| ScoreError::EmptyArray(String::from("recall")))?]);
            let final_f_score = Array::from_vec(vec![f_score
                .mean()
                .ok_or_else(|| ScoreError::EmptyArray(String::from("fscore")))?]);
            let final_true_sum = array![true_sum.sum()];
            Ok((final_precision, final_recall, final_f_score, final_true_sum))
        }
    }
}

/// Builds the full agreement report of a map of counts. The report holds
/// one row per tag and one row per overall average. The micro and macro
/// averages are always reported; the weighted average only when asked for.
///
/// * `counts`: agreement counts, one `Measures` per tag.
/// * `beta`: Value of the `beta` parameter of the fscore.
/// * `decimals`: How many decimals to print when formatting the report.
/// * `weighted`: Do we also report the support-weighted average?
/// * `parallel`: Can we use multiple cores for computations?
pub fn agreement_report(
    counts: &BTreeMap<String, Measures>,
    beta: f64,
    decimals: usize,
    weighted: bool,
    parallel: bool,
) -> Result<ScoreReport, ScoreError> {
    let (p, r, f, s) = precision_recall_fscore_support::<f64>(counts, beta, Average::None, parallel)?;
    let mut report = ScoreReport {
        rows: BTreeSet::new(),
        decimals,
    };
    for (tag, precision, recall, fscore, support) in multizip((
        counts.keys(),
        p.into_iter(),
        r.into_iter(),
        f.into_iter(),
        s.into_iter(),
    )) {
        let tmp_metrics = TagMetricsInner::new(
            tag.clone(),
            Average::None,
            precision,
            recall,
            fscore,
            support,
        );
        report.rows.insert(tmp_metrics);
    }
    let overalls = [OverallAverage::Micro, OverallAverage::Macro]
        .into_iter()
        .chain(weighted.then_some(OverallAverage::Weighted));
    for avg in overalls {
        let (p, r, f, s) =
            precision_recall_fscore_support::<f64>(counts, beta, avg.into(), parallel)?;
        let tmp_metrics =
            TagMetricsInner::new_overall(avg, p.item()?, r.item()?, f.item()?, s.item()?);
        report.rows.insert(tmp_metrics);
    }
    Ok(report)
}
