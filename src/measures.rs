/*!
This module contains the `Measures` struct, which counts the outcomes of
comparing one annotator against another for a single tag. Every calculator
of this crate produces `Measures` and every score is derived from them.
*/
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counts of true positives, false positives, true negatives and false
/// negatives accumulated while pairing two sets of annotations. Counts from
/// different files can be added together before computing scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Measures {
    pub true_pos: usize,
    pub false_pos: usize,
    pub true_neg: usize,
    pub false_neg: usize,
}

impl Measures {
    pub fn new(true_pos: usize, false_pos: usize, true_neg: usize, false_neg: usize) -> Self {
        Measures {
            true_pos,
            false_pos,
            true_neg,
            false_neg,
        }
    }

    /// Fraction of the system annotations that agree with the gold ones.
    /// Returns 0 when the system produced no annotation at all.
    pub fn precision(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }

    /// Fraction of the gold annotations the system agreed with. Returns 0
    /// when there was no gold annotation at all.
    pub fn recall(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }

    /// Harmonic mean of the precision and the recall.
    pub fn f1(&self) -> f64 {
        self.f_score(1.0).unwrap_or(0.0)
    }

    /// Computes the f-score of the counts. Returns 0 whenever the formula
    /// would divide by zero.
    ///
    /// * `beta`: relative weight given to recall over precision. Must be a
    ///   positive number; `beta = 1.0` gives the usual F1 score.
    pub fn f_score(&self, beta: f64) -> Result<f64, BetaNotPositiveError> {
        if !(beta > 0.0) {
            return Err(BetaNotPositiveError(beta));
        }
        let precision = self.precision();
        let recall = self.recall();
        let beta2 = beta * beta;
        let numerator = (1.0 + beta2) * (precision * recall);
        let denominator = beta2 * (precision + recall);
        if denominator == 0.0 {
            Ok(0.0)
        } else {
            Ok(numerator / denominator)
        }
    }

    pub fn specificity(&self) -> f64 {
        ratio(self.true_neg, self.false_pos + self.true_neg)
    }

    /// Alias of the recall, under its medical name.
    pub fn sensitivity(&self) -> f64 {
        self.recall()
    }

    /// Area under the ROC curve of a single point, that is the mean of the
    /// sensitivity and the specificity.
    pub fn auc(&self) -> f64 {
        (self.sensitivity() + self.specificity()) / 2.0
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.true_pos + self.false_pos + self.true_neg + self.false_neg;
        ratio(self.true_pos + self.true_neg, total)
    }

    /// Number of gold annotations behind these counts.
    pub fn support(&self) -> usize {
        self.true_pos + self.false_neg
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Add for Measures {
    type Output = Measures;
    fn add(self, rhs: Self) -> Self::Output {
        Measures {
            true_pos: self.true_pos + rhs.true_pos,
            false_pos: self.false_pos + rhs.false_pos,
            true_neg: self.true_neg + rhs.true_neg,
            false_neg: self.false_neg + rhs.false_neg,
        }
    }
}

impl AddAssign for Measures {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Measures {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Measures::default(), Add::add)
    }
}

impl Display for Measures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tp: {}, fp: {}, tn: {}, fn: {}",
            self.true_pos, self.false_pos, self.true_neg, self.false_neg
        )
    }
}

/// Error returned when the caller asks for an f-score with a beta that is
/// zero, negative or not a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaNotPositiveError(pub f64);

impl Display for BetaNotPositiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "beta must be positive, got {}", self.0)
    }
}
impl Error for BetaNotPositiveError {}
