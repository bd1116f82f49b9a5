/*
 * This module contains some quality of life structs and alias. Most importantly, it contains the
 * `AgreementConfig` struct, which implements the default trait. This config can be passed to the
 * `*_conf` variants of the report functions to simplify their arguments.
*/
use crate::matching::MatchMode;
use either::Either as LeftOrRight;
use std::fmt::{Debug, Display};

/// Reasonable default configuration when computing agreement.
pub type DefaultAgreementConfig = AgreementConfig<MatchMode>;

impl DefaultAgreementConfig {
    pub fn new() -> Self {
        Self {
            mode: MatchMode::Strict,
            beta: 1.0,
            decimals: 3,
            weighted: false,
            include_none: true,
            parallel: false,
        }
    }
}

impl<Mode> From<(Mode, f64, usize, bool, bool, bool)> for AgreementConfig<Mode>
where
    Mode: Into<MatchMode>,
{
    fn from(value: (Mode, f64, usize, bool, bool, bool)) -> Self {
        Self {
            mode: value.0,
            beta: value.1,
            decimals: value.2,
            weighted: value.3,
            include_none: value.4,
            parallel: value.5,
        }
    }
}

impl<Mode> From<AgreementConfigBuilder<Mode>> for AgreementConfig<MatchMode>
where
    Mode: Into<MatchMode>,
{
    fn from(value: AgreementConfigBuilder<Mode>) -> Self {
        Self {
            mode: value.mode.either_into(),
            beta: value.beta,
            decimals: value.decimals,
            weighted: value.weighted,
            include_none: value.include_none,
            parallel: value.parallel,
        }
    }
}

impl<Mode> From<AgreementConfig<Mode>> for (MatchMode, f64, usize, bool, bool, bool)
where
    Mode: Into<MatchMode>,
{
    fn from(value: AgreementConfig<Mode>) -> Self {
        (
            value.mode.into(),
            value.beta,
            value.decimals,
            value.weighted,
            value.include_none,
            value.parallel,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Config struct used to simplify the inputs of parameters to the main functions of `Rubrat`. It
/// implements the default trait.
pub struct AgreementConfig<Mode>
where
    Mode: Into<MatchMode>,
{
    /// How entities are paired: on their exact boundaries or on any overlap.
    /// Relations always pair on their exact arguments.
    mode: Mode,
    /// Value of the `beta` parameter of the fscore. `beta=1` for F1 and `beta=0.5` for F0.5.
    beta: f64,
    /// How many decimals the report prints when formatting floats.
    decimals: usize,
    /// Do we also report the support-weighted average? The micro and macro averages are always
    /// reported.
    weighted: bool,
    /// Do unpaired annotations get a `NONE` row and column in confusion matrices?
    include_none: bool,
    /// Can we use multiple cores to compute the scores? This option should be benched. In
    /// practice, most benchmarks show that it is better to *not* parallelize the computations.
    parallel: bool,
}

impl Default for DefaultAgreementConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl<Mode> Display for AgreementConfig<Mode>
where
    Mode: Into<MatchMode> + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Pairing mode: {:?}\n Beta parameter of the fscore: {}\n Decimals printed in reports: {}\n Reporting the weighted average: {}\n Keeping unpaired annotations in confusion matrices: {}\n Using parallel computations: {}", self.mode, self.beta, self.decimals, self.weighted, self.include_none, self.parallel);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize an `AgreementConfig` structure.
pub struct AgreementConfigBuilder<Mode>
where
    Mode: Into<MatchMode>,
{
    mode: LeftOrRight<Mode, MatchMode>,
    beta: f64,
    decimals: usize,
    weighted: bool,
    include_none: bool,
    parallel: bool,
}

impl Default for AgreementConfigBuilder<MatchMode> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Mode> AgreementConfigBuilder<Mode>
where
    Mode: Into<MatchMode>,
{
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = LeftOrRight::Left(mode);
        self
    }
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }
    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }
    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }
    pub fn include_none(mut self, include_none: bool) -> Self {
        self.include_none = include_none;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        Self {
            mode: LeftOrRight::Right(MatchMode::Strict),
            beta: 1.0,
            decimals: 3,
            weighted: false,
            include_none: true,
            parallel: false,
        }
    }
    pub fn build(self) -> AgreementConfig<MatchMode> {
        AgreementConfig::from(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MatchMode::Strict)]
    #[case(MatchMode::Lenient)]
    fn test_builder_setters_mode(#[case] mode: MatchMode) {
        let builder = AgreementConfigBuilder::default();
        let config = builder.mode(mode).build();
        assert_eq!(config.mode, mode)
    }

    #[rstest]
    #[case(0.5)]
    #[case(1.0)]
    #[case(2.0)]
    fn test_builder_setters_beta(#[case] beta: f64) {
        let builder = AgreementConfigBuilder::default();
        let config = builder.beta(beta).build();
        assert_eq!(config.beta, beta)
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(10)]
    fn test_builder_setters_decimals(#[case] decimals: usize) {
        let builder = AgreementConfigBuilder::default();
        let config = builder.decimals(decimals).build();
        assert_eq!(config.decimals, decimals)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_weighted(#[case] weighted: bool) {
        let builder = AgreementConfigBuilder::default();
        let config = builder.weighted(weighted).build();
        assert_eq!(config.weighted, weighted)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_include_none(#[case] include_none: bool) {
        let builder = AgreementConfigBuilder::default();
        let config = builder.include_none(include_none).build();
        assert_eq!(config.include_none, include_none)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let builder = AgreementConfigBuilder::default();
        let config = builder.parallel(parallel).build();
        assert_eq!(config.parallel, parallel)
    }

    #[test]
    fn test_default_config_values() {
        let config = DefaultAgreementConfig::default();
        let expected = (MatchMode::Strict, 1.0, 3, false, true, false);
        let actual: (MatchMode, f64, usize, bool, bool, bool) = config.into();
        assert_eq!(expected, actual)
    }
}
