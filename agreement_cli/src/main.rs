/*!
Command line front end for the Rubrat agreement calculators. Every subcommand accepts
either two `.ann` files or two directories of them: files are compared as single
documents, directories are paired by file name and compared as datasets.
*/
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rubrat::{
    entity_agreement_report, entity_confusion, entity_confusion_dataset,
    entity_dataset_agreement_report, relation_agreement_report, relation_confusion,
    relation_confusion_dataset, relation_dataset_agreement_report, MatchMode, ScoreError,
};
use standoff_parsing::{
    validate_dataset, validate_document, Dataset, DatasetError, Document, DocumentError,
};

#[derive(Parser)]
#[command(name = "rubrat")]
#[command(version, about = "Agreement scores for brat standoff annotations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the agreement of two annotators on entities
    Entities {
        /// Gold annotations, a `.ann` file or a directory of them
        gold: PathBuf,
        /// System annotations, the same kind of path as the gold ones
        system: PathBuf,
        /// How entities are paired
        #[arg(short, long, default_value = "strict")]
        mode: MatchMode,
        /// Weight of recall in the f-score
        #[arg(short, long, default_value_t = 1.0)]
        beta: f64,
        /// Number of decimals in the printed scores
        #[arg(short, long, default_value_t = 3)]
        decimals: usize,
        /// Also report the support-weighted average
        #[arg(short, long)]
        weighted: bool,
        /// Compute the scores on multiple cores
        #[arg(long)]
        parallel: bool,
    },
    /// Score the agreement of two annotators on relations
    Relations {
        /// Gold annotations, a `.ann` file or a directory of them
        gold: PathBuf,
        /// System annotations, the same kind of path as the gold ones
        system: PathBuf,
        /// Weight of recall in the f-score
        #[arg(short, long, default_value_t = 1.0)]
        beta: f64,
        /// Number of decimals in the printed scores
        #[arg(short, long, default_value_t = 3)]
        decimals: usize,
        /// Also report the support-weighted average
        #[arg(short, long)]
        weighted: bool,
        /// Compute the scores on multiple cores
        #[arg(long)]
        parallel: bool,
    },
    /// Print the label confusion table of two annotators
    Confusion {
        /// Gold annotations, a `.ann` file or a directory of them
        gold: PathBuf,
        /// System annotations, the same kind of path as the gold ones
        system: PathBuf,
        /// Which annotations to pair
        #[arg(value_enum, short, long, default_value = "entities")]
        kind: Kind,
        /// Count unpaired annotations under a NONE row and column
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        include_none: bool,
    },
    /// Check that entity mentions match the text their spans cover
    Validate {
        /// A `.ann` file or a directory of them
        input: PathBuf,
        /// Print the mismatching entities only
        #[arg(long)]
        invalid_only: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Entities,
    Relations,
}

/// The two inputs of a comparison, loaded either as single documents or as whole
/// directories.
enum InputPair {
    Documents(Box<(Document, Document)>),
    Datasets(Box<(Dataset, Dataset)>),
}

#[derive(Debug)]
enum CliError {
    Document(DocumentError),
    Dataset(DatasetError),
    Score(ScoreError),
    InputNotFound(PathBuf),
    MixedInputs { gold: PathBuf, system: PathBuf },
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{}", err),
            Self::Dataset(err) => write!(f, "{}", err),
            Self::Score(err) => write!(f, "{}", err),
            Self::InputNotFound(path) => {
                write!(f, "'{}' is not a file or directory", path.display())
            }
            Self::MixedInputs { gold, system } => write!(
                f,
                "expected two `.ann` files or two directories of them, got '{}' and '{}'",
                gold.display(),
                system.display()
            ),
        }
    }
}

impl std::error::Error for CliError {}

impl From<DocumentError> for CliError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<DatasetError> for CliError {
    fn from(value: DatasetError) -> Self {
        Self::Dataset(value)
    }
}

impl From<ScoreError> for CliError {
    fn from(value: ScoreError) -> Self {
        Self::Score(value)
    }
}

fn load_pair(gold: &Path, system: &Path) -> Result<InputPair, CliError> {
    for path in [gold, system] {
        if !path.is_dir() && !path.is_file() {
            return Err(CliError::InputNotFound(path.to_path_buf()));
        }
    }
    if gold.is_dir() && system.is_dir() {
        let pair = (Dataset::from_directory(gold)?, Dataset::from_directory(system)?);
        Ok(InputPair::Datasets(Box::new(pair)))
    } else if gold.is_file() && system.is_file() {
        let pair = (Document::from_ann_path(gold)?, Document::from_ann_path(system)?);
        Ok(InputPair::Documents(Box::new(pair)))
    } else {
        Err(CliError::MixedInputs {
            gold: gold.to_path_buf(),
            system: system.to_path_buf(),
        })
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Entities {
            gold,
            system,
            mode,
            beta,
            decimals,
            weighted,
            parallel,
        } => {
            let report = match load_pair(&gold, &system)? {
                InputPair::Documents(pair) => entity_agreement_report(
                    &pair.0, &pair.1, mode, beta, decimals, weighted, parallel,
                )?,
                InputPair::Datasets(pair) => entity_dataset_agreement_report(
                    &pair.0, &pair.1, mode, beta, decimals, weighted, parallel,
                )?,
            };
            print!("{}", report);
        }
        Commands::Relations {
            gold,
            system,
            beta,
            decimals,
            weighted,
            parallel,
        } => {
            let report = match load_pair(&gold, &system)? {
                InputPair::Documents(pair) => {
                    relation_agreement_report(&pair.0, &pair.1, beta, decimals, weighted, parallel)?
                }
                InputPair::Datasets(pair) => relation_dataset_agreement_report(
                    &pair.0, &pair.1, beta, decimals, weighted, parallel,
                )?,
            };
            print!("{}", report);
        }
        Commands::Confusion {
            gold,
            system,
            kind,
            include_none,
        } => {
            let table = match (load_pair(&gold, &system)?, kind) {
                (InputPair::Documents(pair), Kind::Entities) => entity_confusion(
                    &pair.0.annotations.entities,
                    &pair.1.annotations.entities,
                    include_none,
                ),
                (InputPair::Documents(pair), Kind::Relations) => relation_confusion(
                    &pair.0.annotations.relations,
                    &pair.1.annotations.relations,
                    include_none,
                ),
                (InputPair::Datasets(pair), Kind::Entities) => {
                    entity_confusion_dataset(&pair.0, &pair.1, include_none)
                }
                (InputPair::Datasets(pair), Kind::Relations) => {
                    relation_confusion_dataset(&pair.0, &pair.1, include_none)
                }
            };
            print!("{}", table);
        }
        Commands::Validate {
            input,
            invalid_only,
        } => {
            if input.is_dir() {
                let dataset = Dataset::from_directory(&input)?;
                for (name, entity, matches) in validate_dataset(&dataset, invalid_only)? {
                    println!("{}\t{}\t{:?}\t{}", name, entity.tag, entity.mention, matches);
                }
            } else if input.is_file() {
                let document = Document::from_ann_path(&input)?;
                let flags = validate_document(&document)?;
                for (entity, matches) in document.annotations.entities.iter().zip(flags) {
                    if invalid_only && matches {
                        continue;
                    }
                    println!(
                        "{}\t{}\t{:?}\t{}",
                        document.name, entity.tag, entity.mention, matches
                    );
                }
            } else {
                return Err(CliError::InputNotFound(input));
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
