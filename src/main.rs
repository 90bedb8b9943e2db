use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use rankstep_io::{
    DEFAULT_LABEL_COLUMN, DatasetReader, ExperimentName, LabeledTable, ResultWriter,
    RunParameters, write_dataset,
};
use rankstep_rf::{RandomForestConfig, SplitCriterion};
use rankstep_select::{
    FeatureStepResult, FeatureStepSearch, FeatureSteps, Mcc, ScoreFile, StratifiedKFold,
    make_classification, select_features,
};

#[derive(Parser)]
#[command(name = "rankstep")]
#[command(about = "Repeated stratified cross-validation of nested top-k feature subsets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Random Forest parameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Split criterion: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    criterion: String,
}

#[derive(Subcommand)]
enum Command {
    /// Score nested top-k feature subsets with repeated stratified CV
    Evaluate {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Name of the +1/-1 label column
        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,

        /// Number of CV repetitions
        #[arg(long, default_value_t = 10)]
        repetitions: usize,

        /// Number of folds per repetition
        #[arg(long, default_value_t = 5)]
        folds: usize,

        /// Comma-separated, strictly ascending feature counts (e.g. 1,5,10)
        #[arg(long, value_delimiter = ',', required = true)]
        steps: Vec<usize>,

        /// Evaluate the folds of each repetition concurrently
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Write a synthetic labeled dataset to CSV
    Generate {
        /// Output CSV path
        #[arg(long)]
        output: PathBuf,

        /// Samples per class
        #[arg(long)]
        samples_per_class: usize,

        /// Total number of features
        #[arg(long)]
        features: usize,

        /// Number of informative leading features
        #[arg(long)]
        informative: usize,

        /// Distance between the class means on informative features
        #[arg(long, default_value_t = 1.5)]
        shift: f64,

        /// Name of the label column
        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,
    },

    /// Summarize a saved score matrix
    Inspect {
        /// Path to a score matrix written by `evaluate`
        #[arg(long)]
        scores: PathBuf,
    },
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    s.parse().map_err(anyhow::Error::msg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Evaluate {
            data,
            label_column,
            repetitions,
            folds,
            steps,
            parallel,
            experiment,
            output_dir,
            forest,
        } => {
            let experiment_name = ExperimentName::new(experiment)?;
            let criterion = parse_criterion(&forest.criterion)?;

            // 1. Read and validate the dataset
            let table = DatasetReader::new(&data)
                .with_label_column(label_column.clone())
                .read()
                .context("failed to read input CSV")?;
            let dataset = table.dataset();

            // 2. Configure classifier and search
            let rf_config = RandomForestConfig::new(forest.n_trees)?
                .with_max_depth(forest.max_depth)
                .with_criterion(criterion);
            let steps = FeatureSteps::new(steps).context("invalid feature steps")?;
            let search = FeatureStepSearch::new(repetitions, folds, steps.clone())?
                .with_seed(cli.seed)
                .with_parallel(parallel);

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let scores_path = writer.scores_path();

            // 3. Run, checkpointing the score matrix after every repetition
            let result = search
                .evaluate_with(dataset, &rf_config, &StratifiedKFold, &Mcc, |progress| {
                    ScoreFile::new(progress.steps.clone(), progress.scores.clone(), false)
                        .save(&scores_path)
                })
                .with_context(|| {
                    format!(
                        "feature-step evaluation failed (last checkpoint: {})",
                        scores_path.display()
                    )
                })?;

            ScoreFile::new(steps, result.scores().clone(), true)
                .save(&scores_path)
                .context("failed to save score matrix")?;
            info!(path = %scores_path.display(), "score matrix saved");

            // 4. Final feature selection on the full dataset
            let selected = select_features(dataset, &rf_config, result.best_step(), cli.seed)
                .context("final feature selection failed")?;

            let parameters = RunParameters {
                data: data.display().to_string(),
                label_column,
                repetitions,
                n_folds: folds,
                seed: cli.seed,
                n_trees: forest.n_trees,
                max_depth: forest.max_depth,
                criterion: forest.criterion,
                parallel,
            };
            writer.write_summary(&result, &selected, &parameters)?;

            // 5. Print summary
            println!("{result}");
            println!();
            println!("selected features:");
            for feature in &selected {
                println!(
                    "{:>4}  {:<24} {:.6}",
                    feature.rank, feature.name, feature.importance
                );
            }
        }

        Command::Generate {
            output,
            samples_per_class,
            features,
            informative,
            shift,
            label_column,
        } => {
            let dataset =
                make_classification(samples_per_class, features, informative, shift, cli.seed)
                    .context("invalid generator parameters")?;
            let table = LabeledTable::with_generated_ids(dataset);
            write_dataset(&output, &table, &label_column)?;
            println!(
                "wrote {} samples x {} features to {}",
                table.dataset().n_samples(),
                table.dataset().n_features(),
                output.display()
            );
        }

        Command::Inspect { scores } => {
            let file = ScoreFile::load(&scores)
                .with_context(|| format!("failed to load {}", scores.display()))?;
            if !file.complete {
                warn!("score matrix is from an unfinished run");
            }
            let matrix = &file.scores;
            println!(
                "{} repetitions x {} folds, {} of {} rows complete{}",
                matrix.repetitions(),
                matrix.n_folds(),
                matrix.completed_rows(),
                matrix.n_rows(),
                if file.complete { "" } else { " (incomplete run)" }
            );
            let result = FeatureStepResult::from_scores(file.steps, file.scores)
                .context("score matrix has no completed rows")?;
            println!("{result}");
        }
    }

    Ok(())
}
