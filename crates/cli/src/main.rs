use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use data_loader::{UserId, DEFAULT_SPLIT_SEED};
use engine::{AlsParams, Metric, Session};
use pipeline::{
    FitTarget, LookupMissPolicy, PipelineConfig, PipelineError, RecommendationPipeline, APP_NAME,
    DEFAULT_DATA_DIR, DEFAULT_TOP_N, DEFAULT_TRAIN_RATIO,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;

/// als-movie-rec - ALS movie recommendations for one MovieLens user
#[derive(Parser, Debug)]
#[command(name = "als-movie-rec")]
#[command(about = "Top-N movie recommendations from an ALS model fitted on MovieLens ratings", long_about = None)]
struct Cli {
    /// User ID to get recommendations for
    #[arg(allow_negative_numbers = true)]
    user_id: UserId,

    /// Path to MovieLens dataset directory
    #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Movie lookup file (defaults to <DATA_DIR>/movies.dat)
    #[arg(long)]
    movies_file: Option<PathBuf>,

    /// Ratings file (defaults to <DATA_DIR>/ratings.dat)
    #[arg(long)]
    ratings_file: Option<PathBuf>,

    /// Number of recommendations to return
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Number of latent factors
    #[arg(long, default_value_t = 10)]
    rank: usize,

    /// Number of ALS iterations
    #[arg(long, default_value_t = 5)]
    max_iter: usize,

    /// Regularization strength
    #[arg(long, default_value_t = 0.01)]
    reg_param: f64,

    /// Allow negative factor values
    #[arg(long)]
    allow_negative: bool,

    /// Treat ratings as implicit feedback
    #[arg(long)]
    implicit_prefs: bool,

    /// Confidence scale for implicit feedback
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,

    /// Seed for the train/test split and factor initialisation
    #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
    seed: u64,

    /// Share of ratings in the training split
    #[arg(long, default_value_t = DEFAULT_TRAIN_RATIO)]
    train_ratio: f64,

    /// Rows the model is fitted on
    #[arg(long, value_enum, default_value_t = FitOn::Full)]
    fit_on: FitOn,

    /// Score the model on the test split
    #[arg(long)]
    evaluate: bool,

    /// Metric used with --evaluate
    #[arg(long, value_enum, default_value_t = MetricArg::Rmse)]
    metric: MetricArg,

    /// What to do when a recommended movie has no title
    #[arg(long, value_enum, default_value_t = OnMissingTitle::Fail)]
    on_missing_title: OnMissingTitle,

    /// Worker threads (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FitOn {
    /// Every rating
    Full,
    /// Training split only
    Training,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    Rmse,
    Mse,
    Mae,
    R2,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnMissingTitle {
    Fail,
    Skip,
    Placeholder,
}

impl From<FitOn> for FitTarget {
    fn from(value: FitOn) -> Self {
        match value {
            FitOn::Full => FitTarget::Full,
            FitOn::Training => FitTarget::Training,
        }
    }
}

impl From<MetricArg> for Metric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Rmse => Metric::Rmse,
            MetricArg::Mse => Metric::Mse,
            MetricArg::Mae => Metric::Mae,
            MetricArg::R2 => Metric::R2,
        }
    }
}

impl From<OnMissingTitle> for LookupMissPolicy {
    fn from(value: OnMissingTitle) -> Self {
        match value {
            OnMissingTitle::Fail => LookupMissPolicy::Fail,
            OnMissingTitle::Skip => LookupMissPolicy::Skip,
            OnMissingTitle::Placeholder => LookupMissPolicy::Placeholder,
        }
    }
}

impl Cli {
    fn to_config(&self) -> PipelineConfig {
        let als = AlsParams::default()
            .with_rank(self.rank)
            .with_max_iter(self.max_iter)
            .with_reg_param(self.reg_param)
            .with_nonnegative(!self.allow_negative)
            .with_implicit_prefs(self.implicit_prefs)
            .with_alpha(self.alpha)
            .with_seed(self.seed);

        let mut config = PipelineConfig::new(self.user_id)
            .with_data_dir(&self.data_dir)
            .with_als(als)
            .with_top_n(self.top_n)
            .with_train_ratio(self.train_ratio)
            .with_split_seed(self.seed)
            .with_fit_target(self.fit_on.into())
            .with_evaluation(self.evaluate.then(|| self.metric.into()))
            .with_lookup_miss_policy(self.on_missing_title.into())
            .with_threads(self.threads);

        if let Some(path) = &self.movies_file {
            config = config.with_movies_file(path);
        }
        if let Some(path) = &self.ratings_file {
            config = config.with_ratings_file(path);
        }
        config
    }
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the recommendations
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // Missing or non-integer user id exits here with clap's usage error (code 2)
    let cli = Cli::parse();
    debug!("Parsed arguments: {:?}", cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config();

    let session = Session::builder()
        .app_name(APP_NAME)
        .num_threads(config.threads)
        .build()
        .map_err(PipelineError::from)?;

    let pipeline = RecommendationPipeline::new(&session, config)?;

    eprintln!(
        "Building recommendations for user {}...",
        cli.user_id.to_string().bold()
    );
    let start = Instant::now();
    let report = pipeline.run()?;
    eprintln!("{} Done in {:.2?}", "✓".green(), start.elapsed());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report
        .write_to(&mut out)
        .and_then(|_| out.flush())
        .context("Failed to write recommendations")?;

    Ok(())
}

/// Exit code for a failed run; pipeline errors carry their own
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PipelineError>()
        .map(PipelineError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["als-movie-rec", "1"]).unwrap();
        assert_eq!(cli.to_config(), PipelineConfig::new(1));
    }

    #[test]
    fn test_user_id_is_required_and_numeric() {
        assert!(Cli::try_parse_from(["als-movie-rec"]).is_err());
        assert!(Cli::try_parse_from(["als-movie-rec", "abc"]).is_err());
        assert!(Cli::try_parse_from(["als-movie-rec", "2147483648"]).is_err());
    }

    #[test]
    fn test_negative_user_id_is_accepted() {
        let cli = Cli::try_parse_from(["als-movie-rec", "-1"]).unwrap();
        assert_eq!(cli.user_id, -1);

        let cli = Cli::try_parse_from(["als-movie-rec", "--top-n", "3", "-42"]).unwrap();
        assert_eq!(cli.user_id, -42);
        assert_eq!(cli.top_n, 3);
    }

    #[test]
    fn test_options_flow_into_config() {
        let cli = Cli::try_parse_from([
            "als-movie-rec",
            "7",
            "--data-dir",
            "data/ml-1m",
            "--ratings-file",
            "other/ratings.dat",
            "--rank",
            "4",
            "--allow-negative",
            "--fit-on",
            "training",
            "--evaluate",
            "--metric",
            "mae",
            "--on-missing-title",
            "skip",
        ])
        .unwrap();
        let config = cli.to_config();

        assert_eq!(config.user_id, 7);
        assert_eq!(config.paths.movies, PathBuf::from("data/ml-1m").join("movies.dat"));
        assert_eq!(config.paths.ratings, PathBuf::from("other/ratings.dat"));
        assert_eq!(config.als.rank, 4);
        assert!(!config.als.nonnegative);
        assert_eq!(config.fit_target, FitTarget::Training);
        assert_eq!(config.evaluate, Some(Metric::Mae));
        assert_eq!(config.on_missing_title, LookupMissPolicy::Skip);
    }

    #[test]
    fn test_pipeline_errors_keep_their_exit_code() {
        let err = anyhow::Error::from(PipelineError::NoRecommendations { user_id: 3 });
        assert_eq!(exit_code(&err), 5);

        let other = anyhow::anyhow!("stdout closed");
        assert_eq!(exit_code(&other), 1);
    }
}
