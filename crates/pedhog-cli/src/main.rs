//! pedhog CLI: train, run and evaluate the pedestrian detector.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use pedhog::{FeatureMap, GradientKernel, LinearModel, Session, SessionConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pedhog")]
#[command(about = "Pedestrian detection with gradient-histogram features and a linear SVM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier from a directory with positive/ and negative/ images.
    Train(CliTrainArgs),

    /// Detect pedestrians in every image of a directory and write a prediction file.
    Classify(CliClassifyArgs),

    /// Compare a prediction file against ground truth.
    Evaluate(CliEvaluateArgs),

    /// Detect pedestrians in one image and save a marked-up copy.
    Scan(CliScanArgs),

    /// k-fold cross-validation on a training directory.
    CrossValidate(CliCrossValidateArgs),

    /// Print the header of a model file.
    ModelInfo(CliModelInfoArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeatureArg {
    Linear,
    Chi2,
}

impl FeatureArg {
    fn to_core(self) -> FeatureMap {
        match self {
            Self::Linear => FeatureMap::Linear,
            Self::Chi2 => FeatureMap::chi2(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GradientArg {
    Prewitt,
    Sobel,
}

impl GradientArg {
    fn to_core(self) -> GradientKernel {
        match self {
            Self::Prewitt => GradientKernel::Prewitt,
            Self::Sobel => GradientKernel::Sobel,
        }
    }
}

/// Options shared by every command that builds a session.
#[derive(Debug, Clone, Args, Default)]
struct CliSessionArgs {
    /// Session configuration (JSON). Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Feature space of descriptors.
    #[arg(long, value_enum)]
    features: Option<FeatureArg>,

    /// Gradient filter used for cell histograms.
    #[arg(long, value_enum)]
    gradient: Option<GradientArg>,

    /// Detection confidence bound.
    #[arg(long, allow_hyphen_values = true)]
    bound: Option<f64>,

    /// Seed of the random source.
    #[arg(long)]
    seed: Option<u64>,
}

impl CliSessionArgs {
    fn load(&self) -> CliResult<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)?,
            None => SessionConfig::default(),
        };
        if let Some(features) = self.features {
            config.features = features.to_core();
        }
        if let Some(gradient) = self.gradient {
            config.hog.gradient_kernel = gradient.to_core();
        }
        if let Some(bound) = self.bound {
            config.detect.bound = bound;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
struct CliBootstrapArgs {
    /// Run hard-negative bootstrapping after the initial fit.
    #[arg(long)]
    bootstrap: bool,

    /// Bootstrapping rounds.
    #[arg(long)]
    rounds: Option<usize>,

    /// Background strips scanned per round.
    #[arg(long)]
    backgrounds_per_round: Option<usize>,

    /// Directory receiving mined examples as PNG.
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

impl CliBootstrapArgs {
    fn apply(&self, config: &mut SessionConfig) {
        let boot = &mut config.train.bootstrap;
        boot.enable |= self.bootstrap;
        if let Some(rounds) = self.rounds {
            boot.rounds = rounds;
        }
        if let Some(n) = self.backgrounds_per_round {
            boot.backgrounds_per_round = n;
        }
        if self.dump_dir.is_some() {
            boot.dump_dir = self.dump_dir.clone();
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CliTrainArgs {
    /// Training root with positive/ and negative/ subdirectories.
    #[arg(long)]
    data_dir: PathBuf,

    /// Path to write the trained model.
    #[arg(long)]
    model: PathBuf,

    /// Path to write the training report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    bootstrap: CliBootstrapArgs,

    #[command(flatten)]
    session: CliSessionArgs,
}

#[derive(Debug, Clone, Args)]
struct CliClassifyArgs {
    /// Directory of images to classify (not recursive).
    #[arg(long)]
    data_dir: PathBuf,

    /// Model file.
    #[arg(long)]
    model: PathBuf,

    /// Path to write predictions [default: from config, else predicted.txt].
    #[arg(long)]
    predictions: Option<PathBuf>,

    #[command(flatten)]
    session: CliSessionArgs,
}

#[derive(Debug, Clone, Args)]
struct CliEvaluateArgs {
    /// Predicted annotation file [default: from config, else predicted.txt].
    #[arg(long)]
    predictions: Option<PathBuf>,

    /// Ground-truth annotation file [default: from config, else truth.idl].
    #[arg(long)]
    truth: Option<PathBuf>,

    /// Path to write the metrics (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    session: CliSessionArgs,
}

#[derive(Debug, Clone, Args)]
struct CliModelInfoArgs {
    /// Model file [default: from config, else model.txt].
    #[arg(long)]
    model: Option<PathBuf>,

    #[command(flatten)]
    session: CliSessionArgs,
}

#[derive(Debug, Clone, Args)]
struct CliScanArgs {
    /// Input image.
    #[arg(long)]
    image: PathBuf,

    /// Model file.
    #[arg(long)]
    model: PathBuf,

    /// Path to write the image with detection outlines.
    #[arg(long)]
    marked: Option<PathBuf>,

    /// Path to write the detections (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    session: CliSessionArgs,
}

#[derive(Debug, Clone, Args)]
struct CliCrossValidateArgs {
    /// Training root with positive/ and negative/ subdirectories.
    #[arg(long)]
    data_dir: PathBuf,

    /// Number of folds.
    #[arg(long)]
    folds: Option<usize>,

    /// Path to write the report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    bootstrap: CliBootstrapArgs,

    #[command(flatten)]
    session: CliSessionArgs,
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => run_train(&args),
        Commands::Classify(args) => run_classify(&args),
        Commands::Evaluate(args) => run_evaluate(&args),
        Commands::Scan(args) => run_scan(&args),
        Commands::CrossValidate(args) => run_cross_validate(&args),
        Commands::ModelInfo(args) => run_model_info(&args),
    }
}

// ── train ──────────────────────────────────────────────────────────────

fn run_train(args: &CliTrainArgs) -> CliResult<()> {
    let mut config = args.session.load()?;
    args.bootstrap.apply(&mut config);
    config.validate()?;

    let mut session = Session::new(config);
    session.set_data_dir(&args.data_dir);
    session.set_model_path(&args.model);

    let report = session.train()?;
    session.save_model()?;
    println!(
        "Trained on {} positive / {} negative examples ({} bootstrap rounds).",
        report.positives,
        report.negatives,
        report.bootstrap_rounds.len()
    );
    println!("Model written to {}", args.model.display());

    if let Some(out) = &args.out {
        write_json(out, &report)?;
    }
    Ok(())
}

// ── classify ───────────────────────────────────────────────────────────

fn run_classify(args: &CliClassifyArgs) -> CliResult<()> {
    let mut session = Session::new(args.session.load()?);
    session.set_model_path(&args.model);
    session.set_data_dir(&args.data_dir);
    if let Some(path) = &args.predictions {
        session.set_predictions_path(path);
    }
    session.load_model()?;

    let predictions = session.classify_directory()?;
    println!(
        "{} detections in {} images written to {}",
        predictions.total(),
        predictions.len(),
        session.config().paths.predictions.display()
    );
    Ok(())
}

// ── evaluate ───────────────────────────────────────────────────────────

fn run_evaluate(args: &CliEvaluateArgs) -> CliResult<()> {
    let mut session = Session::new(args.session.load()?);
    if let Some(path) = &args.predictions {
        session.set_predictions_path(path);
    }
    if let Some(path) = &args.truth {
        session.set_truth_path(path);
    }
    let m = session.estimate_quality()?;

    println!("True positive:   {}", m.tp);
    println!("True positive':  {}", m.tp_distinct);
    println!("Total predicted: {}", m.total_predicted);
    println!("Total truth:     {}", m.total_truth);
    println!("Precision:       {:.4}", m.precision);
    println!("Recall:          {:.4}", m.recall);
    println!("F-score:         {:.4}", m.f_score);

    if let Some(out) = &args.out {
        write_json(out, &m)?;
    }
    Ok(())
}

// ── scan ───────────────────────────────────────────────────────────────

fn run_scan(args: &CliScanArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());
    let mut session = Session::new(args.session.load()?);
    session.set_model_path(&args.model);
    session.load_model()?;

    let scan = session.scan_image(&args.image)?;
    println!("Detected {} pedestrians.", scan.detections.len());
    for det in &scan.detections {
        println!("  x = {:4}  score = {:.4}", det.x, det.score);
    }

    if let Some(marked) = &args.marked {
        scan.image.save(marked).map_err(|e| -> CliError {
            format!("Failed to save image {}: {}", marked.display(), e).into()
        })?;
        tracing::info!("Marked image written to {}", marked.display());
    }
    if let Some(out) = &args.out {
        write_json(out, &scan.detections)?;
    }
    Ok(())
}

// ── cross-validate ─────────────────────────────────────────────────────

fn run_cross_validate(args: &CliCrossValidateArgs) -> CliResult<()> {
    let mut config = args.session.load()?;
    args.bootstrap.apply(&mut config);
    if let Some(folds) = args.folds {
        config.cross_validation_folds = folds;
    }
    config.validate()?;

    let mut session = Session::new(config);
    session.set_data_dir(&args.data_dir);
    let report = session.cross_validate()?;
    for fold in &report.folds {
        println!(
            "fold {}: {} / {} misclassified",
            fold.fold, fold.errors, fold.held_out
        );
    }
    println!(
        "Errors: {} / {}  (accuracy {:.4})",
        report.errors, report.total, report.accuracy
    );

    if let Some(out) = &args.out {
        write_json(out, &report)?;
    }
    Ok(())
}

// ── model-info ─────────────────────────────────────────────────────────

fn run_model_info(args: &CliModelInfoArgs) -> CliResult<()> {
    let config = args.session.load()?;
    let path = args.model.as_deref().unwrap_or(config.paths.model.as_path());
    let model = LinearModel::load(path)?;
    let n = model.dimension();
    let norm = model.weights().iter().map(|w| w * w).sum::<f64>().sqrt();
    let features = [FeatureMap::Linear, FeatureMap::chi2()]
        .into_iter()
        .find(|f| f.descriptor_len() == n);

    println!("pedhog model {}", path.display());
    println!("  features:       {}", n);
    println!("  weight norm:    {:.6}", norm);
    match features {
        Some(FeatureMap::Linear) => println!("  feature space:  linear"),
        Some(FeatureMap::Chi2(_)) => println!("  feature space:  chi2 (default kernel map)"),
        None => println!("  feature space:  unknown"),
    }
    if n != config.features.descriptor_len() {
        tracing::warn!(
            "model has {} features but the configured feature map produces {}",
            n,
            config.features.descriptor_len()
        );
    }
    Ok(())
}
