//! pegasvm Command Line Interface
//!
//! Train, apply and cross-validate multi-class RBF SVM models on LibSVM
//! format data.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use pegasvm::api::{TrainedModel, SVM};
use pegasvm::core::{Dataset, Result, SVMError};
use pegasvm::multiclass::class_pairs;
use pegasvm::persistence::SerializableModel;
use pegasvm::validation::DEFAULT_SEED;
use pegasvm::LibSVMDataset;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "pegasvm")]
#[command(about = "Multi-class RBF Support Vector Machine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new SVM model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Stratified k-fold cross-validation
    Cv(CvArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args, Clone)]
struct SolverArgs {
    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// RBF kernel width
    #[arg(short, long, default_value = "1.0")]
    gamma: f64,

    /// Stopping scale; training stops once the margin reaches epsilon * C
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Iteration cap per class pair (unbounded if not given)
    #[arg(short, long)]
    max_iterations: Option<usize>,
}

impl SolverArgs {
    fn builder(&self) -> SVM {
        let svm = SVM::new()
            .with_c(self.c)
            .with_gamma(self.gamma)
            .with_epsilon(self.epsilon);
        match self.max_iterations {
            Some(n) => svm.with_max_iterations(n),
            None => svm,
        }
    }
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CvArgs {
    /// Data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Number of folds
    #[arg(short = 'k', long, default_value = "5")]
    folds: usize,

    /// Seed for the fold shuffle
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Cv(args) => cv_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_dataset(path: &Path) -> Result<LibSVMDataset> {
    check_extension(path);
    let dataset = LibSVMDataset::from_file(path)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );
    Ok(dataset)
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training SVM model...");
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: C={}, gamma={}, epsilon={}",
        args.solver.c, args.solver.gamma, args.solver.epsilon
    );

    let dataset = load_dataset(&args.data)?;
    let model = args.solver.builder().train(&dataset)?;

    let info = model.info();
    info!(
        "Training completed: {} classes, {} support vectors",
        info.n_classes, info.n_support_vectors
    );

    model.save(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    let metrics = model.evaluate(&dataset);
    info!("Training accuracy: {:.2}%", metrics.accuracy());

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = TrainedModel::load(&args.model)?;

    info!("Loading prediction data from: {:?}", args.data);
    let dataset = load_dataset(&args.data)?;
    let predictions = model.predict_dataset(&dataset);

    match args.output {
        Some(output_path) => {
            let file = File::create(&output_path).map_err(SVMError::IoError)?;
            write_predictions(BufWriter::new(file), &predictions)?;
            info!("Predictions saved to: {output_path:?}");
        }
        None => write_predictions(io::stdout().lock(), &predictions)?,
    }

    let metrics = model.evaluate(&dataset);
    println!(
        "Accuracy = {:.4}% ({}/{}) (classification)",
        metrics.accuracy(),
        metrics.correct,
        metrics.total
    );

    Ok(())
}

fn write_predictions<W: Write>(mut writer: W, predictions: &[pegasvm::Prediction]) -> Result<()> {
    for pred in predictions {
        writeln!(writer, "{}", pred.label).map_err(SVMError::IoError)?;
    }
    writer.flush().map_err(SVMError::IoError)
}

fn cv_command(args: CvArgs) -> Result<()> {
    info!(
        "Cross-validation on {:?} with {} folds (seed {})",
        args.data, args.folds, args.seed
    );

    let dataset = load_dataset(&args.data)?;
    let report = args
        .solver
        .builder()
        .with_seed(args.seed)
        .cross_validate(&dataset, args.folds)?;

    println!(
        "Cross Validation Accuracy = {:.4}% ({}/{})",
        report.accuracy(),
        report.correct,
        report.total
    );

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;

    print!("{serializable_model}");

    println!("\nClass Pair Biases:");
    let labels = &serializable_model.labels;
    for ((i, j), b) in class_pairs(labels.len()).zip(&serializable_model.bias) {
        println!("  {} vs {}: {b:.6}", labels[i], labels[j]);
    }

    Ok(())
}

fn check_extension(path: &Path) {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("libsvm") | Some("svm") | Some("txt") => {}
        Some(other) => warn!("Unexpected file extension '{other}', reading as LibSVM format"),
        None => {}
    }
}
