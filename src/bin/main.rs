//! svmkit command line interface
//!
//! Trains, evaluates and applies kernel SVM models on LibSVM-format data,
//! and solves or decomposes dense matrices read from text files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use svmkit::api::SVM;
use svmkit::core::{Dataset, Error, OptimizerConfig, Result, WorkingSetStrategy};
use svmkit::data::{read_matrix_file, write_matrix, LibSVMDataset};
use svmkit::kernel::{
    estimate_complexity, KernelType, LaplacianKernel, RBFKernel, DEFAULT_ESTIMATE_SAMPLES,
};
use svmkit::linalg::{pseudo_inverse, solve, Matrix};
use svmkit::multiclass::MulticlassSVM;
use svmkit::persistence::SerializableModel;

#[derive(Parser)]
#[command(name = "svmkit")]
#[command(about = "Kernel support vector machines and dense matrix decompositions")]
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
    /// Evaluate a model on labelled test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
    /// Solve A·X = B, or print the pseudo-inverse of A when B is omitted
    Solve(SolveArgs),
    /// Factor a matrix and print the factorization summary
    Decompose(DecomposeArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Kernel function
    #[arg(short, long, value_enum, default_value = "linear")]
    kernel: CliKernel,

    /// Kernel width; estimated from the data for rbf and laplacian when omitted
    #[arg(short, long)]
    gamma: Option<f64>,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: u32,

    /// Polynomial and sigmoid offset
    #[arg(long, default_value = "0.0")]
    coef0: f64,

    /// Regularization parameter C; estimated from the data when omitted
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Convergence tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Maximum iterations
    #[arg(short, long, default_value = "10000")]
    max_iterations: usize,

    /// Kernel cache size in MB
    #[arg(long, default_value = "100")]
    cache_size: usize,

    /// Working set selection strategy
    #[arg(long, value_enum, default_value = "second-order")]
    working_set_strategy: CliWorkingSetStrategy,

    /// Box bound multiplier for the larger label
    #[arg(long, default_value = "1.0")]
    positive_weight: f64,

    /// Box bound multiplier for the smaller label
    #[arg(long, default_value = "1.0")]
    negative_weight: f64,

    /// Seed for every random choice
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Train the pairwise machines of a multi-class problem in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Rbf,
    Polynomial,
    Sigmoid,
    Laplacian,
    ChiSquare,
    HistogramIntersection,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliWorkingSetStrategy {
    /// Maximal violating pair (first order)
    #[value(name = "mvp")]
    MaximalViolatingPair,
    /// Second-order partner selection (default)
    #[value(name = "second-order")]
    SecondOrder,
    /// Seeded random violating partner
    #[value(name = "random")]
    Random,
}

impl From<CliWorkingSetStrategy> for WorkingSetStrategy {
    fn from(cli_strategy: CliWorkingSetStrategy) -> Self {
        match cli_strategy {
            CliWorkingSetStrategy::MaximalViolatingPair => WorkingSetStrategy::MaximalViolatingPair,
            CliWorkingSetStrategy::SecondOrder => WorkingSetStrategy::SecondOrder,
            CliWorkingSetStrategy::Random => WorkingSetStrategy::Random,
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also print decision values (binary models only)
    #[arg(long)]
    scores: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Show detailed metrics (binary models only)
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

#[derive(Args)]
struct SolveArgs {
    /// Coefficient matrix A, one row per line
    #[arg(short = 'a', long)]
    matrix: PathBuf,

    /// Right-hand side B, one row per line
    #[arg(short = 'b', long)]
    rhs: Option<PathBuf>,

    /// Write the solution matrix here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DecomposeArgs {
    /// Matrix file, one row per line
    #[arg(short = 'a', long)]
    matrix: PathBuf,

    /// Decomposition to compute
    #[arg(short, long, value_enum, default_value = "svd")]
    kind: DecompositionKind,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DecompositionKind {
    Lu,
    Cholesky,
    Qr,
    Eigen,
    Svd,
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
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
        Commands::Solve(args) => solve_command(args),
        Commands::Decompose(args) => decompose_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn kernel_from_args(args: &TrainArgs, dataset: &LibSVMDataset) -> Result<KernelType> {
    if let Some(gamma) = args.gamma {
        if !(gamma > 0.0 && gamma.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "gamma must be positive and finite, got {gamma}"
            )));
        }
    }
    let inputs = dataset.inputs();
    let fixed_gamma = args.gamma.unwrap_or(1.0);

    let kernel = match args.kernel {
        CliKernel::Linear => KernelType::Linear,
        CliKernel::Rbf => KernelType::Rbf {
            gamma: args.gamma.unwrap_or_else(|| {
                RBFKernel::estimate(inputs, DEFAULT_ESTIMATE_SAMPLES, args.seed).gamma()
            }),
        },
        CliKernel::Laplacian => KernelType::Laplacian {
            gamma: args.gamma.unwrap_or_else(|| {
                LaplacianKernel::estimate(inputs, DEFAULT_ESTIMATE_SAMPLES, args.seed).gamma()
            }),
        },
        CliKernel::Polynomial => KernelType::Polynomial {
            degree: args.degree,
            gamma: fixed_gamma,
            coef0: args.coef0,
        },
        CliKernel::Sigmoid => KernelType::Sigmoid {
            gamma: fixed_gamma,
            coef0: args.coef0,
        },
        CliKernel::ChiSquare => KernelType::ChiSquare { gamma: fixed_gamma },
        CliKernel::HistogramIntersection => {
            KernelType::HistogramIntersection { normalized: false }
        }
    };
    Ok(kernel)
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training SVM model...");
    info!("Data file: {:?}", args.data);

    let dataset = LibSVMDataset::from_file(&args.data)?;
    let classes = dataset.classes();
    info!(
        "Loaded {} samples with {} dimensions, classes {:?}",
        dataset.inputs().len(),
        dataset.dim(),
        classes
    );

    let kernel = kernel_from_args(&args, &dataset)?;
    let c = args
        .c
        .unwrap_or_else(|| estimate_complexity(&kernel, dataset.inputs()));
    info!("Kernel: {kernel}, C={c}, epsilon={}", args.epsilon);

    let config = OptimizerConfig {
        c,
        epsilon: args.epsilon,
        max_iterations: args.max_iterations,
        cache_size: args.cache_size * 1024 * 1024, // Convert MB to bytes
        working_set_strategy: args.working_set_strategy.into(),
        positive_weight: args.positive_weight,
        negative_weight: args.negative_weight,
        seed: args.seed,
    };

    let (serializable, accuracy) = if classes.len() > 2 {
        let model = MulticlassSVM::with_kernel(kernel)
            .with_config(config.clone())
            .with_parallel(args.parallel)
            .learn(dataset.inputs(), dataset.labels(), None)?;
        let accuracy = model.evaluate(dataset.inputs(), dataset.labels());
        (SerializableModel::from_multiclass(&model)?, accuracy)
    } else {
        let model = SVM::with_kernel(kernel)
            .with_config(config.clone())
            .learn(dataset.inputs(), dataset.labels(), None)?;
        let info = model.info();
        info!("Support vectors: {}", info.n_support_vectors);
        info!("Bias: {:.6}", info.bias);
        let accuracy = model.evaluate(dataset.inputs(), dataset.labels());
        (SerializableModel::from_trained_model(&model)?, accuracy)
    };

    serializable
        .with_training_params(config)
        .save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);
    info!("Training accuracy: {:.2}%", accuracy * 100.0);

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable = SerializableModel::load_from_file(&args.model)?;
    let dataset = LibSVMDataset::from_file(&args.data)?;

    let rows: Vec<(i32, Option<f64>)> = if args.scores && !serializable.is_multiclass() {
        let model = serializable.to_trained_model()?;
        dataset
            .inputs()
            .iter()
            .map(|x| (model.decide(x), Some(model.score(x))))
            .collect()
    } else {
        let model = serializable.to_multiclass()?;
        dataset
            .inputs()
            .iter()
            .map(|x| (model.decide(x), None))
            .collect()
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    writeln!(writer, "# Predictions for {} samples", rows.len())?;
    writeln!(
        writer,
        "# Format: sample_index predicted_label{}",
        if args.scores { " score" } else { "" }
    )?;
    for (i, (label, score)) in rows.iter().enumerate() {
        match score {
            Some(score) => writeln!(writer, "{i} {label} {score:.6}")?,
            None => writeln!(writer, "{i} {label}")?,
        }
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable = SerializableModel::load_from_file(&args.model)?;
    let dataset = LibSVMDataset::from_file(&args.data)?;

    println!("=== Model Evaluation ===");
    println!("{}", serializable.summary());

    let model = serializable.to_multiclass()?;
    let accuracy = model.evaluate(dataset.inputs(), dataset.labels());
    println!("\nTest Results:");
    println!("  Accuracy: {:.2}%", accuracy * 100.0);

    if args.detailed && !serializable.is_multiclass() {
        let metrics = serializable
            .to_trained_model()?
            .evaluate_detailed(dataset.inputs(), dataset.labels());
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable = SerializableModel::load_from_file(&args.model)?;

    println!("{}", serializable.summary());

    for machine in &serializable.machines {
        println!(
            "\nMachine {} vs {}: {} support vectors, {:?} after {} iterations",
            machine.classes[0],
            machine.classes[1],
            machine.support_vectors.len(),
            machine.status,
            machine.iterations
        );
        let n_show = machine.alpha.len().min(10);
        for (i, (alpha, sv)) in machine
            .alpha
            .iter()
            .zip(&machine.support_vectors)
            .enumerate()
            .take(n_show)
        {
            println!("  α{i}*y{i}: {:.6}", alpha * sv.label);
        }
        if machine.alpha.len() > n_show {
            println!("  ... ({} more)", machine.alpha.len() - n_show);
        }
    }

    Ok(())
}

fn solve_command(args: SolveArgs) -> Result<()> {
    let a = read_matrix_file(&args.matrix)?;
    info!("Loaded {}x{} matrix", a.nrows(), a.ncols());

    let x = match &args.rhs {
        Some(path) => {
            let b = read_matrix_file(path)?;
            let solution = solve(&a, &b)?;
            println!("# Method: {:?}", solution.method);
            println!("# Rank: {}", solution.rank);
            println!("# Condition number: {:e}", solution.condition_number);
            solution.x
        }
        None => {
            println!("# Pseudo-inverse");
            pseudo_inverse(&a)?
        }
    };

    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_matrix(&mut writer, &x)?;
            writer.flush()?;
            info!("Solution saved to: {path:?}");
        }
        None => write_matrix(io::stdout().lock(), &x)?,
    }
    Ok(())
}

fn decompose_command(args: DecomposeArgs) -> Result<()> {
    let a = read_matrix_file(&args.matrix)?;
    match args.kind {
        DecompositionKind::Lu => {
            let lu = a.lu()?;
            println!("Singular: {}", lu.is_singular());
            println!("Determinant: {}", lu.determinant());
            println!("Pivot: {:?}", lu.pivot());
            print_matrix("L", &lu.l())?;
            print_matrix("U", &lu.u())?;
        }
        DecompositionKind::Cholesky => {
            let cholesky = a.cholesky()?;
            println!("Positive definite: {}", cholesky.is_positive_definite());
            if cholesky.is_positive_definite() {
                print_matrix("L", cholesky.l())?;
            }
        }
        DecompositionKind::Qr => {
            let qr = a.qr()?;
            println!("Rank: {}", qr.rank());
            let columns: Vec<String> = qr.permutation().iter().map(|j| j.to_string()).collect();
            println!("Column order: {}", columns.join(" "));
            print_matrix("Q", &qr.q())?;
            print_matrix("R", &qr.r())?;
        }
        DecompositionKind::Eigen => {
            let eigen = a.eigen()?;
            println!("Symmetric: {}", eigen.is_symmetric());
            println!("Converged: {}", eigen.is_converged());
            for (re, im) in eigen
                .eigenvalues_real()
                .iter()
                .zip(eigen.eigenvalues_imag())
            {
                if *im == 0.0 {
                    println!("  {re}");
                } else {
                    println!("  {re} {im:+}i");
                }
            }
            print_matrix("V", eigen.eigenvectors())?;
        }
        DecompositionKind::Svd => {
            let svd = a.svd()?;
            println!("Converged: {}", svd.is_converged());
            println!("Rank: {}", svd.rank());
            println!("Condition number: {:e}", svd.condition_number());
            println!("Singular values: {:?}", svd.singular_values());
        }
    }
    Ok(())
}

fn print_matrix(name: &str, m: &Matrix) -> Result<()> {
    println!("{name} ({}x{}):", m.nrows(), m.ncols());
    write_matrix(io::stdout().lock(), m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_train_arguments() {
        let cli = Cli::try_parse_from([
            "svmkit",
            "train",
            "--data",
            "train.txt",
            "-o",
            "model.json",
            "--kernel",
            "rbf",
            "-C",
            "2.5",
            "--working-set-strategy",
            "mvp",
        ])
        .unwrap();

        match cli.command {
            Commands::Train(args) => {
                assert!(matches!(args.kernel, CliKernel::Rbf));
                assert_eq!(args.c, Some(2.5));
                assert_eq!(args.gamma, None);
                assert_eq!(args.cache_size, 100);
                assert_eq!(
                    WorkingSetStrategy::from(args.working_set_strategy),
                    WorkingSetStrategy::MaximalViolatingPair
                );
            }
            _ => panic!("expected train command"),
        }
    }

    #[test]
    fn test_kernel_from_args() {
        let dataset = LibSVMDataset::from_reader(
            "+1 1:1.0 2:0.5\n-1 1:-1.0 2:-0.5\n+1 1:2.0\n".as_bytes(),
        )
        .unwrap();
        let parse = |extra: &[&str]| {
            let mut argv = vec!["svmkit", "train", "--data", "d", "-o", "m"];
            argv.extend_from_slice(extra);
            match Cli::try_parse_from(argv).unwrap().command {
                Commands::Train(args) => kernel_from_args(&args, &dataset),
                _ => unreachable!(),
            }
        };

        assert_eq!(parse(&[]).unwrap(), KernelType::Linear);
        assert_eq!(
            parse(&["--kernel", "rbf", "--gamma", "0.5"]).unwrap(),
            KernelType::Rbf { gamma: 0.5 }
        );
        match parse(&["--kernel", "laplacian"]).unwrap() {
            KernelType::Laplacian { gamma } => assert!(gamma > 0.0),
            other => panic!("unexpected kernel {other}"),
        }
        assert!(matches!(
            parse(&["--kernel", "rbf", "--gamma=-1"]),
            Err(Error::InvalidParameter(_))
        ));
    }
}
