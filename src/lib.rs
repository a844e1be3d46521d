//! Platescan: food photo segmentation, labelling and nutrition lookup.
//!
//! A plate photo is analyzed in four steps. Detector regions are
//! deduplicated by mask IoU, each surviving region is cut out into its own
//! artifact, every artifact is named by a classifier, and the name is looked
//! up in a nutrition service. Single fruit or vegetable photos take a shorter
//! path: a model's probability vector is mapped through a fixed label table.
//!
//! # Modules
//!
//! - [`geom`]: typed boxes and crop rectangles
//! - [`region`]: masks, IoU and greedy region selection
//! - [`extract`]: masked crops and artifact stores
//! - [`detections`]: detector output documents
//! - [`classify`]: label table and the classifier capability
//! - [`nutrition`]: nutrition services
//! - [`pipeline`]: the plate analysis orchestrator
//! - [`config`]: settings
//! - [`error`]: error types

pub mod classify;
pub mod config;
pub mod detections;
pub mod error;
pub mod extract;
pub mod geom;
pub mod nutrition;
pub mod pipeline;
pub mod region;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use image::RgbImage;
use log::{info, warn};
use serde::Serialize;

pub use error::PlatescanError;

use classify::{FoodCategory, LabelTable};
use config::Settings;
use detections::JsonDetections;
use extract::DirStore;
use nutrition::{GeminiClient, NutritionField, NutritionLookup, UsdaClient};
use pipeline::Analyzer;

/// The platescan CLI application.
#[derive(Parser)]
#[command(name = "platescan")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// YAML settings file.
    #[arg(long, global = true, env = "PLATESCAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Segment a plate photo, name every item and look up its nutrition.
    Analyze(AnalyzeArgs),
    /// Segment a plate photo and write the item crops only.
    Segment(SegmentArgs),
    /// Label a fruit or vegetable from model probabilities.
    Predict(PredictArgs),
    /// Look up nutrition for a food name.
    Nutrition(NutritionArgs),
}

/// Inputs shared by `analyze` and `segment`.
#[derive(clap::Args)]
struct SegmentationArgs {
    /// Source image.
    image: PathBuf,

    /// Detector output for the image (JSON).
    #[arg(long)]
    detections: PathBuf,

    /// Directory under which the request namespace is created. Namespaces
    /// are never removed, so runs without --request-id add a new directory
    /// each time.
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Namespace name; reusing one clears its previous artifacts.
    #[arg(long)]
    request_id: Option<String>,

    /// Suppress regions overlapping a kept one by more than this IoU.
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Minimum crop width and height in pixels.
    #[arg(long)]
    min_size: Option<u32>,

    /// Candidate order ('detector' or 'confidence').
    #[arg(long)]
    order: Option<String>,
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: SegmentationArgs,

    /// Nutrition source ('gemini' or 'usda').
    #[arg(long, default_value = "gemini")]
    nutrition: String,

    /// Write the records here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct SegmentArgs {
    #[command(flatten)]
    input: SegmentationArgs,
}

#[derive(clap::Args)]
struct PredictArgs {
    /// Class probabilities from the fruit/vegetable model (JSON).
    #[arg(long)]
    probabilities: PathBuf,

    /// Predictions below this confidence are reported as Unknown.
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Skip the nutrition lookup.
    #[arg(long)]
    no_nutrition: bool,

    /// Omit nutrients whose amount is zero.
    #[arg(long)]
    nonzero: bool,
}

#[derive(clap::Args)]
struct NutritionArgs {
    /// Food name to look up.
    food: String,

    /// Nutrition source ('usda' or 'gemini').
    #[arg(long, default_value = "usda")]
    source: String,

    /// Omit nutrients whose amount is zero.
    #[arg(long)]
    nonzero: bool,
}

/// Run the platescan CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PlatescanError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Analyze(args)) => run_analyze(settings, args),
        Some(Commands::Segment(args)) => run_segment(settings, args),
        Some(Commands::Predict(args)) => run_predict(settings, args),
        Some(Commands::Nutrition(args)) => run_nutrition(settings, args),
        None => {
            println!("platescan {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Food photo segmentation, labelling and nutrition lookup.");
            println!();
            println!("Run 'platescan --help' for usage information.");
            Ok(())
        }
    }
}

/// `RUST_LOG` wins when set; otherwise the level follows -v/-q.
fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = if std::env::var_os("RUST_LOG").is_some() && verbose == 0 && !quiet {
        env_logger::Builder::from_env(env_logger::Env::default())
    } else {
        let level = match (quiet, verbose) {
            (true, _) => log::LevelFilter::Error,
            (false, 0) => log::LevelFilter::Warn,
            (false, 1) => log::LevelFilter::Info,
            (false, 2) => log::LevelFilter::Debug,
            (false, _) => log::LevelFilter::Trace,
        };
        let mut b = env_logger::Builder::new();
        b.filter_level(level);
        b
    };
    builder.format_timestamp(None).target(env_logger::Target::Stderr);
    // A second init (tests calling run twice) is harmless.
    let _ = builder.try_init();
}

/// Applies command-line overrides and validates the result.
fn apply_overrides(mut settings: Settings, args: &SegmentationArgs) -> Result<Settings, PlatescanError> {
    if let Some(root) = &args.output_root {
        settings.output_root = root.clone();
    }
    if let Some(threshold) = args.iou_threshold {
        settings.iou_threshold = threshold;
    }
    if let Some(size) = args.min_size {
        settings.min_width = size;
        settings.min_height = size;
    }
    if let Some(order) = &args.order {
        settings.order = order.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn load_image(path: &Path) -> Result<RgbImage, PlatescanError> {
    let image = image::open(path).map_err(|source| PlatescanError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

fn nutrition_source(
    settings: &Settings,
    source: &str,
) -> Result<Box<dyn NutritionLookup>, PlatescanError> {
    match source {
        "usda" => Ok(Box::new(UsdaClient::new(settings.usda_client_config()?))),
        "gemini" => Ok(Box::new(GeminiClient::new(settings.gemini_config()?))),
        other => Err(PlatescanError::Unsupported {
            kind: "nutrition source",
            value: format!("'{}' (supported: usda, gemini)", other),
        }),
    }
}

/// Execute the analyze subcommand.
fn run_analyze(settings: Settings, args: AnalyzeArgs) -> Result<(), PlatescanError> {
    let settings = apply_overrides(settings, &args.input)?;

    // Resolve every collaborator before touching the output directory.
    let classifier = GeminiClient::new(settings.gemini_config()?);
    let lookup = nutrition_source(&settings, &args.nutrition)?;
    let detector = JsonDetections::open(&args.input.detections)?;
    let image = load_image(&args.input.image)?;

    let mut store = DirStore::open_namespace(&settings.output_root, args.input.request_id.as_deref())?;
    info!("request {} -> {}", store.request_id(), store.dir().display());

    let analyzer = Analyzer::new(&detector, &classifier, lookup.as_ref())
        .with_select_options(settings.select_options()?)
        .with_extractor(settings.extractor());
    let report = analyzer.analyze(&image, &mut store)?;
    info!("{}", report.stats);

    write_json(args.out.as_deref(), &report.items)
}

/// Execute the segment subcommand.
fn run_segment(settings: Settings, args: SegmentArgs) -> Result<(), PlatescanError> {
    let settings = apply_overrides(settings, &args.input)?;

    let detector = JsonDetections::open(&args.input.detections)?;
    let image = load_image(&args.input.image)?;
    let mut store = DirStore::open_namespace(&settings.output_root, args.input.request_id.as_deref())?;

    let segmentation = pipeline::segment(
        &detector,
        &settings.select_options()?,
        &settings.extractor(),
        &image,
        &mut store,
    )?;
    info!("{}", segmentation.stats);

    let paths: Vec<PathBuf> = segmentation
        .artifacts
        .into_iter()
        .filter_map(|artifact| artifact.handle.path)
        .collect();
    write_json(None, &paths)
}

#[derive(Serialize)]
struct PredictOutput {
    name: String,
    confidence: f64,
    category: FoodCategory,
    /// `None` when no lookup was made.
    nutrition: Option<NutritionField>,
}

/// Execute the predict subcommand.
fn run_predict(mut settings: Settings, args: PredictArgs) -> Result<(), PlatescanError> {
    if let Some(min) = args.min_confidence {
        settings.min_confidence = min;
    }
    settings.validate()?;

    let probabilities = classify::read_probabilities(&args.probabilities)?;
    let prediction = LabelTable::fruit_vegetable().interpret(&probabilities, settings.min_confidence)?;
    info!(
        "predicted {} ({:.2}% confidence, {})",
        prediction.name,
        prediction.confidence * 100.0,
        prediction.category
    );

    let nutrition = if args.no_nutrition || prediction.is_unknown() {
        None
    } else {
        let client = UsdaClient::new(settings.usda_client_config()?);
        let field = match client.lookup(&prediction.name) {
            Ok(found) => NutritionField::from(found),
            Err(err) => {
                warn!("nutrition lookup failed: {}", err);
                NutritionField::NotFound
            }
        };
        Some(if args.nonzero {
            field.without_zero_values()
        } else {
            field
        })
    };

    write_json(
        None,
        &PredictOutput {
            name: prediction.name,
            confidence: prediction.confidence,
            category: prediction.category,
            nutrition,
        },
    )
}

/// Execute the nutrition subcommand.
fn run_nutrition(settings: Settings, args: NutritionArgs) -> Result<(), PlatescanError> {
    settings.validate()?;
    let lookup = nutrition_source(&settings, &args.source)?;

    let mut field = NutritionField::from(lookup.lookup(&args.food)?);
    if args.nonzero {
        field = field.without_zero_values();
    }
    write_json(None, &field)
}

/// Pretty JSON to `out`, or to stdout.
fn write_json<T: Serialize + ?Sized>(out: Option<&Path>, value: &T) -> Result<(), PlatescanError> {
    let mut writer: Box<dyn Write> = match out {
        Some(path) => {
            let file = File::create(path).map_err(|source| PlatescanError::OutputCreate {
                path: path.to_path_buf(),
                source,
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|source| PlatescanError::ReportWrite { source })?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
